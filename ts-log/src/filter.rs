use std::sync::OnceLock;

use regex::Regex;

use crate::record::LogRecord;

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{6}\.(SZ|SH|BJ)").expect("valid symbol regex"))
}

/// Decides, per worker symbol, whether a [`LogRecord`] emitted by any logger
/// in the process belongs on that worker's sinks. A single process hosts
/// many engines whose loggers are not scoped to one symbol, so every record
/// is filtered independently for every worker's [`crate::LogRouter`].
#[derive(Debug, Clone)]
pub struct AttributionFilter {
    symbol: String,
}

impl AttributionFilter {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    /// ALLOW/REJECT decision, applying the rule in three steps:
    /// 1. the logger name itself names the symbol → ALLOW.
    /// 2. else scan the message for `DDDDDD.(SZ|SH|BJ)` tokens: a match set
    ///    containing the symbol → ALLOW, a non-empty match set without it →
    ///    REJECT.
    /// 3. no symbol tokens anywhere → ALLOW (treated as a system log).
    pub fn allow(&self, record: &LogRecord) -> bool {
        if record.logger_name.contains(&self.symbol) {
            return true;
        }

        let tokens: Vec<&str> = symbol_pattern()
            .find_iter(&record.message)
            .map(|m| m.as_str())
            .collect();

        if tokens.is_empty() {
            return true;
        }

        tokens.iter().any(|tok| *tok == self.symbol)
    }
}
