use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{self, Display, Formatter};

/// Primary identity of a [`StrategyConfig`](crate::config::StrategyConfig) and the
/// [`Worker`](../ts-worker) constructed from it.
///
/// Rendered as `"{user_id}_{symbol}_{strategy_key}"`, matching the original
/// Python supervisor's `f"{user_id}_{symbol}_{strategy_key}"` key format
/// exactly so operators cross-referencing old logs see the same identifiers.
/// `user_id` renders as the literal string `"None"` when absent, keeping the
/// format total rather than partial.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct WorkerKey(SmolStr);

impl WorkerKey {
    pub fn new(user_id: Option<&str>, symbol: &str, strategy_key: &str) -> Self {
        let user_id = user_id.unwrap_or("None");
        Self(SmolStr::new(format!("{user_id}_{symbol}_{strategy_key}")))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for WorkerKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkerKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
