use serde::{Deserialize, Serialize};

/// Key half of a `WorkerStats.extras` entry. Engine adapters report whatever
/// auxiliary numbers their strategy exposes (PnL, position count, ...) under
/// engine-chosen names, so unlike the teacher's `Tag::key` (`&'static str`,
/// fixed at the call site) this one is owned.
///
/// Grounded on `jackbot-integration::metric::Tag`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct StatTag(pub String);

impl<S> From<S> for StatTag
where
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

/// Value half of a `WorkerStats.extras` entry.
///
/// Grounded on `jackbot-integration::metric::Value`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Deserialize, Serialize)]
pub enum StatValue {
    Float(f64),
    Int(i64),
    UInt(u64),
    Bool(bool),
    String(String),
}

impl From<f64> for StatValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for StatValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for StatValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<bool> for StatValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for StatValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_builds_from_string_like_values() {
        let tag: StatTag = "pnl".into();
        assert_eq!(tag.0, "pnl");
    }

    #[test]
    fn value_conversions_round_trip_through_json() {
        let value: StatValue = 12.5f64.into();
        let json = serde_json::to_string(&value).unwrap();
        let back: StatValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }
}
