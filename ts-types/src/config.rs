use crate::key::WorkerKey;
use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

/// Strategy execution engine family. The registry (see `ts-supervisor::registry`)
/// maps `(EngineKind, strategy_key)` to a concrete engine class.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Vnpy,
    Backtrader,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vnpy => write!(f, "vnpy"),
            Self::Backtrader => write!(f, "backtrader"),
        }
    }
}

/// Immutable desired specification of one worker, as read from the
/// configuration store.
///
/// `(user_id, symbol, strategy_key)` uniquely identifies a configuration —
/// see [`StrategyConfig::key`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrategyConfig {
    pub symbol: String,
    pub strategy_key: String,
    pub engine: EngineKind,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    pub enabled: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub engine_class: Option<String>,
}

impl StrategyConfig {
    pub fn key(&self) -> WorkerKey {
        WorkerKey::new(self.user_id.as_deref(), &self.symbol, &self.strategy_key)
    }

    /// Content hash over every field in a canonical ordering. Any field
    /// change (including within `params`) changes the hash.
    ///
    /// Uses `FnvHasher` over a `serde_json` serialization rather than
    /// `DefaultHasher`: `DefaultHasher`'s algorithm is explicitly
    /// unspecified and may vary across compiler/std versions, which would
    /// make the "same config -> same hash" invariant unreliable across
    /// builds. `serde_json::Map` is backed by a `BTreeMap` (no
    /// `preserve_order` feature enabled anywhere in this workspace), so the
    /// serialized form is already key-sorted and thus canonical.
    pub fn content_hash(&self) -> u64 {
        let canonical =
            serde_json::to_vec(self).expect("StrategyConfig always serializes");
        let mut hasher = FnvHasher::default();
        hasher.write(&canonical);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> StrategyConfig {
        StrategyConfig {
            symbol: "000001.SZ".into(),
            strategy_key: "hidden_dragon".into(),
            engine: EngineKind::Vnpy,
            params: json!({"threshold": 5}).as_object().unwrap().clone(),
            enabled: true,
            user_id: Some("u1".into()),
            engine_class: None,
        }
    }

    #[test]
    fn identical_configs_hash_equal() {
        assert_eq!(base().content_hash(), base().content_hash());
    }

    #[test]
    fn changed_param_changes_hash() {
        let mut changed = base();
        changed.params = json!({"threshold": 7}).as_object().unwrap().clone();
        assert_ne!(base().content_hash(), changed.content_hash());
    }

    #[test]
    fn changed_enabled_changes_hash() {
        let mut changed = base();
        changed.enabled = false;
        assert_ne!(base().content_hash(), changed.content_hash());
    }

    #[test]
    fn changed_engine_changes_hash() {
        let mut changed = base();
        changed.engine = EngineKind::Backtrader;
        assert_ne!(base().content_hash(), changed.content_hash());
    }

    #[test]
    fn key_matches_worker_key_format() {
        assert_eq!(base().key().as_str(), "u1_000001.SZ_hidden_dragon");
    }
}
