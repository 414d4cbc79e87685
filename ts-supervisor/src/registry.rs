use std::collections::HashMap;

use ts_types::EngineKind;

/// Static `(engine, strategy_key) -> dotted.path.of.engine_class` lookup
/// table, consulted by the orchestrator when a `StrategyConfig` doesn't
/// carry an `engine_class` override.
///
/// Generalised from the teacher's `StrategyRegistry<S>`
/// (`jackbot/src/strategy/registry.rs`): same insert/get/remove shape, keyed
/// on `(EngineKind, strategy_key)` instead of a `StrategyId`, and values are
/// dotted class paths (strings) rather than live strategy instances — the
/// registry here only resolves *which* engine class to build, construction
/// itself is the caller's [`crate::Factory`].
#[derive(Debug, Default)]
pub struct EngineClassRegistry {
    classes: HashMap<(EngineKind, String), String>,
}

impl EngineClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, engine: EngineKind, strategy_key: impl Into<String>, class_path: impl Into<String>) {
        self.classes.insert((engine, strategy_key.into()), class_path.into());
    }

    pub fn resolve(&self, engine: EngineKind, strategy_key: &str) -> Option<&str> {
        self.classes
            .get(&(engine, strategy_key.to_string()))
            .map(String::as_str)
    }
}
