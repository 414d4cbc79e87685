use std::{pin::Pin, sync::Arc};

use futures::Future;
use ts_types::{StrategyConfig, SupervisorError};
use ts_worker::WorkerContract;

/// Result of constructing a worker from its `StrategyConfig`, boxed because
/// `EngineAdapter::new` opens a log stream endpoint and is itself async.
pub type FactoryFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn WorkerContract>, SupervisorError>> + Send>>;

/// `(engine, strategy_key) -> EngineClass` resolution plus engine
/// construction, collapsed into one callable per `EngineKind` — the
/// orchestrator calls the factory for the config's engine after resolving
/// which one applies.
pub type Factory = Arc<dyn Fn(StrategyConfig) -> FactoryFuture + Send + Sync>;
