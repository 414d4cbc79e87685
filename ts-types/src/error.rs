use thiserror::Error;

/// Error taxonomy shared across the supervisor (see spec §7).
///
/// Most variants are logged and absorbed at the point of origin rather than
/// bubbled up through `?` to `main` — a failed worker start must never stop
/// other workers from starting, so the orchestrator calls `tracing::warn!`
/// and keeps going rather than returning `Err` from `reconcile`. This enum
/// exists so every component names its failures the same way in logs and
/// tests, grounded on `barter/src/error.rs`'s `BarterError`.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to load configuration: {0}")]
    ConfigLoadFailure(String),

    #[error("unknown engine '{0}'")]
    UnknownEngine(String),

    #[error("unknown strategy '{strategy_key}' for engine '{engine}'")]
    UnknownStrategy { engine: String, strategy_key: String },

    #[error("failed to start worker '{key}': {reason}")]
    WorkerStartFailure { key: String, reason: String },

    #[error("worker '{key}' failed while running: {reason}")]
    WorkerRunFailure { key: String, reason: String },

    #[error("worker '{key}' did not stop within the shutdown deadline")]
    WorkerStopTimeout { key: String },

    #[error("log sink failure for worker '{key}': {reason}")]
    LogSinkFailure { key: String, reason: String },

    #[error("log stream failed to start for worker '{key}': {reason}")]
    StreamStartupFailure { key: String, reason: String },

    #[error("missing or expired credentials")]
    Unauthenticated,

    #[error("caller does not own worker '{0}'")]
    Forbidden(String),

    #[error("worker '{0}' not found")]
    NotFound(String),
}
