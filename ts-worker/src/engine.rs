use async_trait::async_trait;
use ts_log::LogRecord;

use crate::stats::WorkerStats;

/// One iteration's outcome from a strategy engine's internal poll loop.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EngineTick {
    /// Work happened; keep polling.
    Progressed,
    /// Nothing to do this iteration; keep polling.
    Idle,
}

/// The strategy body a worker wraps. Strategy internals are explicitly out
/// of scope: this trait is the entire surface [`crate::EngineAdapter`] needs
/// to drive an engine without knowing what it trades or how.
#[async_trait]
pub trait StrategyEngine: Send {
    /// Advance the engine by one step. Called in a loop by the adapter's
    /// background task until cancelled.
    async fn poll(&mut self) -> EngineTick;

    /// Merge the engine's own metrics into a stats snapshot the adapter is
    /// about to return from `get_stats()`.
    fn report_stats(&self, stats: &mut WorkerStats);

    async fn save_state(&mut self) -> bool;
    async fn load_state(&mut self) -> bool;

    /// Drains whatever log lines the engine produced since the last poll.
    /// Most engines have nothing to say most ticks, so the default is empty
    /// rather than forcing every implementor to override it.
    fn drain_log_records(&mut self) -> Vec<LogRecord> {
        Vec::new()
    }
}
