use async_trait::async_trait;
use ts_types::WorkerKey;

use crate::stats::WorkerStats;

/// Abstract worker the orchestrator drives without knowing strategy
/// internals. Every concrete worker (today, only [`crate::EngineAdapter`])
/// satisfies this contract.
#[async_trait]
pub trait WorkerContract: Send + Sync {
    /// Transition `Created -> Running` and begin background activity.
    /// Must be safe to call exactly once.
    async fn start(&mut self);

    /// Signal the background activity to cease, wait up to a bounded
    /// deadline, best-effort persist if `save_state`, release the log
    /// stream endpoint, and reach a terminal state. Idempotent.
    async fn stop(&mut self, save_state: bool);

    /// `true` iff the current state is `Running` and the background
    /// activity is still alive.
    fn is_running(&self) -> bool;

    /// Non-blocking, never-failing metrics snapshot.
    fn get_stats(&self) -> WorkerStats;

    /// Persist strategy state; returns success, never panics out.
    async fn save_state(&mut self) -> bool;

    /// Restore strategy state; returns success, never panics out.
    async fn load_state(&mut self) -> bool;

    /// `None` if the stream endpoint failed to start or was never
    /// requested.
    fn get_log_stream_url(&self) -> Option<String>;

    fn symbol(&self) -> &str;
    fn strategy_key(&self) -> &str;
    fn user_id(&self) -> Option<&str>;
    fn key(&self) -> WorkerKey;
}
