use std::future::Future;

/// Grounded on `barter/src/shutdown.rs`'s `AsyncShutdown` trait: components
/// with bounded, cancellation-driven teardown implement this rather than a
/// bare `async fn stop`, so callers can treat every such component
/// uniformly when wiring signal handlers.
pub trait AsyncShutdown {
    type Result;
    fn shutdown(&mut self) -> impl Future<Output = Self::Result> + Send;
}

/// `ts_log::LogStreamEndpoint::stop` already matches this trait's shape
/// exactly (bounded-deadline-then-detach teardown behind `&mut self`), so it
/// is wired in directly rather than duplicated.
impl AsyncShutdown for ts_log::LogStreamEndpoint {
    type Result = ();

    async fn shutdown(&mut self) -> Self::Result {
        self.stop().await
    }
}
