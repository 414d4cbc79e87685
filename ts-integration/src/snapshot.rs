use derive_more::{Constructor, From};

/// Thin wrapper marking a value as a point-in-time snapshot rather than a
/// live handle — used for `OrchestratorStatus` and `WorkerStats` reads so
/// call sites can see at a glance that mutating the result has no effect on
/// the source. Grounded on `jackbot-integration::snapshot::Snapshot`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Constructor, From)]
pub struct Snapshot<T>(pub T);

impl<T> Snapshot<T> {
    pub fn value(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn map<F, N>(self, op: F) -> Snapshot<N>
    where
        F: FnOnce(T) -> N,
    {
        Snapshot(op(self.0))
    }
}
