use serde::{Deserialize, Serialize};

/// Worker lifecycle state. Only `Created -> Running -> Stopped|Error` and
/// `Running -> Paused -> Running` are exercised by the core; other edges are
/// rejected.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
pub enum WorkerState {
    Created,
    Running,
    Paused,
    Stopped,
    Error,
}

impl WorkerState {
    /// `true` if moving from `self` to `next` is one of the edges the core
    /// ever performs. Checked with `debug_assert!` at call sites rather than
    /// returned as a `Result` — an illegal transition is a programming
    /// error, not a runtime condition workers recover from.
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Created, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Stopped)
                | (Running, Error)
                | (Paused, Stopped)
                | (Paused, Error)
                | (Created, Error)
        )
    }
}

/// Transition-checked cell around a [`WorkerState`]. Panics in debug builds
/// on an illegal edge, matching the teacher's style of cheap
/// `debug_assert!`-guarded invariants rather than a checked `Result` return
/// for what is, by construction, an internal bug if it ever fires.
#[derive(Debug)]
pub struct StateCell(WorkerState);

impl StateCell {
    pub fn new() -> Self {
        Self(WorkerState::Created)
    }

    pub fn get(&self) -> WorkerState {
        self.0
    }

    pub fn transition_to(&mut self, next: WorkerState) {
        debug_assert!(
            self.0.can_transition_to(next),
            "illegal worker state transition {:?} -> {:?}",
            self.0,
            next
        );
        self.0 = next;
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
