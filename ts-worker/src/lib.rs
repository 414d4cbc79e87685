//! The worker lifecycle abstraction: a uniform contract the orchestrator
//! drives without knowing strategy internals, plus the concrete adapter that
//! wraps a strategy engine and wires it into a worker's log router and
//! stream endpoint.
//!
//! Grounded on the teacher's `StrategyEngine`-around-an-`Engine` layering
//! (`jackbot/src/strategy/framework.rs`) and its `AsyncShutdown` pattern
//! for bounded, cancellation-token-driven teardown.

pub mod adapter;
pub mod contract;
pub mod engine;
pub mod state;
pub mod stats;

pub use adapter::EngineAdapter;
pub use contract::WorkerContract;
pub use engine::{EngineTick, StrategyEngine};
pub use state::WorkerState;
pub use stats::WorkerStats;
