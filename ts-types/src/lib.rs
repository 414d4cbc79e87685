//! Shared identity, configuration and calendar types for the strategy supervisor.
//!
//! Every other crate in the workspace depends on this one; it has no
//! dependency on `tokio` or any I/O concern so it stays trivially testable.

/// [`WorkerKey`] — the `(user_id, symbol, strategy_key)` primary identity.
pub mod key;

/// [`StrategyConfig`], its content hash, and the engine registry key type.
pub mod config;

/// Pure trading-calendar predicates (`is_trading_day`, `is_trading_hours`).
pub mod calendar;

/// Cross-crate error taxonomy (see spec §7).
pub mod error;

/// `EventKind` used by the lifecycle controller for its at-most-once markers.
pub mod lifecycle;

pub use calendar::{FixedCalendar, HostCalendar, NoHolidays, TradingCalendar};
pub use config::{EngineKind, StrategyConfig};
pub use error::SupervisorError;
pub use key::WorkerKey;
pub use lifecycle::EventKind;
