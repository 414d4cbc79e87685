//! Small channel and snapshot primitives reused by `ts-log`, `ts-worker` and
//! `ts-supervisor` wherever a bounded point-to-point or fan-out channel is
//! needed. Grounded on `jackbot-integration/src/channel.rs` and
//! `jackbot-integration/src/snapshot.rs`.

pub mod channel;
pub mod snapshot;
pub mod stat;

pub use channel::{mpsc_unbounded, Channel, UnboundedRx, UnboundedTx};
pub use snapshot::Snapshot;
pub use stat::{StatTag, StatValue};
