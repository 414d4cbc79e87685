//! Per-worker log attribution, rotating file storage and live WebSocket
//! streaming for the strategy supervisor.
//!
//! Grounded on `jackbot-data`'s role in the teacher workspace: a sibling
//! crate to the integration layer that owns I/O-heavy storage concerns
//! (there, order books and trades over Redis; here, per-worker log routing).

pub mod filter;
pub mod record;
pub mod remote;
pub mod router;
pub mod sink;
pub mod stream;

pub use filter::AttributionFilter;
pub use record::LogRecord;
pub use remote::RemoteSink;
pub use router::LogRouter;
pub use sink::{FileSink, LogSink, StreamSink};
pub use stream::{LogStreamEndpoint, LogStreamHandle};
