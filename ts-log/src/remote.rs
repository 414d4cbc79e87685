use parking_lot::Mutex;

use crate::record::LogRecord;

/// Optional pluggable sink selected by the `log_backends` environment knob
/// (see SPEC_FULL.md §6). Supplemented from `original_source`'s
/// `log_handlers.py`, which lets operators fan log records out to whatever
/// external system they run (a pub/sub channel, a log shipper, ...) without
/// the core router knowing which one. Disabled by default.
pub trait RemoteSink: Send + Sync {
    fn publish(&self, worker_key: &str, record: &LogRecord);
}

/// In-memory [`RemoteSink`] double used in tests in place of a live Redis
/// instance. Grounded on `jackbot-data/src/redis_store.rs`'s `InMemoryStore`.
#[derive(Default)]
pub struct InMemoryRemoteSink {
    published: Mutex<Vec<(String, LogRecord)>>,
}

impl InMemoryRemoteSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, LogRecord)> {
        self.published.lock().clone()
    }
}

impl RemoteSink for InMemoryRemoteSink {
    fn publish(&self, worker_key: &str, record: &LogRecord) {
        self.published
            .lock()
            .push((worker_key.to_string(), record.clone()));
    }
}

#[cfg(feature = "redis-sink")]
mod redis_backed {
    use super::RemoteSink;
    use crate::record::LogRecord;

    /// Publishes each allowed record to a Redis pub/sub channel named after
    /// the worker's key, grounded on `jackbot-data/src/redis_store.rs`'s
    /// `RedisClientStore`.
    pub struct RedisRemoteSink {
        client: redis::Client,
        channel_prefix: String,
    }

    impl RedisRemoteSink {
        pub fn new(url: &str, channel_prefix: impl Into<String>) -> redis::RedisResult<Self> {
            Ok(Self {
                client: redis::Client::open(url)?,
                channel_prefix: channel_prefix.into(),
            })
        }

        fn channel(&self, worker_key: &str) -> String {
            format!("{}:{}", self.channel_prefix, worker_key)
        }
    }

    impl RemoteSink for RedisRemoteSink {
        fn publish(&self, worker_key: &str, record: &LogRecord) {
            let Ok(json) = record.to_json() else { return };
            let channel = self.channel(worker_key);
            match self.client.get_connection() {
                Ok(mut conn) => {
                    let result: redis::RedisResult<()> =
                        redis::cmd("PUBLISH").arg(channel).arg(json).query(&mut conn);
                    if let Err(err) = result {
                        tracing::warn!(%err, %worker_key, "redis remote sink publish failed");
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, %worker_key, "redis remote sink connection failed");
                }
            }
        }
    }
}

#[cfg(feature = "redis-sink")]
pub use redis_backed::RedisRemoteSink;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogLevel;
    use chrono::Local;

    #[test]
    fn in_memory_sink_records_every_publish() {
        let sink = InMemoryRemoteSink::new();
        let record = LogRecord {
            timestamp: Local::now(),
            level: LogLevel::Info,
            message: "m".into(),
            logger_name: "l".into(),
            module: "m".into(),
            func_name: "f".into(),
            line_no: 1,
        };
        sink.publish("u1_600000.SH_turtle", &record);
        let published = sink.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "u1_600000.SH_turtle");
    }
}
