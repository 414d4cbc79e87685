use crate::{filter::AttributionFilter, record::LogRecord, remote::RemoteSink, sink::LogSink};

/// Owns every sink attached to one worker and applies the worker's
/// [`AttributionFilter`] before forwarding a record to any of them. Attached
/// to both the adapter's own logger and the engine's logger, so the filter
/// runs once per record regardless of which logger produced it.
pub struct LogRouter {
    worker_key: String,
    filter: AttributionFilter,
    sinks: Vec<Box<dyn LogSink>>,
    remotes: Vec<Box<dyn RemoteSink>>,
}

impl LogRouter {
    pub fn new(worker_key: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            worker_key: worker_key.into(),
            filter: AttributionFilter::new(symbol),
            sinks: Vec::new(),
            remotes: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn LogSink>) {
        self.sinks.push(sink);
    }

    pub fn add_remote(&mut self, remote: Box<dyn RemoteSink>) {
        self.remotes.push(remote);
    }

    /// Routes one record through the attribution filter to every attached
    /// sink. A sink is never allowed to abort this call: `LogSink::write`
    /// and `RemoteSink::publish` own their own failure handling internally.
    pub fn route(&self, record: LogRecord) {
        if !self.filter.allow(&record) {
            return;
        }
        for sink in &self.sinks {
            sink.write(&record);
        }
        for remote in &self.remotes {
            remote.publish(&self.worker_key, &record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{record::LogLevel, remote::InMemoryRemoteSink};
    use chrono::Local;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct CapturingSink(Arc<Mutex<Vec<LogRecord>>>);

    impl LogSink for CapturingSink {
        fn write(&self, record: &LogRecord) {
            self.0.lock().push(record.clone());
        }
    }

    fn record(logger_name: &str, message: &str) -> LogRecord {
        LogRecord {
            timestamp: Local::now(),
            level: LogLevel::Info,
            message: message.into(),
            logger_name: logger_name.into(),
            module: "m".into(),
            func_name: "f".into(),
            line_no: 1,
        }
    }

    #[test]
    fn rejected_records_never_reach_any_sink() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let mut router = LogRouter::new("u1_600000.SH_turtle", "600000.SH");
        router.add_sink(Box::new(CapturingSink(captured.clone())));

        router.route(record("engine.pool", "fill for 000001.SZ"));
        assert!(captured.lock().is_empty());
    }

    #[test]
    fn allowed_records_reach_every_sink_and_remote() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let remote = Arc::new(InMemoryRemoteSink::new());
        let mut router = LogRouter::new("u1_600000.SH_turtle", "600000.SH");
        router.add_sink(Box::new(CapturingSink(captured.clone())));
        router.add_remote(Box::new(TestRemote(remote.clone())));

        router.route(record("engine.600000.SH", "tick"));
        assert_eq!(captured.lock().len(), 1);
        assert_eq!(remote.published().len(), 1);
    }

    struct TestRemote(Arc<InMemoryRemoteSink>);

    impl crate::remote::RemoteSink for TestRemote {
        fn publish(&self, worker_key: &str, record: &LogRecord) {
            self.0.publish(worker_key, record);
        }
    }

    /// Two workers sharing one process and one `strategies.common` logger: a
    /// record naming `000001.SZ` in its message reaches only that worker's
    /// router, never the `600000.SH` worker's.
    #[test]
    fn cross_talk_between_two_workers_is_rejected() {
        let captured_sh = Arc::new(Mutex::new(Vec::new()));
        let mut router_sh = LogRouter::new("u1_600000.SH_turtle", "600000.SH");
        router_sh.add_sink(Box::new(CapturingSink(captured_sh.clone())));

        let captured_sz = Arc::new(Mutex::new(Vec::new()));
        let mut router_sz = LogRouter::new("u1_000001.SZ_hidden_dragon", "000001.SZ");
        router_sz.add_sink(Box::new(CapturingSink(captured_sz.clone())));

        let record = record("strategies.common", "order for 000001.SZ filled");
        router_sh.route(record.clone());
        router_sz.route(record);

        assert!(captured_sh.lock().is_empty());
        assert_eq!(captured_sz.lock().len(), 1);
    }
}
