use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use ts_log::{FileSink, LogRouter, LogStreamEndpoint, StreamSink};
use ts_types::{EngineKind, WorkerKey};

use crate::{
    contract::WorkerContract,
    engine::{EngineTick, StrategyEngine},
    state::{StateCell, WorkerState},
    stats::WorkerStats,
};

const STOP_JOIN_DEADLINE: std::time::Duration = std::time::Duration::from_secs(5);

/// Concrete worker wrapping a [`StrategyEngine`]. Construction resolves the
/// engine class via the registry (the caller's responsibility — the adapter
/// just takes a boxed engine), opens an ephemeral-port [`LogStreamEndpoint`],
/// and drives the engine's poll loop behind a [`CancellationToken`].
///
/// Grounded on the teacher's `AsyncShutdown` pattern: `stop()` cancels the
/// token, awaits the task under a bounded timeout, and escalates to
/// `abort()` rather than blocking forever on a wedged poll loop.
pub struct EngineAdapter {
    key: WorkerKey,
    symbol: String,
    strategy_key: String,
    user_id: Option<String>,
    engine_kind: EngineKind,
    state: StateCell,
    stream: Option<LogStreamEndpoint>,
    stream_url: Option<String>,
    router: Arc<LogRouter>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Box<dyn StrategyEngine>>>,
    shared_stats: Arc<Mutex<WorkerStats>>,
    engine_slot: Arc<Mutex<Option<Box<dyn StrategyEngine>>>>,
}

impl EngineAdapter {
    /// `log_root` is where this worker's rotating file sink lives
    /// (`<log_root>/workers/<key>.log`, spec §4.5 step 3). The log stream
    /// endpoint and the router's sinks are built here so the engine's
    /// emitted records have somewhere to go before `start()` is ever called.
    pub async fn new(
        symbol: impl Into<String>,
        strategy_key: impl Into<String>,
        user_id: Option<String>,
        engine_kind: EngineKind,
        engine: Box<dyn StrategyEngine>,
        log_root: impl AsRef<Path>,
    ) -> Self {
        let symbol = symbol.into();
        let strategy_key = strategy_key.into();
        let key = WorkerKey::new(user_id.as_deref(), &symbol, &strategy_key);

        let (stream, stream_url) = match LogStreamEndpoint::start("127.0.0.1", 0).await {
            Ok(endpoint) => {
                let url = endpoint.url();
                (Some(endpoint), Some(url))
            }
            Err(err) => {
                tracing::warn!(%key, %err, "log stream failed to start for worker, continuing without one");
                (None, None)
            }
        };

        // Build the per-worker LogRouter: file sink plus, when the stream
        // started, a stream sink over it. Attached to the engine's emitted
        // records on every poll iteration (spec §4.5 step 4) so the
        // attribution filter runs once regardless of which logger produced
        // the record.
        let mut router = LogRouter::new(key.as_str(), symbol.clone());
        let file_path = FileSink::path_for_worker(log_root.as_ref(), key.as_str());
        match FileSink::open(&file_path) {
            Ok(file_sink) => router.add_sink(Box::new(file_sink)),
            Err(err) => {
                tracing::warn!(%key, path = %file_path.display(), %err, "log file sink failed to open for worker");
            }
        }
        if let Some(endpoint) = &stream {
            router.add_sink(Box::new(StreamSink::new(endpoint.handle())));
        }

        let stats = WorkerStats::new(
            WorkerState::Created,
            symbol.clone(),
            strategy_key.clone(),
            engine_kind,
        );

        Self {
            key,
            symbol,
            strategy_key,
            user_id,
            engine_kind,
            state: StateCell::new(),
            stream,
            stream_url,
            router: Arc::new(router),
            cancel: CancellationToken::new(),
            task: None,
            shared_stats: Arc::new(Mutex::new(stats)),
            engine_slot: Arc::new(Mutex::new(Some(engine))),
        }
    }
}

#[async_trait]
impl WorkerContract for EngineAdapter {
    async fn start(&mut self) {
        if self.task.is_some() {
            return;
        }

        self.state.transition_to(WorkerState::Running);
        self.shared_stats.lock().state = WorkerState::Running;

        let Some(mut engine) = self.engine_slot.lock().take() else {
            tracing::warn!(key = %self.key, "start() called with no engine installed");
            return;
        };

        let cancel = self.cancel.clone();
        let stats = self.shared_stats.clone();
        let router = self.router.clone();

        self.task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    tick = engine.poll() => {
                        if let EngineTick::Progressed = tick {
                            let mut snapshot = stats.lock();
                            snapshot.bars_processed += 1;
                            engine.report_stats(&mut snapshot);
                        }
                        for record in engine.drain_log_records() {
                            router.route(record);
                        }
                    }
                }
            }
            engine
        }));
    }

    async fn stop(&mut self, save_state: bool) {
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            match tokio::time::timeout(STOP_JOIN_DEADLINE, task).await {
                Ok(Ok(mut engine)) => {
                    if save_state {
                        engine.save_state().await;
                    }
                    *self.engine_slot.lock() = Some(engine);
                }
                Ok(Err(join_err)) => {
                    tracing::warn!(key = %self.key, %join_err, "worker poll loop panicked");
                    self.state.transition_to(WorkerState::Error);
                }
                Err(_) => {
                    tracing::warn!(key = %self.key, "worker did not stop within the shutdown deadline, aborting");
                }
            }
        }

        if let Some(mut stream) = self.stream.take() {
            stream.stop().await;
        }
        self.stream_url = None;

        if !matches!(self.state.get(), WorkerState::Error) {
            self.state.transition_to(WorkerState::Stopped);
        }
        self.shared_stats.lock().state = self.state.get();
    }

    fn is_running(&self) -> bool {
        matches!(self.state.get(), WorkerState::Running) && self.task.is_some()
    }

    fn get_stats(&self) -> WorkerStats {
        self.shared_stats.lock().clone()
    }

    async fn save_state(&mut self) -> bool {
        let taken = self.engine_slot.lock().take();
        match taken {
            Some(mut engine) => {
                let result = engine.save_state().await;
                *self.engine_slot.lock() = Some(engine);
                result
            }
            None => false,
        }
    }

    async fn load_state(&mut self) -> bool {
        let taken = self.engine_slot.lock().take();
        match taken {
            Some(mut engine) => {
                let result = engine.load_state().await;
                *self.engine_slot.lock() = Some(engine);
                result
            }
            None => false,
        }
    }

    fn get_log_stream_url(&self) -> Option<String> {
        self.stream_url.clone()
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn strategy_key(&self) -> &str {
        &self.strategy_key
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn key(&self) -> WorkerKey {
        self.key.clone()
    }
}

impl EngineAdapter {
    pub fn engine_kind(&self) -> EngineKind {
        self.engine_kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        path::PathBuf,
        sync::atomic::{AtomicBool, AtomicU32, Ordering},
    };
    use ts_log::record::{LogLevel, LogRecord};

    struct NoopEngine {
        polled: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StrategyEngine for NoopEngine {
        async fn poll(&mut self) -> EngineTick {
            self.polled.store(true, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            EngineTick::Idle
        }

        fn report_stats(&self, _stats: &mut WorkerStats) {}

        async fn save_state(&mut self) -> bool {
            true
        }

        async fn load_state(&mut self) -> bool {
            true
        }
    }

    /// Emits one log record on its first poll, then behaves like
    /// `NoopEngine`, so `EngineAdapter::start`'s drain-and-route wiring can
    /// be exercised end to end.
    struct LoggingEngine {
        emitted: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StrategyEngine for LoggingEngine {
        async fn poll(&mut self) -> EngineTick {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            EngineTick::Progressed
        }

        fn report_stats(&self, _stats: &mut WorkerStats) {}

        async fn save_state(&mut self) -> bool {
            true
        }

        async fn load_state(&mut self) -> bool {
            true
        }

        fn drain_log_records(&mut self) -> Vec<LogRecord> {
            if self.emitted.swap(true, Ordering::SeqCst) {
                return Vec::new();
            }
            vec![LogRecord {
                timestamp: chrono::Local::now(),
                level: LogLevel::Info,
                message: "engine tick for 600000.SH".into(),
                logger_name: "engine.600000.SH".into(),
                module: "m".into(),
                func_name: "f".into(),
                line_no: 1,
            }]
        }
    }

    fn tempdir() -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut dir = std::env::temp_dir();
        dir.push(format!("ts-worker-adapter-test-{}-{n}", std::process::id()));
        dir
    }

    #[tokio::test]
    async fn start_transitions_to_running_and_polls() {
        let polled = Arc::new(AtomicBool::new(false));
        let log_root = tempdir();
        let mut adapter = EngineAdapter::new(
            "600000.SH",
            "turtle",
            Some("u1".into()),
            EngineKind::Vnpy,
            Box::new(NoopEngine {
                polled: polled.clone(),
            }),
            &log_root,
        )
        .await;

        adapter.start().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(adapter.is_running());
        assert!(polled.load(Ordering::SeqCst));
        adapter.stop(false).await;
        assert!(!adapter.is_running());
        std::fs::remove_dir_all(log_root).ok();
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let log_root = tempdir();
        let mut adapter = EngineAdapter::new(
            "600000.SH",
            "turtle",
            None,
            EngineKind::Vnpy,
            Box::new(NoopEngine {
                polled: Arc::new(AtomicBool::new(false)),
            }),
            &log_root,
        )
        .await;
        adapter.start().await;
        adapter.stop(false).await;
        adapter.stop(false).await;
        std::fs::remove_dir_all(log_root).ok();
    }

    #[tokio::test]
    async fn log_stream_url_is_available_after_construction() {
        let log_root = tempdir();
        let adapter = EngineAdapter::new(
            "600000.SH",
            "turtle",
            None,
            EngineKind::Vnpy,
            Box::new(NoopEngine {
                polled: Arc::new(AtomicBool::new(false)),
            }),
            &log_root,
        )
        .await;
        assert!(adapter.get_log_stream_url().is_some());
        std::fs::remove_dir_all(log_root).ok();
    }

    /// Comment 1's fix: the engine's emitted records must actually reach a
    /// sink, not just sit behind an unused `LogRouter`/`LogStreamEndpoint`
    /// pair. Checks the file sink, since it's observable without a
    /// WebSocket client.
    #[tokio::test]
    async fn engine_log_records_reach_the_per_worker_file_sink() {
        let log_root = tempdir();
        let emitted = Arc::new(AtomicBool::new(false));
        let key = WorkerKey::new(None, "600000.SH", "turtle");
        let mut adapter = EngineAdapter::new(
            "600000.SH",
            "turtle",
            None,
            EngineKind::Vnpy,
            Box::new(LoggingEngine {
                emitted: emitted.clone(),
            }),
            &log_root,
        )
        .await;

        adapter.start().await;
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        adapter.stop(false).await;

        let log_path = FileSink::path_for_worker(&log_root, key.as_str());
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("engine tick for 600000.SH"));
        std::fs::remove_dir_all(log_root).ok();
    }
}
