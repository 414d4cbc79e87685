use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;
use ts_types::{EventKind, TradingCalendar};

use crate::{config_source::ConfigSource, orchestrator::Orchestrator};

/// Time-driven edge-event state machine ticking over the *same* worker map
/// [`Orchestrator`] reconciles, per spec §2's "LifecycleController ticks over
/// the Orchestrator's worker map": recreates self-terminated workers before
/// the open, stops everything after close, and force-cleans any stragglers,
/// each at most once per day even across a mid-event wakeup.
///
/// Earlier revisions of this controller kept a private
/// `WorkerKey -> (worker, factory, original_config)` registry populated by a
/// `register` call nothing ever made, so PreOpen/PostClose/Cleanup ticked
/// over an eternally-empty map. Delegating to the `Orchestrator` directly —
/// which already owns the real worker map, their factories, and their
/// original configs — removes that dead registry instead of wiring a second
/// copy of the same state.
///
/// Markers (`last_fired`) are in-memory only: a process restart mid-day can
/// cause an event to re-fire. This is the spec's "operator-configurable"
/// Open Question resolved toward simplicity rather than building an unused
/// persisted-marker mode.
pub struct LifecycleController<C: TradingCalendar, CS: ConfigSource + 'static> {
    calendar: C,
    orchestrator: Arc<Orchestrator<CS>>,
    auto_start: bool,
    auto_stop: bool,
    last_fired: Mutex<HashMap<EventKind, NaiveDate>>,
}

const PRE_OPEN_WINDOW: (NaiveTime, NaiveTime) = (
    NaiveTime::from_hms_opt(9, 25, 0).expect("valid time"),
    NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
);
const POST_CLOSE_WINDOW: (NaiveTime, NaiveTime) = (
    NaiveTime::from_hms_opt(15, 5, 0).expect("valid time"),
    NaiveTime::from_hms_opt(15, 10, 0).expect("valid time"),
);
const CLEANUP_WINDOW: (NaiveTime, NaiveTime) = (
    NaiveTime::from_hms_opt(15, 10, 0).expect("valid time"),
    NaiveTime::from_hms_opt(15, 15, 0).expect("valid time"),
);

fn in_window(t: NaiveTime, window: (NaiveTime, NaiveTime)) -> bool {
    t >= window.0 && t < window.1
}

impl<C: TradingCalendar, CS: ConfigSource + 'static> LifecycleController<C, CS> {
    pub fn new(calendar: C, orchestrator: Arc<Orchestrator<CS>>, auto_start: bool, auto_stop: bool) -> Self {
        Self {
            calendar,
            orchestrator,
            auto_start,
            auto_stop,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    /// Runs this controller in its own background context (spec §5),
    /// ticking at `interval` (default cadence 30s per spec §4.8) until the
    /// returned handle is aborted. Mirrors `Orchestrator::start_all`'s
    /// hot-reload loop shape one layer up.
    pub fn spawn_ticking(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()>
    where
        C: Send + Sync + 'static,
        CS: Send + Sync,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.tick(chrono::Local::now()).await;
            }
        })
    }

    /// One tick of the controller, evaluated at local wall-clock `t`.
    pub async fn tick(&self, t: chrono::DateTime<chrono::Local>) {
        if !self.calendar.is_trading_day(t) {
            return;
        }

        let today = t.date_naive();
        let time = t.time();

        if self.auto_start && in_window(time, PRE_OPEN_WINDOW) && !self.already_fired(EventKind::PreOpen, today) {
            self.orchestrator.restart_dormant().await;
            self.mark_fired(EventKind::PreOpen, today);
        }

        if self.auto_stop && in_window(time, POST_CLOSE_WINDOW) && !self.already_fired(EventKind::PostClose, today) {
            self.orchestrator.stop_running(true).await;
            self.mark_fired(EventKind::PostClose, today);
        }

        if in_window(time, CLEANUP_WINDOW) && !self.already_fired(EventKind::Cleanup, today) {
            self.orchestrator.stop_running(false).await;
            self.mark_fired(EventKind::Cleanup, today);
        }
    }

    fn already_fired(&self, kind: EventKind, today: NaiveDate) -> bool {
        self.last_fired.lock().get(&kind) == Some(&today)
    }

    fn mark_fired(&self, kind: EventKind, today: NaiveDate) {
        self.last_fired.lock().insert(kind, today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config_source::InMemoryConfigSource, registry::EngineClassRegistry};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use ts_types::{EngineKind, FixedCalendar, StrategyConfig, WorkerKey};
    use ts_worker::{WorkerContract, WorkerState, WorkerStats};

    fn at(hour: u32, minute: u32) -> chrono::DateTime<chrono::Local> {
        chrono::Local.with_ymd_and_hms(2024, 1, 2, hour, minute, 0).unwrap()
    }

    struct FakeWorker {
        key: WorkerKey,
        symbol: String,
        strategy_key: String,
        user_id: Option<String>,
        running: Arc<AtomicBool>,
        stop_calls: Arc<Mutex<Vec<bool>>>,
    }

    #[async_trait::async_trait]
    impl WorkerContract for FakeWorker {
        async fn start(&mut self) {
            self.running.store(true, Ordering::SeqCst);
        }

        async fn stop(&mut self, save_state: bool) {
            self.stop_calls.lock().push(save_state);
            self.running.store(false, Ordering::SeqCst);
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn get_stats(&self) -> WorkerStats {
            WorkerStats::new(
                if self.is_running() { WorkerState::Running } else { WorkerState::Stopped },
                self.symbol.clone(),
                self.strategy_key.clone(),
                EngineKind::Vnpy,
            )
        }

        async fn save_state(&mut self) -> bool {
            true
        }

        async fn load_state(&mut self) -> bool {
            true
        }

        fn get_log_stream_url(&self) -> Option<String> {
            None
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

    /// Every construction shares the same `running`/`stop_calls` handles so
    /// a test can flip `running` from outside to simulate self-termination
    /// and observe recreation through the shared counters.
    fn counting_factory(
        starts: Arc<AtomicUsize>,
        running: Arc<AtomicBool>,
        stop_calls: Arc<Mutex<Vec<bool>>>,
    ) -> crate::factory::Factory {
        Arc::new(move |config: StrategyConfig| {
            let starts = starts.clone();
            let running = running.clone();
            let stop_calls = stop_calls.clone();
            Box::pin(async move {
                starts.fetch_add(1, Ordering::SeqCst);
                let key = config.key();
                Ok(Box::new(FakeWorker {
                    key,
                    symbol: config.symbol,
                    strategy_key: config.strategy_key,
                    user_id: config.user_id,
                    running,
                    stop_calls,
                }) as Box<dyn WorkerContract>)
            })
        })
    }

    fn config(user_id: &str, symbol: &str, strategy_key: &str) -> StrategyConfig {
        StrategyConfig {
            symbol: symbol.into(),
            strategy_key: strategy_key.into(),
            engine: EngineKind::Vnpy,
            params: serde_json::Map::new(),
            enabled: true,
            user_id: Some(user_id.into()),
            engine_class: None,
        }
    }

    fn registry_with(strategy_key: &str) -> EngineClassRegistry {
        let mut registry = EngineClassRegistry::new();
        registry.register(EngineKind::Vnpy, strategy_key, "strategies.Fake");
        registry
    }

    fn empty_orchestrator() -> Arc<Orchestrator<InMemoryConfigSource>> {
        Arc::new(Orchestrator::new(
            InMemoryConfigSource::new(vec![]),
            HashMap::new(),
            EngineClassRegistry::new(),
            Duration::ZERO,
        ))
    }

    #[tokio::test]
    async fn non_trading_day_skips_every_window() {
        let controller = LifecycleController::new(FixedCalendar::holiday(), empty_orchestrator(), true, true);
        controller.tick(at(9, 26)).await;
        assert!(!controller.already_fired(EventKind::PreOpen, at(9, 26).date_naive()));
    }

    #[tokio::test]
    async fn pre_open_recreates_dormant_workers_at_most_once_per_day() {
        let starts = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicBool::new(false));
        let stop_calls = Arc::new(Mutex::new(Vec::new()));
        let mut factories = HashMap::new();
        factories.insert(EngineKind::Vnpy, counting_factory(starts.clone(), running.clone(), stop_calls.clone()));
        let registry = registry_with("turtle");

        let orchestrator = Arc::new(Orchestrator::new(
            InMemoryConfigSource::new(vec![config("u1", "600000.SH", "turtle")]),
            factories,
            registry,
            Duration::ZERO,
        ));
        orchestrator.start_all().await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(running.load(Ordering::SeqCst));

        // Simulate self-termination: the orchestrator never auto-restarts
        // this (spec §4.7's hot-reload note), so only the lifecycle
        // controller's pre-open event can bring it back.
        running.store(false, Ordering::SeqCst);

        let controller = LifecycleController::new(FixedCalendar::trading_day(), orchestrator.clone(), true, false);
        let today = at(9, 26).date_naive();
        controller.tick(at(9, 26)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert!(running.load(Ordering::SeqCst));
        assert!(controller.already_fired(EventKind::PreOpen, today));

        controller.tick(at(9, 27)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    /// S5: clock at 15:06 on a weekday, one running worker in the
    /// orchestrator's map. `tick` must stop it with `save_state=true`, mark
    /// `PostClose`, and a repeated tick at 15:07 on the same day must not
    /// stop it again.
    #[tokio::test]
    async fn s5_post_close_stops_every_running_worker_exactly_once() {
        let starts = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicBool::new(false));
        let stop_calls = Arc::new(Mutex::new(Vec::new()));
        let mut factories = HashMap::new();
        factories.insert(EngineKind::Vnpy, counting_factory(starts, running, stop_calls.clone()));
        let registry = registry_with("turtle");

        let orchestrator = Arc::new(Orchestrator::new(
            InMemoryConfigSource::new(vec![config("u1", "600000.SH", "turtle")]),
            factories,
            registry,
            Duration::ZERO,
        ));
        orchestrator.start_all().await;

        let controller = LifecycleController::new(FixedCalendar::trading_day(), orchestrator, true, true);
        controller.tick(at(15, 6)).await;
        assert_eq!(*stop_calls.lock(), vec![true]);
        assert!(controller.already_fired(EventKind::PostClose, at(15, 6).date_naive()));

        controller.tick(at(15, 7)).await;
        assert_eq!(*stop_calls.lock(), vec![true]);
    }

    #[tokio::test]
    async fn spawn_ticking_runs_in_its_own_background_context() {
        let controller = Arc::new(LifecycleController::new(FixedCalendar::holiday(), empty_orchestrator(), true, true));
        let handle = controller.clone().spawn_ticking(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn windows_are_disjoint_and_ordered() {
        assert!(in_window(NaiveTime::from_hms_opt(9, 25, 0).unwrap(), PRE_OPEN_WINDOW));
        assert!(!in_window(NaiveTime::from_hms_opt(9, 30, 0).unwrap(), PRE_OPEN_WINDOW));
        assert!(in_window(NaiveTime::from_hms_opt(15, 5, 0).unwrap(), POST_CLOSE_WINDOW));
        assert!(in_window(NaiveTime::from_hms_opt(15, 10, 0).unwrap(), CLEANUP_WINDOW));
    }
}
