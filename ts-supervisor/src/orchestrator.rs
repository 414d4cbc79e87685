use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::RwLock;
use tokio::{sync::Mutex as AsyncMutex, task::JoinHandle};
use ts_types::{EngineKind, StrategyConfig, WorkerKey};
use ts_worker::WorkerContract;

use crate::{
    config_source::{ConfigFilter, ConfigSource},
    factory::Factory,
    registry::EngineClassRegistry,
};

struct Inner {
    workers: HashMap<WorkerKey, Box<dyn WorkerContract>>,
    configurations: HashMap<WorkerKey, StrategyConfig>,
}

/// Per-worker slice of [`OrchestratorStatus`].
#[derive(Debug, Clone)]
pub struct WorkerStatus {
    pub key: WorkerKey,
    pub alive: bool,
    pub log_stream_url: Option<String>,
}

/// Owned snapshot returned by [`Orchestrator::get_status`] — readers never
/// hold the orchestrator's lock past the call, per spec §5's "readers
/// observe consistent snapshots via a read lock or copy."
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub total_workers: usize,
    pub active_configs: usize,
    pub workers: Vec<WorkerStatus>,
}

/// Reconciliation engine: computes a deterministic diff between the desired
/// set of `StrategyConfig`s and the currently running set of workers, and
/// converges the two under change, failure, and hot-reload.
///
/// `parking_lot::RwLock` guards `workers`/`configurations` (teacher's
/// default concurrency primitive); `reconcile` is the sole writer, gated by
/// an async mutex so overlapping hot-reload ticks never run concurrently.
pub struct Orchestrator<CS: ConfigSource> {
    config_source: CS,
    inner: RwLock<Inner>,
    factories: HashMap<EngineKind, Factory>,
    registry: EngineClassRegistry,
    reload_interval: Duration,
    reconcile_lock: AsyncMutex<()>,
    hot_reload_task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl<CS: ConfigSource + 'static> Orchestrator<CS> {
    pub fn new(
        config_source: CS,
        factories: HashMap<EngineKind, Factory>,
        registry: EngineClassRegistry,
        reload_interval: Duration,
    ) -> Self {
        Self {
            config_source,
            inner: RwLock::new(Inner {
                workers: HashMap::new(),
                configurations: HashMap::new(),
            }),
            factories,
            registry,
            reload_interval,
            reconcile_lock: AsyncMutex::new(()),
            hot_reload_task: AsyncMutex::new(None),
        }
    }

    /// Loads the desired set, reconciles once, then starts the hot-reload
    /// loop if `reload_interval > 0`.
    pub async fn start_all(self: &Arc<Self>) {
        let desired = self.config_source.load(ConfigFilter::all()).await;
        self.reconcile(desired).await;

        if self.reload_interval.is_zero() {
            return;
        }

        let this = self.clone();
        let mut guard = self.hot_reload_task.lock().await;
        if guard.is_some() {
            return;
        }
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.reload_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let desired = this.config_source.load(ConfigFilter::all()).await;
                this.reconcile(desired).await;
            }
        }));
    }

    /// Cancels hot-reload and stops every worker in the current set.
    pub async fn stop_all(&self) {
        if let Some(task) = self.hot_reload_task.lock().await.take() {
            task.abort();
        }

        let keys: Vec<WorkerKey> = {
            let inner = self.inner.read();
            inner.workers.keys().cloned().collect()
        };

        for key in keys {
            let worker = {
                let mut inner = self.inner.write();
                inner.workers.remove(&key)
            };
            if let Some(mut worker) = worker {
                worker.stop(true).await;
            }
        }
    }

    /// Reconciliation algorithm, run in the order stop-removed ->
    /// stop-modified -> start-new, iterating sorted keys so the outcome is
    /// stable across calls with the same input. A single in-flight guard
    /// (`reconcile_lock`) ensures overlapping hot-reload ticks never run
    /// concurrently.
    pub async fn reconcile(&self, desired: HashMap<WorkerKey, StrategyConfig>) {
        let _guard = self.reconcile_lock.lock().await;

        let to_stop: Vec<WorkerKey> = {
            let inner = self.inner.read();
            let mut keys: Vec<WorkerKey> = inner
                .workers
                .keys()
                .filter(|k| !desired.contains_key(*k))
                .cloned()
                .collect();
            keys.sort();
            keys
        };

        for key in &to_stop {
            self.stop_and_remove(key, true).await;
        }

        let to_restart: Vec<WorkerKey> = {
            let inner = self.inner.read();
            let mut keys: Vec<WorkerKey> = inner
                .workers
                .keys()
                .filter(|k| {
                    desired.get(*k).is_some_and(|desired_cfg| {
                        inner
                            .configurations
                            .get(*k)
                            .map_or(true, |current| current.content_hash() != desired_cfg.content_hash())
                    })
                })
                .cloned()
                .collect();
            keys.sort();
            keys
        };

        for key in &to_restart {
            self.stop_and_remove(key, true).await;
        }

        {
            let mut inner = self.inner.write();
            inner.configurations = desired.clone();
        }

        let to_start: Vec<WorkerKey> = {
            let inner = self.inner.read();
            let mut keys: Vec<WorkerKey> = desired
                .keys()
                .filter(|k| !inner.workers.contains_key(*k))
                .cloned()
                .collect();
            keys.sort();
            keys
        };

        for key in &to_start {
            let Some(config) = desired.get(key) else {
                continue;
            };
            self.start_one(key, config.clone()).await;
        }
    }

    async fn stop_and_remove(&self, key: &WorkerKey, save_state: bool) {
        let worker = {
            let mut inner = self.inner.write();
            inner.workers.remove(key)
        };
        if let Some(mut worker) = worker {
            worker.stop(save_state).await;
        }
    }

    async fn start_one(&self, key: &WorkerKey, mut config: StrategyConfig) {
        let Some(factory) = self.factories.get(&config.engine) else {
            tracing::warn!(%key, engine = %config.engine, "unknown engine, skipping");
            return;
        };

        if config.engine_class.is_none()
            && self.registry.resolve(config.engine, &config.strategy_key).is_none()
        {
            tracing::warn!(%key, strategy_key = %config.strategy_key, "unknown strategy for engine, skipping");
            return;
        }

        // Reconciliation step 5: merge account params into the worker
        // config before construction (spec §4.7).
        if let Some(user_id) = config.user_id.clone() {
            if let Some(account) = self.config_source.resolve_account(&user_id).await {
                config.params.insert("broker".into(), serde_json::Value::String(account.broker));
                config.params.insert("account_id".into(), serde_json::Value::String(account.account_id));
            }
        }

        let mut worker = match factory(config).await {
            Ok(worker) => worker,
            Err(err) => {
                tracing::warn!(%key, %err, "worker failed to start, skipping");
                return;
            }
        };

        worker.load_state().await;
        worker.start().await;

        let mut inner = self.inner.write();
        inner.workers.insert(key.clone(), worker);
    }

    /// For every worker in the current map reporting `is_running() = false`,
    /// reconstruct it from its last-known configuration via `start_one`.
    /// Used by the lifecycle controller's pre-open event (spec §4.8 step 2)
    /// to bring self-terminated workers back before the trading day opens —
    /// the orchestrator's own hot-reload never does this on its own.
    pub async fn restart_dormant(&self) {
        let dormant: Vec<WorkerKey> = {
            let inner = self.inner.read();
            inner
                .workers
                .iter()
                .filter(|(_, worker)| !worker.is_running())
                .map(|(key, _)| key.clone())
                .collect()
        };

        for key in dormant {
            let config = {
                let inner = self.inner.read();
                inner.configurations.get(&key).cloned()
            };
            let Some(config) = config else { continue };
            self.stop_and_remove(&key, true).await;
            self.start_one(&key, config).await;
        }
    }

    /// Stops every currently-running worker in the map, leaving stopped or
    /// never-started entries untouched. Used by the lifecycle controller's
    /// post-close (`save_state=true`) and cleanup (`save_state=false`)
    /// events (spec §4.8 steps 3-4).
    pub async fn stop_running(&self, save_state: bool) {
        let keys: Vec<WorkerKey> = {
            let inner = self.inner.read();
            inner
                .workers
                .iter()
                .filter(|(_, worker)| worker.is_running())
                .map(|(key, _)| key.clone())
                .collect()
        };

        for key in &keys {
            self.stop_and_remove(key, save_state).await;
        }
    }

    pub fn get_status(&self) -> OrchestratorStatus {
        let inner = self.inner.read();
        let mut workers: Vec<WorkerStatus> = inner
            .workers
            .iter()
            .map(|(key, worker)| WorkerStatus {
                key: key.clone(),
                alive: worker.is_running(),
                log_stream_url: worker.get_log_stream_url(),
            })
            .collect();
        workers.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));

        OrchestratorStatus {
            total_workers: inner.workers.len(),
            active_configs: inner.configurations.len(),
            workers,
        }
    }
}
