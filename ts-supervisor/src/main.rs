use std::{collections::HashMap, sync::Arc};

use ts_supervisor::{
    config_source::ConfigSource, factory::Factory, logging, registry::EngineClassRegistry,
    settings::Settings, LifecycleController, Orchestrator,
};
use ts_types::{EngineKind, HostCalendar, NoHolidays};

#[tokio::main]
async fn main() {
    logging::init_from_env();

    let settings = Settings::from_env();
    tracing::info!(?settings.log_root, ?settings.public_host, "starting strategy supervisor");

    let config_source = build_config_source(&settings).await;
    let factories: HashMap<EngineKind, Factory> = HashMap::new();
    let registry = EngineClassRegistry::new();

    let orchestrator = Arc::new(Orchestrator::new(
        config_source,
        factories,
        registry,
        settings.reload_interval,
    ));
    orchestrator.start_all().await;

    // Ticks over this same `orchestrator`'s worker map (spec §2's data
    // flow), not a private copy — pre-open/post-close/cleanup act on the
    // workers the orchestrator actually started.
    let lifecycle = Arc::new(LifecycleController::new(
        HostCalendar::new(NoHolidays),
        orchestrator.clone(),
        settings.lifecycle_auto_start,
        settings.lifecycle_auto_stop,
    ));
    let lifecycle_task = lifecycle.spawn_ticking(settings.lifecycle_tick_interval);

    wait_for_shutdown_signal().await;

    tracing::info!("shutdown signal received, stopping all workers");
    lifecycle_task.abort();
    orchestrator.stop_all().await;
}

async fn build_config_source(settings: &Settings) -> impl ConfigSource {
    // In-memory by construction here: wiring a live MongoConfigSource
    // requires a connection string this binary doesn't yet read from
    // Settings. Left as a deliberate seam — the registered ConfigSource
    // implementation is swapped in by whichever deployment wires this
    // main().
    let _ = settings;
    ts_supervisor::config_source::InMemoryConfigSource::new(Vec::new())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
