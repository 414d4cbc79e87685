use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise default human-readable logging, grounded on
/// `barter/src/logging.rs`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}

/// Initialise JSON logging, selected via `LOG_FORMAT=json`.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}

/// Reads `LOG_FORMAT` once and initialises the matching subscriber.
/// `text` (the default) uses [`init_logging`]; any other value uses
/// [`init_json_logging`].
pub fn init_from_env() {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => init_json_logging(),
        _ => init_logging(),
    }
}
