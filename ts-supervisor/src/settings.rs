use std::time::Duration;

/// Environment-configurable knobs (§6), read once at process start.
/// Grounded on `original_source/src/strategy_manager/config_loader.py`'s
/// layered env-var-over-defaults loader, adapted to Rust's
/// no-silent-partial-failure idiom: an unparseable override is a hard
/// `panic!` at startup rather than a silent fallback to the default.
#[derive(Debug, Clone)]
pub struct Settings {
    pub reload_interval: Duration,
    pub lifecycle_tick_interval: Duration,
    pub lifecycle_auto_start: bool,
    pub lifecycle_auto_stop: bool,
    pub log_backends: Vec<String>,
    pub log_root: String,
    pub public_host: String,
    pub auth_enabled: bool,
    pub jwt_secret: String,
    pub calendar_locale: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            reload_interval: Duration::from_secs(env_parsed("RELOAD_INTERVAL_SECS", 30)),
            lifecycle_tick_interval: Duration::from_secs(env_parsed("LIFECYCLE_TICK_SECS", 30)),
            lifecycle_auto_start: env_parsed("LIFECYCLE_AUTO_START", true),
            lifecycle_auto_stop: env_parsed("LIFECYCLE_AUTO_STOP", true),
            log_backends: env_list("LOG_BACKENDS", &[]),
            log_root: env_string("LOG_ROOT", "./logs"),
            public_host: env_string("PUBLIC_HOST", "127.0.0.1"),
            auth_enabled: env_parsed("AUTH_ENABLED", true),
            jwt_secret: env_string("JWT_SECRET", "dev-secret-change-me"),
            calendar_locale: env_string("CALENDAR_LOCALE", "CN"),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} is set but not parseable: {raw:?}")),
        Err(_) => default,
    }
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) if !raw.is_empty() => raw.split(',').map(str::trim).map(String::from).collect(),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_list_splits_on_commas_and_trims() {
        assert_eq!(
            env_list("__UNUSED__", &["redis"]),
            vec!["redis".to_string()]
        );
    }

    #[test]
    fn env_parsed_falls_back_to_default_when_unset() {
        assert_eq!(env_parsed::<u64>("__ALSO_UNUSED__", 30), 30);
    }
}
