use std::env;
use std::time::Duration;

/// Process configuration, read once at startup from the environment.
///
/// Plain `env::var` lookups in `main` rather than a config-file layer —
/// there is nothing here that benefits from one.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub log_level: String,
    /// Batch worker poll cadence, bounded to at most a minute.
    pub batch_worker_interval: Duration,
    /// Baseline recompute cadence, bounded to at most six hours.
    pub baseline_worker_interval: Duration,
    /// Retention sweep cadence; runs once a day by default.
    pub retention_worker_interval: Duration,
    /// Notification retention horizon (see DESIGN.md for the chosen default).
    pub notification_retention_days: i64,
    /// `VoteActivity` retention horizon: velocity lookback (3h) plus a safety margin.
    pub vote_activity_retention_days: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()),
            batch_worker_interval: Duration::from_secs(
                env_u64("BATCH_WORKER_INTERVAL_SECS", 60),
            ),
            baseline_worker_interval: Duration::from_secs(
                env_u64("BASELINE_WORKER_INTERVAL_SECS", 6 * 60 * 60),
            ),
            retention_worker_interval: Duration::from_secs(
                env_u64("RETENTION_WORKER_INTERVAL_SECS", 24 * 60 * 60),
            ),
            notification_retention_days: env_u64("NOTIFICATION_RETENTION_DAYS", 30) as i64,
            vote_activity_retention_days: env_u64("VOTE_ACTIVITY_RETENTION_DAYS", 10) as i64,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
