use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use recruitflow_events::RetryPolicy;

/// Engine configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between poll ticks (default: 300 s).
    pub poll_interval: Duration,
    /// Upper bound for one tick; an overrunning tick stops starting firings (default: 240 s).
    pub tick_timeout: Duration,
    /// Maximum (rule, subject) dispatches in flight within a tick (default: 8).
    pub dispatch_concurrency: usize,
    /// Retry policy for transient transport failures.
    pub retry: RetryPolicy,
    /// Offset send windows, schedules and rendered dates use (default: UTC).
    pub utc_offset: FixedOffset,
    /// Portal link used in messages when a client has none configured.
    pub portal_base_url: String,
    /// Interval between digest flushes (default: 3600 s).
    pub digest_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            tick_timeout: Duration::from_secs(240),
            dispatch_concurrency: 8,
            retry: RetryPolicy::default(),
            utc_offset: Utc.fix(),
            portal_base_url: "http://localhost:5173".to_string(),
            digest_interval: Duration::from_secs(3600),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `POLL_INTERVAL_SECS`        | `300`                   |
    /// | `TICK_TIMEOUT_SECS`         | `240`                   |
    /// | `DISPATCH_CONCURRENCY`      | `8`                     |
    /// | `SEND_MAX_ATTEMPTS`         | `3`                     |
    /// | `SEND_RETRY_BASE_MS`        | `1000`                  |
    /// | `ENGINE_UTC_OFFSET_MINUTES` | `0`                     |
    /// | `PORTAL_BASE_URL`           | `http://localhost:5173` |
    /// | `DIGEST_INTERVAL_SECS`      | `3600`                  |
    ///
    /// Panics on unparsable values; this only runs at startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let poll_interval = Duration::from_secs(env_or("POLL_INTERVAL_SECS", 300));
        let tick_timeout = Duration::from_secs(env_or("TICK_TIMEOUT_SECS", 240));
        assert!(
            tick_timeout <= poll_interval,
            "TICK_TIMEOUT_SECS must not exceed POLL_INTERVAL_SECS"
        );

        let offset_minutes: i32 = env_or("ENGINE_UTC_OFFSET_MINUTES", 0);
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .expect("ENGINE_UTC_OFFSET_MINUTES must be within +/- 24 hours");

        Self {
            poll_interval,
            tick_timeout,
            dispatch_concurrency: env_or::<usize>("DISPATCH_CONCURRENCY", 8).max(1),
            retry: RetryPolicy {
                max_attempts: env_or("SEND_MAX_ATTEMPTS", 3),
                base_delay: Duration::from_millis(env_or("SEND_RETRY_BASE_MS", 1000)),
            },
            utc_offset,
            portal_base_url: std::env::var("PORTAL_BASE_URL")
                .unwrap_or(defaults.portal_base_url),
            digest_interval: Duration::from_secs(env_or("DIGEST_INTERVAL_SECS", 3600)),
        }
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid number, got '{raw}'")),
        Err(_) => default,
    }
}
