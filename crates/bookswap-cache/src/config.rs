//! Cache configuration.
//!
//! Connection settings, TTLs and the reconnect policy are loaded from
//! environment variables.

use std::env;
use std::time::Duration;

use crate::keys::SEARCH_PREFIX;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_ENABLED`: Set to `false` to run without a cache (default: `true`)
/// - `CACHE_TTL_SECONDS`: Default TTL for cached responses (default: `300`)
/// - `CACHE_KEY_PREFIX`: Namespace prepended to every key (default: `search`)
/// - `CACHE_SCAN_COUNT`: `COUNT` hint per `SCAN` page during invalidation (default: `100`)
/// - `CACHE_OPERATION_TIMEOUT_MS`: Upper bound for a single store call (default: `1000`)
///
/// The reconnect variables are documented on [`ReconnectPolicy`].
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub redis_url: String,

    /// Whether the cache should be constructed at all.
    pub enabled: bool,

    /// Default time-to-live for cached entries in seconds.
    pub default_ttl_seconds: u64,

    /// Namespace prefix for generated keys.
    pub key_prefix: String,

    /// Page size hint for pattern scans.
    pub scan_count: usize,

    /// Timeout applied to every store round trip.
    pub operation_timeout: Duration,

    /// Backoff used while (re)establishing the connection.
    pub reconnect: ReconnectPolicy,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            enabled: env::var("CACHE_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
            default_ttl_seconds: env_or("CACHE_TTL_SECONDS", defaults.default_ttl_seconds),
            key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            scan_count: env_or("CACHE_SCAN_COUNT", defaults.scan_count).max(1),
            operation_timeout: Duration::from_millis(env_or("CACHE_OPERATION_TIMEOUT_MS", 1000)),
            reconnect: ReconnectPolicy::from_env(),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            enabled: true,
            default_ttl_seconds: 300,
            key_prefix: SEARCH_PREFIX.into(),
            scan_count: 100,
            operation_timeout: Duration::from_millis(1000),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Bounded linear backoff with a ceiling.
///
/// Attempt `n` (1-based) waits `min(n * step, max_delay)` before connecting.
/// Once `max_attempts` have failed the store gives up and stays disconnected.
///
/// # Environment Variables
///
/// - `CACHE_MAX_RECONNECT_ATTEMPTS` (default: `10`)
/// - `CACHE_RECONNECT_STEP_MS` (default: `100`)
/// - `CACHE_RECONNECT_MAX_DELAY_MS` (default: `3000`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub step: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    pub fn from_env() -> Self {
        Self {
            max_attempts: env_or("CACHE_MAX_RECONNECT_ATTEMPTS", 10),
            step: Duration::from_millis(env_or("CACHE_RECONNECT_STEP_MS", 100)),
            max_delay: Duration::from_millis(env_or("CACHE_RECONNECT_MAX_DELAY_MS", 3000)),
        }
    }

    /// Delay before the given attempt, or `None` once the budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        Some(self.step.saturating_mul(attempt).min(self.max_delay))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            step: Duration::from_millis(100),
            max_delay: Duration::from_millis(3000),
        }
    }
}
