//! Cache configuration.
//!
//! # Environment Variables
//!
//! - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
//! - `CACHE_ENABLED`: try Redis at startup (default: `true`); when off or
//!   unreachable the in-process store is used
//! - `CACHE_KEY_PREFIX`: prefix for every key (default: `tessera`)
//! - `CACHE_OPERATION_TIMEOUT_MS`: per-command Redis timeout (default: `250`)

use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub redis_url: String,

    pub enabled: bool,

    /// Prefix for all cache keys to avoid collisions.
    pub key_prefix: String,

    pub operation_timeout_ms: u64,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            enabled: env::var("CACHE_ENABLED")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off"))
                .unwrap_or(defaults.enabled),
            key_prefix: env::var("CACHE_KEY_PREFIX")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.key_prefix),
            operation_timeout_ms: env::var("CACHE_OPERATION_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.operation_timeout_ms),
        }
    }

    /// In-process only, no Redis attempt.
    pub fn memory_only() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            enabled: true,
            key_prefix: "tessera".into(),
            operation_timeout_ms: 250,
        }
    }
}
