//! Rate limiting configuration for the authentication endpoints.
//!
//! Login, OTP and refresh endpoints are the brute-force surface of the service,
//! so they get a per-client token bucket.
//!
//! # Configuration
//!
//! - `RATE_LIMIT_ENABLED`: turn the limiter on or off (default: true)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: replenish rate per client (default: 10)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: bucket size per client (default: 5)
//! - `RATE_LIMIT_TRUSTED_PROXIES`: comma-separated proxy addresses whose
//!   `X-Forwarded-For` is honoured (default: none, clients keyed by peer address)
//!
//! # Example
//!
//! ```ignore
//! use tessera_config::RateLimitConfig;
//!
//! let config = RateLimitConfig::from_env();
//! if let Some(quota) = config.auth_quota() {
//!     let limiter = governor::RateLimiter::keyed(quota);
//! }
//! ```

use std::net::IpAddr;
use std::num::NonZeroU32;

use governor::Quota;

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Requests per second replenished for each client.
    pub auth_per_second: u32,

    /// Requests a client may send in a burst before being throttled.
    pub auth_burst_size: u32,

    /// Peers allowed to report the client address in `X-Forwarded-For`.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_per_second: 10,
            auth_burst_size: 5,
            trusted_proxies: Vec::new(),
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: crate::env_flag("RATE_LIMIT_ENABLED", defaults.enabled),
            auth_per_second: crate::env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: crate::env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
            trusted_proxies: std::env::var("RATE_LIMIT_TRUSTED_PROXIES")
                .map(|v| parse_proxies(&v))
                .unwrap_or_default(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Quota for the auth endpoints, or `None` when limiting is off or the
    /// configured numbers are zero.
    #[must_use]
    pub fn auth_quota(&self) -> Option<Quota> {
        if !self.enabled {
            return None;
        }
        let rate = NonZeroU32::new(self.auth_per_second)?;
        let burst = NonZeroU32::new(self.auth_burst_size)?;
        Some(Quota::per_second(rate).allow_burst(burst))
    }
}

fn parse_proxies(value: &str) -> Vec<IpAddr> {
    value
        .split(',')
        .filter_map(|ip| ip.trim().parse().ok())
        .collect()
}
