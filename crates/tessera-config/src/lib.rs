//! # Tessera Config
//!
//! Configuration structures loaded from environment variables.
//!
//! - [`jwt`]: signing secret, algorithm and the three credential lifetimes
//! - [`mode`]: deployment mode (`development` or `production`)
//! - [`otp`]: one-time password lifetime and length
//! - [`server`]: listener, database and password hashing settings
//! - [`cors`]: allowed browser origins
//! - [`rate_limit`]: limits on the authentication endpoints
//!
//! Every struct has a `from_env()` constructor that falls back to defaults,
//! except [`ApiMode::from_env`], which rejects values it does not recognise.
//! Cross-field rules are checked by `validate`, which the binary calls once at
//! startup so a bad configuration never reaches request handling.
//!
//! # Example
//!
//! ```ignore
//! use tessera_config::{ApiMode, JwtConfig};
//!
//! let mode = ApiMode::from_env()?;
//! let jwt = JwtConfig::from_env();
//! jwt.validate(mode)?;
//! ```

pub mod cors;
pub mod error;
pub mod jwt;
pub mod mode;
pub mod otp;
pub mod rate_limit;
pub mod server;

pub use cors::CorsConfig;
pub use error::ConfigError;
pub use jwt::JwtConfig;
pub use mode::ApiMode;
pub use otp::OtpConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

/// Reads and parses an environment variable, falling back to `default`.
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Reads a boolean flag. `false`, `0`, `no` and `off` disable it.
pub(crate) fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off"))
        .unwrap_or(default)
}
