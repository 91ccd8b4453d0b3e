//! JWT signing configuration.
//!
//! # Environment Variables
//!
//! - `JWT_SECRET_KEY`: HMAC signing secret (development default, required in production)
//! - `JWT_ALGORITHM`: `HS256` (default), `HS384` or `HS512`
//! - `ACCESS_TOKEN_EXPIRY_MINUTES`: access credential lifetime (default: 60)
//! - `SESSION_TOKEN_EXPIRY_MINUTES`: session credential lifetime (default: 10080, 7 days)
//! - `REFRESH_TOKEN_EXPIRY_MINUTES`: refresh credential lifetime (default: 43200, 30 days)
//! - `JWT_LEEWAY_SECONDS`: tolerated clock skew on expiry checks (default: 5)
//! - `LOGOUT_TOKEN_REVOCATION_TTL_SECONDS`: how long a logged-out access token id
//!   stays blacklisted (default: 3888000, 45 days)

use std::time::Duration;

use crate::error::ConfigError;
use crate::mode::ApiMode;

const DEV_SECRET: &str = "tessera-development-secret-change-me";
const SUPPORTED_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: String,
    pub access_token_expiry_minutes: u64,
    pub session_token_expiry_minutes: u64,
    pub refresh_token_expiry_minutes: u64,
    pub leeway_seconds: u64,
    pub logout_revocation_ttl_seconds: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_token_expiry_minutes", &self.access_token_expiry_minutes)
            .field("session_token_expiry_minutes", &self.session_token_expiry_minutes)
            .field("refresh_token_expiry_minutes", &self.refresh_token_expiry_minutes)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            algorithm: "HS256".to_string(),
            access_token_expiry_minutes: 60,
            session_token_expiry_minutes: 10_080,
            refresh_token_expiry_minutes: 43_200,
            leeway_seconds: 5,
            logout_revocation_ttl_seconds: 3_888_000,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: std::env::var("JWT_SECRET_KEY").unwrap_or(defaults.secret),
            algorithm: std::env::var("JWT_ALGORITHM")
                .map(|v| v.trim().to_uppercase())
                .unwrap_or(defaults.algorithm),
            access_token_expiry_minutes: crate::env_or(
                "ACCESS_TOKEN_EXPIRY_MINUTES",
                defaults.access_token_expiry_minutes,
            ),
            session_token_expiry_minutes: crate::env_or(
                "SESSION_TOKEN_EXPIRY_MINUTES",
                defaults.session_token_expiry_minutes,
            ),
            refresh_token_expiry_minutes: crate::env_or(
                "REFRESH_TOKEN_EXPIRY_MINUTES",
                defaults.refresh_token_expiry_minutes,
            ),
            leeway_seconds: crate::env_or("JWT_LEEWAY_SECONDS", defaults.leeway_seconds),
            logout_revocation_ttl_seconds: crate::env_or(
                "LOGOUT_TOKEN_REVOCATION_TTL_SECONDS",
                defaults.logout_revocation_ttl_seconds,
            ),
        }
    }

    /// Checks algorithm support, lifetime ordering and secret strength.
    pub fn validate(&self, mode: ApiMode) -> Result<(), ConfigError> {
        if !SUPPORTED_ALGORITHMS.contains(&self.algorithm.as_str()) {
            return Err(ConfigError::UnsupportedAlgorithm(self.algorithm.clone()));
        }

        self.validate_lifetimes()?;

        let access_seconds = self.access_token_ttl().as_secs();
        if self.logout_revocation_ttl_seconds < access_seconds {
            return Err(ConfigError::RevocationTtlTooShort {
                ttl_seconds: self.logout_revocation_ttl_seconds,
                access_seconds,
            });
        }

        if mode.is_production() && (self.secret == DEV_SECRET || self.secret.len() < 32) {
            return Err(ConfigError::WeakSecret);
        }

        Ok(())
    }

    /// `0 < access < session < refresh`.
    pub fn validate_lifetimes(&self) -> Result<(), ConfigError> {
        let (access, session, refresh) = (
            self.access_token_expiry_minutes,
            self.session_token_expiry_minutes,
            self.refresh_token_expiry_minutes,
        );
        if access == 0 || access >= session || session >= refresh {
            return Err(ConfigError::ExpiryOrdering {
                access,
                session,
                refresh,
            });
        }
        Ok(())
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_expiry_minutes * 60)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_expiry_minutes * 60)
    }

    pub fn logout_revocation_ttl(&self) -> Duration {
        Duration::from_secs(self.logout_revocation_ttl_seconds)
    }
}
