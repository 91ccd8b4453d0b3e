//! One-time password settings.
//!
//! - `OTP_TTL_SECONDS`: validity window of an issued code (default: 600)
//! - `OTP_LENGTH`: number of digits (default: 6)
//! - `MASTER_OTP`: optional code that always verifies, honoured only outside production

use std::time::Duration;

use crate::error::ConfigError;
use crate::mode::ApiMode;

#[derive(Clone)]
pub struct OtpConfig {
    pub ttl_seconds: u64,
    pub length: usize,
    pub master_code: Option<String>,
}

impl std::fmt::Debug for OtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpConfig")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("length", &self.length)
            .field("master_code", &self.master_code.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 600,
            length: 6,
            master_code: None,
        }
    }
}

impl OtpConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_seconds: crate::env_or("OTP_TTL_SECONDS", defaults.ttl_seconds),
            length: crate::env_or("OTP_LENGTH", defaults.length),
            master_code: std::env::var("MASTER_OTP")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=10).contains(&self.length) {
            return Err(ConfigError::OtpLength(self.length));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// The master code, if one is configured and the mode allows it.
    pub fn effective_master_code(&self, mode: ApiMode) -> Option<&str> {
        if mode.is_production() {
            return None;
        }
        self.master_code.as_deref()
    }
}
