use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Deployment mode, read from `API_MODE`.
///
/// Production disables the loopback origin exception and the master OTP, and
/// requires a real signing secret and database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiMode {
    #[default]
    Development,
    Production,
}

impl ApiMode {
    /// Unset means development; anything unrecognised is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_value(std::env::var("API_MODE").ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Result<Self, ConfigError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(ApiMode::Development),
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidMode(v.to_string())),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, ApiMode::Production)
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(ApiMode::Production),
            "development" | "dev" | "local" | "test" => Ok(ApiMode::Development),
            other => Err(format!("unknown API_MODE `{other}`")),
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiMode::Development => f.write_str("development"),
            ApiMode::Production => f.write_str("production"),
        }
    }
}
