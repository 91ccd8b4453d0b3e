//! Process-level settings.
//!
//! - `PORT`: listener port (default: 3000)
//! - `DATABASE_URL`: Postgres connection string; without it an in-memory user
//!   store is used (development only)
//! - `BCRYPT_COST`: password hashing cost factor (default: 12)
//! - `METRICS_ENABLED`: expose Prometheus metrics at `/metrics` (default: true)

use crate::error::ConfigError;
use crate::mode::ApiMode;

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub bcrypt_cost: u32,
    pub metrics_enabled: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            bcrypt_cost: 12,
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: crate::env_or("PORT", defaults.port),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            bcrypt_cost: crate::env_or("BCRYPT_COST", defaults.bcrypt_cost),
            metrics_enabled: crate::env_flag("METRICS_ENABLED", defaults.metrics_enabled),
        }
    }

    pub fn validate(&self, mode: ApiMode) -> Result<(), ConfigError> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::BcryptCost(self.bcrypt_cost));
        }
        if mode.is_production() && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_requires_database() {
        let config = ServerConfig::default();
        assert_eq!(config.validate(ApiMode::Development), Ok(()));
        assert_eq!(
            config.validate(ApiMode::Production),
            Err(ConfigError::MissingDatabaseUrl)
        );
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let config = ServerConfig {
            bcrypt_cost: 40,
            ..ServerConfig::default()
        };
        assert_eq!(
            config.validate(ApiMode::Development),
            Err(ConfigError::BcryptCost(40))
        );
    }
}
