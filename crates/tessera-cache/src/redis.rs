//! Redis client shared by the revocation and OTP stores.
//!
//! Every command is bounded by the configured operation timeout so a slow or
//! partitioned Redis surfaces as an error instead of stalling the request.

use std::future::Future;
use std::time::Duration;

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use tessera_core::AuthError;

use crate::config::CacheConfig;
use crate::keys::CacheKeys;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    keys: CacheKeys,
    timeout: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("keys", &self.keys)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<CacheError> for AuthError {
    fn from(_: CacheError) -> Self {
        AuthError::StoreUnavailable
    }
}

impl RedisCache {
    /// Connects and verifies the server answers `PING` within the timeout.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` or `CacheError::Timeout`.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let timeout = config.operation_timeout();
        let client = Client::open(config.redis_url.as_str())?;
        let conn = match tokio::time::timeout(timeout * 4, ConnectionManager::new(client)).await {
            Ok(conn) => conn?,
            Err(_) => return Err(CacheError::Timeout(timeout * 4)),
        };

        let cache = Self {
            conn,
            keys: CacheKeys::new(config.key_prefix.clone()),
            timeout,
        };
        cache.ping().await?;

        Ok(cache)
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }

    #[instrument(skip(self), fields(cache.operation = "PING"))]
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let pong: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        debug!(reply = %pong, "Redis answered PING");
        Ok(())
    }

    /// Gets a JSON value by key.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut conn = self.conn.clone();

        match self.bounded(conn.get::<_, Option<String>>(key)).await? {
            Some(value) => {
                debug!(cache.key = %key, "Cache hit");
                serde_json::from_str(&value).map(Some).map_err(|e| {
                    error!(cache.key = %key, error = %e, "Failed to deserialize cached value");
                    CacheError::from(e)
                })
            }
            None => {
                debug!(cache.key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Sets a JSON value, overwriting any previous value and TTL.
    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set_with_ttl<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;
        // SETEX rejects zero.
        let seconds = ttl.as_secs().max(1);

        self.bounded(conn.set_ex::<_, _, ()>(key, json, seconds))
            .await?;

        debug!(cache.key = %key, cache.ttl_secs = %seconds, "Cache set");

        Ok(())
    }

    /// Sets a JSON value only when the key is absent. Returns whether it was set.
    #[instrument(skip(self, value), fields(cache.operation = "SET NX"))]
    pub async fn set_if_absent_with_ttl<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<bool, CacheError>
    where
        T: Serialize,
    {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;
        let seconds = ttl.as_secs().max(1);

        let reply: Option<String> = self
            .bounded(
                redis::cmd("SET")
                    .arg(key)
                    .arg(json)
                    .arg("NX")
                    .arg("EX")
                    .arg(seconds)
                    .query_async(&mut conn),
            )
            .await?;

        debug!(cache.key = %key, created = reply.is_some(), "Cache set if absent");
        Ok(reply.is_some())
    }

    #[instrument(skip(self), fields(cache.operation = "EXISTS"))]
    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.exists::<_, bool>(key)).await
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        self.bounded(conn.del::<_, ()>(key)).await?;

        debug!(cache.key = %key, "Cache invalidated");

        Ok(())
    }
}
