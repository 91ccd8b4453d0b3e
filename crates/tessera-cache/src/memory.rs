//! In-process fallback used when Redis is disabled or unreachable at startup.
//!
//! Entries expire on the tokio clock, so tests can pause and advance time.
//! Nothing survives a restart.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::keys::CacheKeys;
use crate::redis::CacheError;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    keys: CacheKeys,
}

impl MemoryCache {
    pub fn new(keys: CacheKeys) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            keys,
        }
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => {
                Ok(Some(serde_json::from_str(&entry.value)?))
            }
            _ => Ok(None),
        }
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set_with_ttl<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let value = serde_json::to_string(value)?;
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );

        debug!(cache.key = %key, cache.ttl_secs = %ttl.as_secs(), "Cache set");
        Ok(())
    }

    /// Inserts only when no live entry exists. Returns whether it was inserted.
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
        let value = serde_json::to_string(value)?;
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    pub async fn exists(&self, key: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .is_some_and(|entry| entry.is_live(Instant::now()))
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
