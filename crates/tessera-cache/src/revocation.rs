//! Revocation records keyed by scope.
//!
//! A record is active until its TTL elapses. `mark` is idempotent and
//! overwrites the TTL of an existing record; `claim` is the atomic
//! first-writer-wins variant used for single-use rotation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use tessera_core::RevocationScope;

use crate::memory::MemoryCache;
use crate::redis::{CacheError, RedisCache};

/// Storage for revoked tokens, sessions and users.
#[async_trait]
pub trait RevocationStore: Send + Sync + std::fmt::Debug {
    /// Marks `key` as revoked in `scope` for `ttl`.
    async fn mark(&self, scope: RevocationScope, key: &str, ttl: Duration)
    -> Result<(), CacheError>;

    /// Marks `key` only if no active record exists. Returns `true` for the
    /// caller that created the record.
    async fn claim(&self, scope: RevocationScope, key: &str, ttl: Duration)
    -> Result<bool, CacheError>;

    /// Whether an active record exists for `key` in `scope`.
    async fn is_marked(&self, scope: RevocationScope, key: &str) -> Result<bool, CacheError>;

    /// Removes the record, if any.
    async fn clear(&self, scope: RevocationScope, key: &str) -> Result<(), CacheError>;
}

#[async_trait]
impl RevocationStore for RedisCache {
    #[instrument(skip(self, scope), fields(scope = %scope))]
    async fn mark(
        &self,
        scope: RevocationScope,
        key: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_with_ttl(&self.keys().revocation(scope, key), &scope, ttl)
            .await
    }

    #[instrument(skip(self, scope), fields(scope = %scope))]
    async fn claim(
        &self,
        scope: RevocationScope,
        key: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        self.set_if_absent_with_ttl(&self.keys().revocation(scope, key), &scope, ttl)
            .await
    }

    async fn is_marked(&self, scope: RevocationScope, key: &str) -> Result<bool, CacheError> {
        self.exists(&self.keys().revocation(scope, key)).await
    }

    async fn clear(&self, scope: RevocationScope, key: &str) -> Result<(), CacheError> {
        self.invalidate(&self.keys().revocation(scope, key)).await
    }
}

#[async_trait]
impl RevocationStore for MemoryCache {
    #[instrument(skip(self, scope), fields(scope = %scope))]
    async fn mark(
        &self,
        scope: RevocationScope,
        key: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_with_ttl(&self.keys().revocation(scope, key), &scope, ttl)
            .await
    }

    #[instrument(skip(self, scope), fields(scope = %scope))]
    async fn claim(
        &self,
        scope: RevocationScope,
        key: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        self.set_if_absent_with_ttl(&self.keys().revocation(scope, key), &scope, ttl)
            .await
    }

    async fn is_marked(&self, scope: RevocationScope, key: &str) -> Result<bool, CacheError> {
        Ok(self.exists(&self.keys().revocation(scope, key)).await)
    }

    async fn clear(&self, scope: RevocationScope, key: &str) -> Result<(), CacheError> {
        self.invalidate(&self.keys().revocation(scope, key)).await;
        debug!(scope = %scope, "Revocation cleared");
        Ok(())
    }
}
