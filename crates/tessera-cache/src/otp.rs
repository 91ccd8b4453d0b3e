//! Storage for issued one-time passwords.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::memory::MemoryCache;
use crate::redis::{CacheError, RedisCache};

/// An issued code with the unix time it was issued at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOtp {
    pub code: String,
    pub issued_at: i64,
}

#[async_trait]
pub trait OtpStore: Send + Sync + std::fmt::Debug {
    /// Stores `otp` under `identifier`, replacing any earlier code.
    async fn store(&self, identifier: &str, otp: &StoredOtp, ttl: Duration)
    -> Result<(), CacheError>;

    async fn fetch(&self, identifier: &str) -> Result<Option<StoredOtp>, CacheError>;

    async fn discard(&self, identifier: &str) -> Result<(), CacheError>;
}

#[async_trait]
impl OtpStore for RedisCache {
    async fn store(
        &self,
        identifier: &str,
        otp: &StoredOtp,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_with_ttl(&self.keys().otp(identifier), otp, ttl)
            .await
    }

    async fn fetch(&self, identifier: &str) -> Result<Option<StoredOtp>, CacheError> {
        self.get(&self.keys().otp(identifier)).await
    }

    async fn discard(&self, identifier: &str) -> Result<(), CacheError> {
        self.invalidate(&self.keys().otp(identifier)).await
    }
}

#[async_trait]
impl OtpStore for MemoryCache {
    async fn store(
        &self,
        identifier: &str,
        otp: &StoredOtp,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.set_with_ttl(&self.keys().otp(identifier), otp, ttl)
            .await
    }

    async fn fetch(&self, identifier: &str) -> Result<Option<StoredOtp>, CacheError> {
        self.get(&self.keys().otp(identifier)).await
    }

    async fn discard(&self, identifier: &str) -> Result<(), CacheError> {
        self.invalidate(&self.keys().otp(identifier)).await;
        Ok(())
    }
}
