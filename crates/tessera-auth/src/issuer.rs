//! Issuance of the access / session / refresh triad.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use tessera_config::{ConfigError, JwtConfig};
use tessera_core::AuthError;

use crate::claims::{
    AccessClaims, AccountStatus, ClaimHeader, ClaimSet, ProfileSnapshot, RefreshClaims,
    SessionClaims,
};
use crate::jwt::TokenCodec;

/// The three credentials produced by one issuance.
#[derive(Debug, Clone)]
pub struct TokenTriad {
    pub access_token: String,
    pub session_token: String,
    pub refresh_token: String,
    pub session_id: String,
    pub access_expires_at: DateTime<Utc>,
    pub session_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Fresh identifier for a login or a rotation.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    access_ttl: Duration,
    session_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Fails when the configured lifetimes are not strictly increasing.
    pub fn new(codec: Arc<TokenCodec>, config: &JwtConfig) -> Result<Self, ConfigError> {
        config.validate_lifetimes()?;

        Ok(Self {
            codec,
            access_ttl: Duration::minutes(config.access_token_expiry_minutes as i64),
            session_ttl: Duration::minutes(config.session_token_expiry_minutes as i64),
            refresh_ttl: Duration::minutes(config.refresh_token_expiry_minutes as i64),
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_triad(
        &self,
        subject: &str,
        origin: &str,
        profile: &ProfileSnapshot,
        status: AccountStatus,
        session_id: &str,
    ) -> Result<TokenTriad, AuthError> {
        self.issue_triad_at(subject, origin, profile, status, session_id, Utc::now())
    }

    /// Same as [`issue_triad`](Self::issue_triad) with an explicit clock.
    pub fn issue_triad_at(
        &self,
        subject: &str,
        origin: &str,
        profile: &ProfileSnapshot,
        status: AccountStatus,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenTriad, AuthError> {
        let access_expires_at = now + self.access_ttl;
        let session_expires_at = now + self.session_ttl;
        let refresh_expires_at = now + self.refresh_ttl;

        let header = |expires_at: DateTime<Utc>| ClaimHeader {
            sub: subject.to_string(),
            session_id: session_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            origin: origin.to_string(),
        };

        let access_token = self.codec.encode(&ClaimSet::Access(AccessClaims {
            header: header(access_expires_at),
            jti: Uuid::new_v4().to_string(),
            status,
        }))?;
        let session_token = self.codec.encode(&ClaimSet::Session(SessionClaims {
            header: header(session_expires_at),
            profile: profile.clone(),
        }))?;
        let refresh_token = self.codec.encode(&ClaimSet::Refresh(RefreshClaims {
            header: header(refresh_expires_at),
        }))?;

        Ok(TokenTriad {
            access_token,
            session_token,
            refresh_token,
            session_id: session_id.to_string(),
            access_expires_at,
            session_expires_at,
            refresh_expires_at,
        })
    }
}
