//! # Tessera Auth
//!
//! Credential types and JWT utilities for the Tessera API.
//!
//! - [`claims`]: the tagged [`ClaimSet`] carried by access, session and refresh credentials
//! - [`jwt`]: [`TokenCodec`], HMAC signing and verification
//! - [`issuer`]: [`TokenIssuer`], which produces the three credentials of one login
//! - [`principal`]: the per-request [`Principal`]
//! - [`origin`]: origin normalisation and the development-host exception
//!
//! # Credential Kinds
//!
//! - **Access**: short-lived, carries a unique `jti` and the account status flags
//! - **Session**: medium-lived, carries a snapshot of the user profile, permissions and groups
//! - **Refresh**: long-lived, only usable to rotate the triad
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tessera_auth::{ExpiryPolicy, TokenCodec, TokenIssuer, new_session_id};
//! use tessera_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let codec = Arc::new(TokenCodec::from_config(&config)?);
//! let issuer = TokenIssuer::new(codec.clone(), &config)?;
//!
//! let triad = issuer.issue_triad(&user_id, &origin, &profile, profile.status(), &new_session_id())?;
//! let claims = codec.decode(&triad.session_token, ExpiryPolicy::Enforce)?;
//! ```

pub mod claims;
pub mod issuer;
pub mod jwt;
pub mod origin;
pub mod principal;

pub use claims::{
    AccessClaims, AccountStatus, ClaimHeader, ClaimSet, CredentialKind, ProfileSnapshot,
    RefreshClaims, SessionClaims, UserProfile,
};
pub use issuer::{TokenIssuer, TokenTriad, new_session_id};
pub use jwt::{ExpiryPolicy, TokenCodec};
pub use origin::{is_development_origin, normalize_origin, origins_match};
pub use principal::Principal;
