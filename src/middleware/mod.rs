//! Extractors and middleware for protected and rate-limited routes.
//!
//! - [`auth`]: credential extraction, [`auth::CredentialValidator`] and the
//!   [`auth::AuthUser`] extractor
//! - [`rate_limit`]: per-IP limiting of the login, refresh and OTP endpoints
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//!
//! async fn profile(auth_user: AuthUser) -> Json<Principal> {
//!     tracing::info!(user_id = %auth_user.user_id(), "Profile viewed");
//!     Json(auth_user.principal)
//! }
//! ```

pub mod auth;
pub mod rate_limit;
