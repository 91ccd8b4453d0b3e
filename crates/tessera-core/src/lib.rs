//! # Tessera Core
//!
//! Core types, errors, and utilities shared by every Tessera crate.
//!
//! - [`errors`]: HTTP-facing [`AppError`] with JSON response conversion
//! - [`auth_error`]: the [`AuthError`] taxonomy produced by token and session checks
//! - [`revocation`]: revocation scopes shared by the cache and the flows
//! - [`password`]: bcrypt hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use tessera_core::{AppError, AuthError};
//!
//! fn check(valid: bool) -> Result<(), AppError> {
//!     if !valid {
//!         return Err(AuthError::Expired.into());
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth_error;
pub mod errors;
pub mod password;
pub mod revocation;

pub use auth_error::AuthError;
pub use errors::{AppError, ErrorResponse};
pub use password::{hash_password, verify_password};
pub use revocation::RevocationScope;
