//! # Tessera API
//!
//! An authentication service built with Rust and Axum. A login issues a
//! triad of signed credentials sharing one session id:
//!
//! - **Access token**: short-lived, carries account status flags and a unique `jti`
//! - **Session token**: carries a profile snapshot (permissions, groups) so
//!   protected routes need no user lookup
//! - **Refresh token**: long-lived, accepted only by `/api/auth/refresh`
//!
//! Revocation is server-side. Records live in Redis when it answers at boot,
//! otherwise in process memory, at four scopes: a single token, a session, all
//! of a user's sessions, and all of a user's refresh tokens.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── tessera-core/          # AppError, AuthError, revocation scopes, passwords
//! ├── tessera-config/        # Environment-driven settings
//! ├── tessera-auth/          # Claims, TokenCodec, TokenIssuer, origin binding
//! ├── tessera-cache/         # Redis and in-memory revocation and OTP stores
//! └── tessera-observability/ # Logging initialisation
//! src/
//! ├── middleware/            # Credential extraction, validation, rate limiting
//! └── modules/
//!     ├── auth/              # Login, refresh, logout, token-info, OTP
//!     └── users/             # User records and stores
//! ```
//!
//! ## Running
//!
//! ```bash
//! cp .env.example .env
//! cargo run
//! ```
//!
//! API documentation is served at `/swagger-ui` and `/scalar`.
//!
//! ## Modules
//!
//! - [`docs`]: OpenAPI documentation setup
//! - [`logging`]: Request logging middleware
//! - [`metrics`]: Prometheus recorder and auth counters
//! - [`middleware`]: Authentication extractors and rate limiting
//! - [`modules`]: Feature modules (auth, users)
//! - [`router`]: Main application router
//! - [`state`]: Shared application state
//! - [`validator`]: Request validation utilities

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

pub use tessera_auth;
pub use tessera_cache;
pub use tessera_config;
pub use tessera_core;
