//! Tessera Observability
//!
//! Subscriber setup for the `tracing` macros used throughout the workspace.
//!
//! # Configuration
//!
//! - `RUST_LOG`: full `EnvFilter` directive, takes precedence when set
//! - `LOG_LEVEL`: default level when `RUST_LOG` is unset (default: `info`)
//! - `LOG_FORMAT`: `compact` (default) or `json`
//! - `LOG_DIR`: when set, JSON logs are also written to a daily rolling file there
//!
//! # Examples
//!
//! ```no_run
//! use tessera_observability::{LoggingConfig, init_logging};
//!
//! let _guard = init_logging(&LoggingConfig::from_env()).expect("logging");
//! tracing::info!("ready");
//! ```

pub mod logging;

pub use logging::{LogFormat, LoggingConfig, init_logging};
