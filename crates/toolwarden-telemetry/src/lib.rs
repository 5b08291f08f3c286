//! Toolwarden Telemetry - Logging setup for the governance layer.
//!
//! The other Toolwarden crates only emit `tracing` events. This crate
//! installs the global subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use toolwarden_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), toolwarden_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_thread_names()
//!     .with_directive("toolwarden_approval=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("governance layer ready");
//! # Ok(())
//! # }
//! ```
//!
//! With the `config` feature, a [`LogConfig`] can be built from the
//! `[logging]` section of the Toolwarden configuration file.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
