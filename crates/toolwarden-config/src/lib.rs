#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration for the Toolwarden governance layer.
//!
//! # Usage
//!
//! ```rust
//! use toolwarden_config::Config;
//!
//! let config = Config::from_toml_str(
//!     r#"
//!     [approval]
//!     timeout_secs = 120
//!
//!     [logging]
//!     level = "debug"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.approval.timeout_secs, 120);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`TOOLWARDEN_*`)
//! 2. **Config file** (explicit path, or `~/.toolwarden/config.toml`)
//! 3. **Defaults** ([`Config::default`])
//!
//! # Design
//!
//! This crate has no dependencies on other internal toolwarden crates.
//! Conversion into domain settings happens in the consuming crates
//! (`ApprovalGateway::from_config`, `LogConfig::from`).

/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ENV_APPROVAL_TIMEOUT_SECS, ENV_LOG_FORMAT, ENV_LOG_LEVEL, apply_env_overrides,
    collect_env_vars, load_with_env,
};
pub use types::*;
