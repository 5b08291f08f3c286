//! Config file discovery and loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Start from [`Config::default`]
//! 2. Replace with the TOML file (explicit path, or `~/.toolwarden/config.toml`)
//! 3. Apply `TOOLWARDEN_*` environment overrides
//! 4. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Maximum config file size (1 MiB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Environment variable overriding `approval.timeout_secs`.
pub const ENV_APPROVAL_TIMEOUT_SECS: &str = "TOOLWARDEN_APPROVAL_TIMEOUT_SECS";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "TOOLWARDEN_LOG_LEVEL";
/// Environment variable overriding `logging.format`.
pub const ENV_LOG_FORMAT: &str = "TOOLWARDEN_LOG_FORMAT";

impl Config {
    /// Parse and validate a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] for malformed TOML and
    /// [`ConfigError::ValidationError`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config = parse(content, "<inline>")?;
        validate::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from `path` (or the default location) with
    /// environment overrides from the current process.
    ///
    /// A missing file is not an error; defaults are used.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or malformed, or
    /// if the final configuration fails validation.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        load_with_env(&path, &collect_env_vars())
    }

    /// Default config file location, `~/.toolwarden/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] if the home directory is unknown.
    pub fn default_path() -> ConfigResult<PathBuf> {
        directories::BaseDirs::new()
            .map(|d| d.home_dir().join(".toolwarden").join("config.toml"))
            .ok_or(ConfigError::NoHomeDir)
    }
}

/// Load `path` and apply overrides from an explicit environment map.
///
/// # Errors
///
/// See [`Config::load`].
pub fn load_with_env(path: &Path, env: &HashMap<String, String>) -> ConfigResult<Config> {
    let mut config = match try_read_file(path)? {
        Some(content) => {
            let config = parse(&content, &path.display().to_string())?;
            info!(path = %path.display(), "loaded config");
            config
        },
        None => Config::default(),
    };
    apply_env_overrides(&mut config, env)?;
    validate::validate(&config)?;
    Ok(config)
}

/// Apply `TOOLWARDEN_*` overrides to `config`.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] if an override cannot be parsed.
pub fn apply_env_overrides(config: &mut Config, env: &HashMap<String, String>) -> ConfigResult<()> {
    if let Some(raw) = env.get(ENV_APPROVAL_TIMEOUT_SECS) {
        config.approval.timeout_secs =
            raw.trim()
                .parse()
                .map_err(|e| ConfigError::ValidationError {
                    field: ENV_APPROVAL_TIMEOUT_SECS.to_owned(),
                    message: format!("'{raw}' is not a number of seconds: {e}"),
                })?;
        debug!(timeout_secs = config.approval.timeout_secs, "approval timeout from env");
    }
    if let Some(level) = env.get(ENV_LOG_LEVEL) {
        config.logging.level = level.trim().to_lowercase();
    }
    if let Some(format) = env.get(ENV_LOG_FORMAT) {
        config.logging.format = format.trim().to_lowercase();
    }
    Ok(())
}

/// Snapshot the `TOOLWARDEN_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with("TOOLWARDEN_"))
        .collect()
}

fn parse(content: &str, origin: &str) -> ConfigResult<Config> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: origin.to_owned(),
        source: e,
    })
}

fn try_read_file(path: &Path) -> ConfigResult<Option<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    Ok(Some(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            [approval]
            timeout_secs = 30

            [logging]
            level = "debug"
            directives = ["toolwarden_approval=trace"]
            "#,
        )
        .unwrap();
        assert_eq!(config.approval.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.probe.operation_name, "report_probe_token");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_zero_timeout_waits_indefinitely() {
        let config = Config::from_toml_str("[approval]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.approval.timeout(), None);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::from_toml_str("[approval\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = Config::from_toml_str("[approval]\ntimeout_secs = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_with_env(&dir.path().join("absent.toml"), &HashMap::new()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[approval]\ntimeout_secs = 10\n[logging]\nlevel = \"warn\"\n")
            .unwrap();

        let env = HashMap::from([
            (ENV_APPROVAL_TIMEOUT_SECS.to_owned(), "45".to_owned()),
            (ENV_LOG_FORMAT.to_owned(), " JSON ".to_owned()),
        ]);
        let config = load_with_env(&path, &env).unwrap();
        assert_eq!(config.approval.timeout_secs, 45);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_bad_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let env = HashMap::from([(ENV_APPROVAL_TIMEOUT_SECS.to_owned(), "soon".to_owned())]);
        let err = load_with_env(&dir.path().join("config.toml"), &env).unwrap_err();
        assert!(err.to_string().contains(ENV_APPROVAL_TIMEOUT_SECS));
    }

    #[test]
    fn test_env_override_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let env = HashMap::from([(ENV_LOG_LEVEL.to_owned(), "chatty".to_owned())]);
        assert!(load_with_env(&dir.path().join("config.toml"), &env).is_err());
    }
}
