//! Configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Longest accepted approval timeout (24 hours).
const MAX_APPROVAL_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Validate a fully loaded configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_approval(config)?;
    validate_logging(config)?;
    validate_probe(config)?;
    Ok(())
}

fn validate_approval(config: &Config) -> ConfigResult<()> {
    if config.approval.timeout_secs > MAX_APPROVAL_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError {
            field: "approval.timeout_secs".to_owned(),
            message: format!(
                "timeout {}s exceeds the {MAX_APPROVAL_TIMEOUT_SECS}s limit; use 0 to wait indefinitely",
                config.approval.timeout_secs
            ),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    if let Some(bad) = config.logging.directives.iter().find(|d| d.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "logging.directives".to_owned(),
            message: format!("empty directive {bad:?}"),
        });
    }

    Ok(())
}

fn validate_probe(config: &Config) -> ConfigResult<()> {
    let name = &config.probe.operation_name;
    let well_formed = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !well_formed {
        return Err(ConfigError::ValidationError {
            field: "probe.operation_name".to_owned(),
            message: format!(
                "'{name}' must be non-empty and contain only lowercase letters, digits, and '_'"
            ),
        });
    }
    Ok(())
}
