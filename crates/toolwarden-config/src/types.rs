//! Configuration types for the Toolwarden governance layer.
//!
//! These types have no dependencies on other internal toolwarden crates.
//! Every struct implements [`Default`], so a bare `[section]` header in TOML
//! produces a working configuration.

use serde::{Deserialize, Serialize};

/// Default time a gated invocation waits for a human decision (5 minutes).
pub const DEFAULT_APPROVAL_TIMEOUT_SECS: u64 = 5 * 60;

/// Default name of the capability probe operation.
pub const DEFAULT_PROBE_OPERATION: &str = "report_probe_token";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Approval gateway behaviour.
    pub approval: ApprovalSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
    /// Capability probe settings.
    pub probe: ProbeSection,
}

// ---------------------------------------------------------------------------
// ApprovalSection
// ---------------------------------------------------------------------------

/// Approval gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// Seconds a gated invocation waits for a decision before it is denied.
    /// `0` waits indefinitely.
    pub timeout_secs: u64,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_APPROVAL_TIMEOUT_SECS,
        }
    }
}

impl ApprovalSection {
    /// The configured deadline, or `None` when waiting indefinitely.
    #[must_use]
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, or `"json"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["toolwarden_approval=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProbeSection
// ---------------------------------------------------------------------------

/// Capability probe configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSection {
    /// Name under which the probe operation is offered to the model.
    pub operation_name: String,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            operation_name: DEFAULT_PROBE_OPERATION.to_owned(),
        }
    }
}
