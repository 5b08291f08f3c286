//! Operation metadata: risk tiers and descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk classification of a governed operation.
///
/// `Unknown` is what an operation without an explicit annotation resolves to.
/// It is gated exactly like `Sensitive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Read-only; forwarded without approval.
    Safe,
    /// Inherently user-facing; the interaction itself is the approval.
    Interactive,
    /// Mutates state; requires human approval.
    Sensitive,
    /// Unclassified; requires human approval.
    Unknown,
}

impl RiskTier {
    /// All tiers, in ascending order of caution.
    pub const ALL: [Self; 4] = [Self::Safe, Self::Interactive, Self::Sensitive, Self::Unknown];

    /// Check if operations of this tier must pass through the approval gateway.
    #[must_use]
    pub fn requires_approval(self) -> bool {
        matches!(self, Self::Sensitive | Self::Unknown)
    }

    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Interactive => "interactive",
            Self::Sensitive => "sensitive",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one agent-callable operation of a tool type.
///
/// Descriptors are built once per operation per type by the operation
/// registry and shared behind an `Arc`; they are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Unique operation name within the owning type.
    pub name: String,
    /// Human-readable name shown in approval prompts.
    pub display_name: String,
    /// Ordered parameter names.
    pub parameters: Vec<String>,
    /// The tier annotation the tool declared, if any.
    pub declared_tier: Option<RiskTier>,
    /// The tier resolved by the policy classifier.
    pub tier: RiskTier,
    /// Name of the owning tool type.
    pub owner: String,
}

impl OperationDescriptor {
    /// Create a descriptor with no parameters and no tier annotation.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            parameters: Vec::new(),
            declared_tier: None,
            tier: RiskTier::Unknown,
            owner: owner.into(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the ordered parameter names.
    #[must_use]
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Set the declared tier annotation.
    #[must_use]
    pub fn with_declared_tier(mut self, tier: Option<RiskTier>) -> Self {
        self.declared_tier = tier;
        self
    }

    /// Set the resolved tier.
    #[must_use]
    pub fn with_tier(mut self, tier: RiskTier) -> Self {
        self.tier = tier;
        self
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Fully qualified name, `Owner.operation`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }
}

impl fmt::Display for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) [{}]",
            self.qualified_name(),
            self.parameters.join(", "),
            self.tier
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_approval() {
        assert!(!RiskTier::Safe.requires_approval());
        assert!(!RiskTier::Interactive.requires_approval());
        assert!(RiskTier::Sensitive.requires_approval());
        assert!(RiskTier::Unknown.requires_approval());
    }

    #[test]
    fn test_tier_serialization() {
        let json = serde_json::to_string(&RiskTier::Interactive).unwrap();
        assert_eq!(json, "\"interactive\"");
        let tier: RiskTier = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(tier, RiskTier::Unknown);
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = OperationDescriptor::new("Workbench", "run_build");
        assert_eq!(descriptor.display_name, "run_build");
        assert_eq!(descriptor.arity(), 0);
        assert_eq!(descriptor.declared_tier, None);
        assert_eq!(descriptor.tier, RiskTier::Unknown);
    }

    #[test]
    fn test_descriptor_display() {
        let descriptor = OperationDescriptor::new("Workbench", "write_file")
            .with_parameters(["path", "content"])
            .with_tier(RiskTier::Sensitive);
        assert_eq!(
            descriptor.to_string(),
            "Workbench.write_file(path, content) [sensitive]"
        );
    }
}
