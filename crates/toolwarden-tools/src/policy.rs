//! Risk classification and admission.
//!
//! The classifier never guesses: an operation without an explicit tier is
//! `Unknown`, and `Unknown` is admitted exactly like `Sensitive`.

use toolwarden_core::{OperationDescriptor, RiskTier};

/// What the proxy does with an invocation of a given tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Run the operation immediately.
    Forward,
    /// Block for a human decision first.
    RequireApproval,
}

/// Resolves each operation's risk tier. Stateless and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyClassifier;

impl PolicyClassifier {
    /// Resolve the tier of `descriptor` from its declared annotation.
    #[must_use]
    pub fn classify(descriptor: &OperationDescriptor) -> RiskTier {
        Self::resolve(descriptor.declared_tier)
    }

    /// Resolve a declared annotation. Absence means `Unknown`.
    #[must_use]
    pub fn resolve(declared: Option<RiskTier>) -> RiskTier {
        declared.unwrap_or(RiskTier::Unknown)
    }

    /// Admission for an already resolved tier.
    #[must_use]
    pub fn admission(tier: RiskTier) -> Admission {
        if tier.requires_approval() {
            Admission::RequireApproval
        } else {
            Admission::Forward
        }
    }
}
