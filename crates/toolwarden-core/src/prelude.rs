//! Prelude module - commonly used types for convenient import.
//!
//! Use `use toolwarden_core::prelude::*;` to import all essential types.

// Operation metadata
pub use crate::{OperationDescriptor, RiskTier};

// Invocations and decisions
pub use crate::{ApprovalDecision, DecisionOrigin, InvocationId, InvocationRequest};
