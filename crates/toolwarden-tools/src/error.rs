//! Error types for governed tools and the interception proxy.

use std::fmt;

use serde_json::Value;
use toolwarden_core::{ApprovalDecision, DecisionOrigin};

/// Errors raised by a tool's own implementation.
///
/// The proxy forwards these unchanged inside [`InvocationError::Operation`].
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The tool was constructed with invalid settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Result type for tool implementations.
pub type ToolResult<T = Value> = Result<T, ToolError>;

/// Why a gated invocation did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// A human said no.
    Denied,
    /// The pending approval was cancelled.
    Cancelled,
    /// No decision arrived in time.
    TimedOut,
    /// The decision channel failed.
    ChannelFailure,
}

impl RejectionKind {
    /// Short label for logs and messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Denied => "denied",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
            Self::ChannelFailure => "decision channel failure",
        }
    }
}

impl From<DecisionOrigin> for RejectionKind {
    fn from(origin: DecisionOrigin) -> Self {
        match origin {
            DecisionOrigin::Human => Self::Denied,
            DecisionOrigin::Cancelled => Self::Cancelled,
            DecisionOrigin::TimedOut => Self::TimedOut,
            DecisionOrigin::ChannelFailure => Self::ChannelFailure,
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gated invocation that was not executed.
///
/// Carries the operation and its arguments for audit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("operation '{operation}' was not executed ({kind}): {reason}")]
pub struct Rejection {
    /// Operation name.
    pub operation: String,
    /// Arguments the caller supplied.
    pub arguments: Vec<Value>,
    /// Denial reason.
    pub reason: String,
    /// What kind of denial this was.
    pub kind: RejectionKind,
}

impl Rejection {
    /// Build a rejection from a denial decision.
    #[must_use]
    pub fn from_decision(
        operation: impl Into<String>,
        arguments: Vec<Value>,
        decision: &ApprovalDecision,
    ) -> Self {
        Self {
            operation: operation.into(),
            arguments,
            reason: decision.reason_or_default().to_owned(),
            kind: decision.origin.into(),
        }
    }
}

/// Errors from invoking an operation through the proxy.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// Invalid tool or declaration setup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The operation is not declared by the tool type.
    #[error("operation '{operation}' is not registered for {owner}")]
    NotRegistered {
        /// Tool type.
        owner: String,
        /// Requested operation.
        operation: String,
    },

    /// The call had the wrong number of arguments.
    #[error("operation '{operation}' takes {expected} argument(s), got {actual}")]
    Arity {
        /// Operation name.
        operation: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// The invocation was denied and never executed.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The real implementation failed.
    #[error(transparent)]
    Operation(#[from] ToolError),
}

impl InvocationError {
    /// The rejection, if this error is one.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    /// Check if this error is a rejection.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Result type for proxied invocations.
pub type InvocationResult<T = Value> = Result<T, InvocationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use toolwarden_core::InvocationId;

    #[test]
    fn test_rejection_from_decision() {
        let id = InvocationId::new();
        let rejection = Rejection::from_decision(
            "write_file",
            vec![serde_json::json!("a.txt")],
            &ApprovalDecision::deny(id, "no"),
        );
        assert_eq!(rejection.reason, "no");
        assert_eq!(rejection.kind, RejectionKind::Denied);
        assert_eq!(
            rejection.to_string(),
            "operation 'write_file' was not executed (denied): no"
        );
    }

    #[test]
    fn test_rejection_kind_from_origin() {
        let id = InvocationId::new();
        let decision = ApprovalDecision::timed_out(id, "late");
        assert_eq!(RejectionKind::from(decision.origin), RejectionKind::TimedOut);
    }

    #[test]
    fn test_operation_error_is_transparent() {
        let err = InvocationError::from(ToolError::ExecutionFailed("disk full".to_owned()));
        assert_eq!(err.to_string(), "Execution failed: disk full");
        assert!(!err.is_rejected());
    }
}
