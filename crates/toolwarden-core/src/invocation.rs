//! Invocation requests and approval decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;
use uuid::Uuid;

use crate::descriptor::OperationDescriptor;

/// Longest rendering of a single argument value in an approval prompt.
const MAX_RENDERED_ARGUMENT_CHARS: usize = 240;

/// Unique identifier for one invocation of a governed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(pub Uuid);

impl InvocationId {
    /// Create a new random invocation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv:{}", self.0)
    }
}

/// One call to a governed operation with a specific argument list.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    /// Unique invocation identifier.
    pub id: InvocationId,
    /// Identity of the tool instance the call targets.
    pub tool: String,
    /// The operation being invoked.
    pub descriptor: Arc<OperationDescriptor>,
    /// Ordered argument values.
    pub arguments: Vec<Value>,
    /// When the invocation was requested.
    pub created_at: DateTime<Utc>,
}

impl InvocationRequest {
    /// Create a new request with a fresh invocation ID.
    #[must_use]
    pub fn new(
        tool: impl Into<String>,
        descriptor: Arc<OperationDescriptor>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            id: InvocationId::new(),
            tool: tool.into(),
            descriptor,
            arguments,
            created_at: Utc::now(),
        }
    }

    /// Name of the invoked operation.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.descriptor.name
    }

    /// Render a human-readable description for an approval prompt.
    ///
    /// Arguments are listed against their declared parameter names; surplus
    /// values are labelled positionally.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{} wants to run {} [{}]",
            self.tool, self.descriptor.display_name, self.descriptor.tier
        );
        for (index, value) in self.arguments.iter().enumerate() {
            let label = self
                .descriptor
                .parameters
                .get(index)
                .map_or_else(|| format!("arg{index}"), Clone::clone);
            let _ = write!(out, "\n  {label} = {}", render_value(value));
        }
        out
    }
}

impl fmt::Display for InvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.descriptor.qualified_name())
    }
}

fn render_value(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_RENDERED_ARGUMENT_CHARS {
        return rendered;
    }
    let mut truncated: String = rendered.chars().take(MAX_RENDERED_ARGUMENT_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// What produced an approval decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOrigin {
    /// A human (or the configured decision function) answered.
    Human,
    /// The waiting invocation was cancelled.
    Cancelled,
    /// The approval deadline elapsed.
    TimedOut,
    /// The decision channel failed or was not configured.
    ChannelFailure,
}

impl fmt::Display for DecisionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => f.write_str("human"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::TimedOut => f.write_str("timed out"),
            Self::ChannelFailure => f.write_str("channel failure"),
        }
    }
}

/// The decision made on a pending invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// The invocation this decision addresses.
    pub invocation_id: InvocationId,
    /// Whether the invocation may proceed.
    pub approved: bool,
    /// Optional human-readable reason.
    pub reason: Option<String>,
    /// What produced the decision.
    pub origin: DecisionOrigin,
}

impl ApprovalDecision {
    /// A human approval.
    #[must_use]
    pub fn approve(invocation_id: InvocationId) -> Self {
        Self {
            invocation_id,
            approved: true,
            reason: None,
            origin: DecisionOrigin::Human,
        }
    }

    /// A human denial with a reason.
    #[must_use]
    pub fn deny(invocation_id: InvocationId, reason: impl Into<String>) -> Self {
        Self {
            invocation_id,
            approved: false,
            reason: Some(reason.into()),
            origin: DecisionOrigin::Human,
        }
    }

    /// A denial produced by cancelling the waiting invocation.
    #[must_use]
    pub fn cancelled(invocation_id: InvocationId, reason: impl Into<String>) -> Self {
        Self {
            origin: DecisionOrigin::Cancelled,
            ..Self::deny(invocation_id, reason)
        }
    }

    /// A denial produced by the approval deadline elapsing.
    #[must_use]
    pub fn timed_out(invocation_id: InvocationId, reason: impl Into<String>) -> Self {
        Self {
            origin: DecisionOrigin::TimedOut,
            ..Self::deny(invocation_id, reason)
        }
    }

    /// A denial produced by a failing or missing decision channel.
    #[must_use]
    pub fn channel_failure(invocation_id: InvocationId, reason: impl Into<String>) -> Self {
        Self {
            origin: DecisionOrigin::ChannelFailure,
            ..Self::deny(invocation_id, reason)
        }
    }

    /// Check if this decision lets the invocation proceed.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.approved
    }

    /// The reason, or a generic one for bare denials.
    #[must_use]
    pub fn reason_or_default(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None if self.approved => "approved",
            None => "denied",
        }
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.approved { "Approve" } else { "Deny" };
        match &self.reason {
            Some(reason) => write!(f, "{} -> {verdict} ({}): {reason}", self.invocation_id, self.origin),
            None => write!(f, "{} -> {verdict} ({})", self.invocation_id, self.origin),
        }
    }
}
