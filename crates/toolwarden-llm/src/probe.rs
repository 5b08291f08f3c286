//! Tool-use capability probe.
//!
//! Checks whether a model binding actually exercises tool invocation end to
//! end: the probe offers a single no-argument operation that returns a fresh
//! random token, asks the model once to call it and echo nothing else, and
//! then inspects which invocations the model really emitted.
//!
//! ```text
//! Idle -> Requested -> { Matched | NotInvoked | Mismatched | Error }
//! ```
//!
//! Only `Matched` means the binding supports tool use. Errors and panics from
//! the binding are classified as unsupported, never propagated.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use thiserror::Error;
use toolwarden_config::{DEFAULT_PROBE_OPERATION, ProbeSection};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{AgentBinding, AgentRequest, AgentTurn, ToolExecutor};
use crate::types::{LlmToolDefinition, ToolCall, ToolCallResult};

const PROBE_SYSTEM: &str = "You are verifying tool access. Use the provided tool; do not guess its output.";

/// Errors for misuse of the probe itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// The expected token was empty or whitespace.
    #[error("expected probe token must not be blank")]
    BlankToken,
}

/// Probe lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Not run yet.
    Idle,
    /// Request sent, waiting for the binding.
    Requested,
    /// The probe operation was called and returned the expected token.
    Matched,
    /// The model never called the probe operation.
    NotInvoked,
    /// The probe operation was called but the reported result differs.
    Mismatched,
    /// The binding failed or panicked.
    Error,
}

impl ProbeState {
    /// Whether this state means tool use is supported.
    #[must_use]
    pub fn is_supported(self) -> bool {
        self == Self::Matched
    }
}

/// Result of one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Final state.
    pub state: ProbeState,
    /// Token the probe expected.
    pub expected_token: String,
    /// How many times the probe operation was invoked.
    pub probe_calls: usize,
    /// Failure detail for `Mismatched` and `Error`.
    pub detail: Option<String>,
}

impl ProbeReport {
    /// Whether the binding supports tool use.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.state.is_supported()
    }
}

/// Answers the probe operation with the expected token.
struct TokenExecutor {
    operation: String,
    token: String,
}

impl ToolExecutor for TokenExecutor {
    fn execute(&self, call: &ToolCall) -> ToolCallResult {
        if call.name == self.operation {
            ToolCallResult::success(call.id.clone(), self.token.clone())
        } else {
            ToolCallResult::error(call.id.clone(), format!("unknown tool '{}'", call.name))
        }
    }
}

/// Verifies that an [`AgentBinding`] really invokes tools.
pub struct CapabilityProbe<B> {
    binding: B,
    operation: String,
    state: Mutex<ProbeState>,
}

impl<B: AgentBinding> CapabilityProbe<B> {
    /// Create a probe using the default operation name.
    pub fn new(binding: B) -> Self {
        Self {
            binding,
            operation: DEFAULT_PROBE_OPERATION.to_owned(),
            state: Mutex::new(ProbeState::Idle),
        }
    }

    /// Create a probe using the configured operation name.
    pub fn from_config(binding: B, section: &ProbeSection) -> Self {
        Self::new(binding).with_operation_name(section.operation_name.clone())
    }

    /// Override the probe operation name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation = name.into();
        self
    }

    /// The binding under test.
    pub fn binding(&self) -> &B {
        &self.binding
    }

    /// The probe operation name.
    pub fn operation_name(&self) -> &str {
        &self.operation
    }

    /// State after the most recent run.
    pub fn state(&self) -> ProbeState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Definition of the probe operation as offered to the model.
    pub fn definition(&self) -> LlmToolDefinition {
        LlmToolDefinition::new(self.operation.as_str())
            .with_description("Returns a verification token. Takes no arguments.")
    }

    /// Run the probe with a freshly generated token.
    pub async fn probe(&self) -> ProbeReport {
        let token = Uuid::new_v4().to_string();
        self.run(token).await
    }

    /// Run the probe expecting `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::BlankToken`] if `token` is blank. No request is
    /// sent in that case.
    pub async fn probe_with_token(&self, token: &str) -> Result<ProbeReport, ProbeError> {
        if token.trim().is_empty() {
            return Err(ProbeError::BlankToken);
        }
        Ok(self.run(token.to_owned()).await)
    }

    async fn run(&self, token: String) -> ProbeReport {
        let executor: Arc<dyn ToolExecutor> = Arc::new(TokenExecutor {
            operation: self.operation.clone(),
            token: token.clone(),
        });
        let request = AgentRequest::new(
            PROBE_SYSTEM,
            format!(
                "Call the `{}` tool exactly once, then reply with the value it returned.",
                self.operation
            ),
            vec![self.definition()],
            executor,
        );

        self.set_state(ProbeState::Requested);
        debug!(operation = %self.operation, "Capability probe requested");

        let outcome = AssertUnwindSafe(self.binding.run_turn(request))
            .catch_unwind()
            .await;

        let report = match outcome {
            Ok(Ok(turn)) => self.inspect(&turn, token),
            Ok(Err(e)) => {
                warn!(error = %e, "Capability probe request failed");
                failed(token, e.to_string())
            },
            Err(_) => {
                warn!("Capability probe binding panicked");
                failed(token, "agent binding panicked".to_owned())
            },
        };

        self.set_state(report.state);
        info!(
            operation = %self.operation,
            state = ?report.state,
            supported = report.is_supported(),
            "Capability probe finished"
        );
        report
    }

    fn inspect(&self, turn: &AgentTurn, token: String) -> ProbeReport {
        let probe_calls: Vec<_> = turn
            .invocations
            .iter()
            .filter(|inv| inv.name == self.operation)
            .collect();

        let (state, detail) = if probe_calls.is_empty() {
            (ProbeState::NotInvoked, None)
        } else if probe_calls
            .iter()
            .any(|inv| !inv.result.is_error && inv.result.content == token)
        {
            (ProbeState::Matched, None)
        } else {
            let seen = probe_calls
                .iter()
                .map(|inv| inv.result.content.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            (ProbeState::Mismatched, Some(format!("unexpected result: {seen}")))
        };

        ProbeReport {
            state,
            expected_token: token,
            probe_calls: probe_calls.len(),
            detail,
        }
    }

    fn set_state(&self, state: ProbeState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

fn failed(token: String, detail: String) -> ProbeReport {
    ProbeReport {
        state: ProbeState::Error,
        expected_token: token,
        probe_calls: 0,
        detail: Some(detail),
    }
}

impl<B> std::fmt::Debug for CapabilityProbe<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityProbe")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}
