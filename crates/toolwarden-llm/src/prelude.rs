//! Prelude module - commonly used types for convenient import.
//!
//! Use `use toolwarden_llm::prelude::*;` to import all essential types.

// Errors
pub use crate::{LlmError, LlmResult};

// Provider and agent bindings
pub use crate::{AgentBinding, AgentRequest, AgentTurn, LlmProvider, ProviderBinding, ToolExecutor};

// Probe
pub use crate::{CapabilityProbe, ProbeError, ProbeReport, ProbeState};

// Message and tool types
pub use crate::{LlmResponse, LlmToolDefinition, Message, ToolCall, ToolCallResult};
