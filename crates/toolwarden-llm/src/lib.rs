//! Toolwarden LLM - Model-facing types and the tool-use capability probe.
//!
//! This crate defines the small slice of the model interface the governance
//! layer needs:
//!
//! - [`LlmProvider`]: a completion-style model client
//! - [`AgentBinding`]: one agent turn with tool execution; [`ProviderBinding`]
//!   adapts any provider
//! - [`CapabilityProbe`]: verifies a binding really calls tools before the
//!   runtime relies on it
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use toolwarden_llm::prelude::*;
//!
//! /// A binding that never calls tools.
//! struct Chatty;
//!
//! #[async_trait]
//! impl AgentBinding for Chatty {
//!     async fn run_turn(&self, _request: AgentRequest) -> LlmResult<AgentTurn> {
//!         Ok(AgentTurn { invocations: vec![], text: Some("Sure!".into()) })
//!     }
//! }
//!
//! # tokio_test_block(async {
//! let report = CapabilityProbe::new(Chatty).probe().await;
//! assert_eq!(report.state, ProbeState::NotInvoked);
//! assert!(!report.is_supported());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod agent;
/// Error types for model interaction.
pub mod error;
pub mod probe;
pub mod provider;
pub mod types;

pub use agent::{AgentBinding, AgentRequest, AgentTurn, EmittedInvocation, ProviderBinding, ToolExecutor};
pub use error::{LlmError, LlmResult};
pub use probe::{CapabilityProbe, ProbeError, ProbeReport, ProbeState};
pub use provider::LlmProvider;
pub use types::{
    LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason, ToolCall,
    ToolCallResult,
};
