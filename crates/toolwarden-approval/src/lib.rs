//! Toolwarden Approval - Human-in-the-loop gate for risky tool invocations.
//!
//! The [`ApprovalGateway`] blocks the calling worker thread until a human
//! decision, delivered from any other thread, settles the invocation. Every
//! path that is not an explicit approval ends in denial: no channel, a
//! failing or panicking channel, cancellation, and timeout.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use toolwarden_approval::{ApprovalGateway, Approver, PromptQueue};
//! use toolwarden_core::{InvocationRequest, OperationDescriptor, RiskTier};
//!
//! let (queue, mut prompts) = PromptQueue::new();
//! let gateway = ApprovalGateway::new().with_channel(Arc::new(queue));
//!
//! // A UI thread answers prompts as they arrive.
//! let ui = thread::spawn(move || {
//!     let prompt = prompts.recv_blocking().unwrap();
//!     prompt.deny("not today");
//! });
//!
//! let descriptor = OperationDescriptor::new("Workbench", "delete_file")
//!     .with_parameters(["path"])
//!     .with_tier(RiskTier::Sensitive);
//! let request = InvocationRequest::new(
//!     "workbench",
//!     Arc::new(descriptor),
//!     vec![serde_json::json!("Cargo.lock")],
//! );
//!
//! let decision = gateway.submit(request);
//! ui.join().unwrap();
//! assert!(!decision.is_approved());
//! assert_eq!(decision.reason.as_deref(), Some("not today"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod channel;
/// Error types for decision channels.
pub mod error;
pub mod gateway;
pub mod pending;

pub use channel::{ApprovalPrompt, DecisionChannel, FnDecision, PromptQueue, PromptReceiver, Resolver};
pub use error::{DecisionChannelError, DecisionChannelResult};
pub use gateway::{ApprovalGateway, Approver, DEFAULT_TIMEOUT};
pub use pending::{ApprovalState, PendingApproval};
