//! Toolwarden Core - Shared types for the tool execution governance layer.
//!
//! This crate provides:
//! - [`RiskTier`] and [`OperationDescriptor`], the metadata every governed
//!   operation carries
//! - [`InvocationRequest`], a single call to a governed operation
//! - [`ApprovalDecision`], the outcome of a human decision (or of its
//!   cancellation/timeout)
//!
//! It has no dependencies on other internal toolwarden crates.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use toolwarden_core::{InvocationRequest, OperationDescriptor, RiskTier};
//!
//! let descriptor = Arc::new(
//!     OperationDescriptor::new("Workbench", "write_file")
//!         .with_display_name("Write File")
//!         .with_parameters(["path", "content"])
//!         .with_declared_tier(Some(RiskTier::Sensitive)),
//! );
//!
//! let request = InvocationRequest::new(
//!     "workbench",
//!     descriptor,
//!     vec![serde_json::json!("notes.txt"), serde_json::json!("hello")],
//! );
//! assert!(request.describe().contains("Write File"));
//! assert!(request.describe().contains("path = \"notes.txt\""));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod descriptor;
pub mod invocation;

pub use descriptor::{OperationDescriptor, RiskTier};
pub use invocation::{ApprovalDecision, DecisionOrigin, InvocationId, InvocationRequest};
