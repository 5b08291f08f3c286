//! Toolwarden Tools - Governed tool operations.
//!
//! Tools declare their agent-callable operations through [`GovernedTool`].
//! The [`OperationRegistry`] turns declarations into cached descriptors, the
//! [`PolicyClassifier`] resolves each operation's risk tier, and
//! [`Governed`] routes every invocation through tier-based admission before
//! it reaches the tool.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::Value;
//! use toolwarden_approval::ApprovalGateway;
//! use toolwarden_core::RiskTier;
//! use toolwarden_tools::prelude::*;
//!
//! struct Shell;
//!
//! impl GovernedTool for Shell {
//!     fn tool_name(&self) -> &str {
//!         "shell"
//!     }
//!
//!     fn declare(ops: &mut OperationTable<Self>) {
//!         ops.declare("pwd", |_: &Shell, _| Ok(Value::from("/work"))).tier(RiskTier::Safe);
//!         ops.declare("rm", |_: &Shell, _| Ok(Value::Null)).params(["path"]);
//!     }
//! }
//!
//! // A gateway without a decision channel denies everything gated.
//! let gateway = Arc::new(ApprovalGateway::new());
//! let shell = Governed::new(Shell, &OperationRegistry::new(), gateway).unwrap();
//!
//! assert_eq!(shell.invoke("pwd", vec![]).unwrap(), Value::from("/work"));
//!
//! let err = shell.invoke("rm", vec![Value::from("/")]).unwrap_err();
//! assert!(err.is_rejected());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

/// Error types for governed invocations.
pub mod error;
pub mod policy;
pub mod proxy;
pub mod registry;

pub use error::{InvocationError, InvocationResult, Rejection, RejectionKind, ToolError, ToolResult};
pub use policy::{Admission, PolicyClassifier};
pub use proxy::Governed;
pub use registry::{Arguments, GovernedTool, Handler, OperationDecl, OperationRegistry, OperationTable};
