//! Toolwarden Test - Shared test utilities.
//!
//! Fixture tools, mock approvers, mock model bindings, and logging helpers
//! used by the integration tests.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolwarden_test::{ForbiddenApprover, Workbench, test_dir};
//! use toolwarden_tools::{Governed, OperationRegistry};
//!
//! let dir = test_dir();
//! let tool = Workbench::new(dir.path()).unwrap();
//! let proxy = Governed::new(tool, &OperationRegistry::new(), Arc::new(ForbiddenApprover)).unwrap();
//! proxy.invoke("read_status", vec![]).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mock_llm;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mock_llm::*;
pub use mocks::*;
