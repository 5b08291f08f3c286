//! Prelude module - commonly used types for convenient import.
//!
//! Use `use toolwarden_tools::prelude::*;` to import all essential types.

// Errors
pub use crate::{InvocationError, InvocationResult, Rejection, RejectionKind, ToolError, ToolResult};

// Declaring and governing tools
pub use crate::{Arguments, Governed, GovernedTool, OperationRegistry, OperationTable};

// Classification
pub use crate::{Admission, PolicyClassifier};
