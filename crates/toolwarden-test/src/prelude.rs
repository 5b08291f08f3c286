//! Prelude module - commonly used test utilities.
//!
//! Use `use toolwarden_test::prelude::*;` in tests.

pub use crate::{
    CallLog, ForbiddenApprover, MisdeclaredTool, MockLlmProvider, MockLlmTurn, RecordingListener,
    ScriptedApprover, StubBehavior, StubBinding, Workbench, setup_test_logging,
    setup_test_logging_default, test_dir,
};
