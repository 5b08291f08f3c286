//! Shared harness for integration tests.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use toolwarden_approval::{ApprovalGateway, PromptQueue, PromptReceiver};
use toolwarden_test::{CallLog, Workbench, setup_test_logging_default, test_dir};
use toolwarden_tools::{Governed, OperationRegistry};

/// A governed workbench wired to a gateway whose prompts land in a queue.
///
/// The test plays the UI thread by pulling prompts from `prompts`.
#[allow(dead_code)]
pub struct GatedWorkbench {
    /// The governed tool.
    pub tool: Arc<Governed<Workbench>>,
    /// The gateway the tool submits to.
    pub gateway: Arc<ApprovalGateway>,
    /// Prompts waiting for a human.
    pub prompts: PromptReceiver,
    /// Execution counts of the wrapped workbench.
    pub calls: Arc<CallLog>,
    /// Workbench root (held to prevent cleanup).
    pub dir: TempDir,
}

#[allow(dead_code)]
impl GatedWorkbench {
    /// Build with the default approval timeout.
    pub fn new() -> Self {
        Self::with_timeout(Some(Duration::from_secs(30)))
    }

    /// Build with an explicit approval timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        setup_test_logging_default();
        let dir = test_dir();
        let (queue, prompts) = PromptQueue::new();
        let gateway = Arc::new(
            ApprovalGateway::new()
                .with_channel(Arc::new(queue))
                .with_timeout(timeout),
        );
        let workbench = Workbench::new(dir.path()).expect("workbench root exists");
        let calls = workbench.calls();
        let tool = Governed::new(workbench, &OperationRegistry::new(), gateway.clone())
            .expect("workbench declarations are valid");
        Self {
            tool: Arc::new(tool),
            gateway,
            prompts,
            calls,
            dir,
        }
    }
}

/// Arguments for `write_file`.
#[allow(dead_code)]
pub fn write_args(path: &str, content: &str) -> Vec<serde_json::Value> {
    vec![serde_json::json!(path), serde_json::json!(content)]
}
