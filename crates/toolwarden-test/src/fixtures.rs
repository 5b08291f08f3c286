//! Fixture tools.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use toolwarden_core::RiskTier;
use toolwarden_events::ProgressChannel;
use toolwarden_tools::{Arguments, GovernedTool, OperationTable, ToolError, ToolResult};

/// Execution counts per operation, shared with the test after the tool is
/// moved into a proxy.
#[derive(Debug, Default)]
pub struct CallLog {
    counts: Mutex<HashMap<String, usize>>,
}

impl CallLog {
    /// How many times `operation` actually executed.
    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        self.lock().get(operation).copied().unwrap_or(0)
    }

    /// Total executions across all operations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.lock().values().sum()
    }

    fn record(&self, operation: &str) {
        let mut counts = self.lock();
        let count = counts.entry(operation.to_owned()).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A small workspace tool with one operation per risk tier.
///
/// | Operation | Parameters | Tier |
/// |---|---|---|
/// | `read_status` | - | `Safe` |
/// | `ask_user` | `question` | `Interactive` |
/// | `write_file` | `path`, `content` | `Sensitive` |
/// | `run_build` | - | unannotated (`Unknown`) |
///
/// Every handler counts its executions so tests can assert that a rejected
/// call never ran.
#[derive(Debug)]
pub struct Workbench {
    name: String,
    root: PathBuf,
    progress: ProgressChannel,
    calls: Arc<CallLog>,
}

impl Workbench {
    /// Create a workbench rooted at an existing directory.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Configuration`] if `root` is not a directory.
    pub fn new(root: impl AsRef<Path>) -> ToolResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ToolError::Configuration(format!(
                "workbench root '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            name: "workbench".to_owned(),
            root: root.to_path_buf(),
            progress: ProgressChannel::new("workbench"),
            calls: Arc::new(CallLog::default()),
        })
    }

    /// Shared execution counts.
    #[must_use]
    pub fn calls(&self) -> Arc<CallLog> {
        Arc::clone(&self.calls)
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record(&self, operation: &str) {
        self.calls.record(operation);
    }

    fn read_status(&self, _args: Arguments) -> ToolResult {
        self.record("read_status");
        let entries = std::fs::read_dir(&self.root)?.count();
        Ok(Value::from(format!("{entries} entries")))
    }

    fn ask_user(&self, args: Arguments) -> ToolResult {
        self.record("ask_user");
        let question = args.str("question")?;
        Ok(Value::from(format!("user answered: {question}")))
    }

    fn write_file(&self, args: Arguments) -> ToolResult {
        self.record("write_file");
        let path = args.str("path")?;
        let content = args.str("content")?;
        std::fs::write(self.root.join(path), content)?;
        Ok(Value::from(content.len()))
    }

    fn run_build(&self, _args: Arguments) -> ToolResult {
        self.record("run_build");
        self.progress.publish("build started");
        self.progress.publish("build finished");
        Ok(Value::from("ok"))
    }
}

impl GovernedTool for Workbench {
    fn tool_name(&self) -> &str {
        &self.name
    }

    fn declare(ops: &mut OperationTable<Self>) {
        ops.declare("read_status", Self::read_status)
            .display_name("Read Status")
            .tier(RiskTier::Safe);
        ops.declare("ask_user", Self::ask_user)
            .display_name("Ask User")
            .params(["question"])
            .tier(RiskTier::Interactive);
        ops.declare("write_file", Self::write_file)
            .display_name("Write File")
            .params(["path", "content"])
            .tier(RiskTier::Sensitive);
        ops.declare("run_build", Self::run_build).display_name("Run Build");
    }

    fn progress(&self) -> Option<&ProgressChannel> {
        Some(&self.progress)
    }
}

/// A tool whose declarations are invalid (duplicate operation name).
#[derive(Debug, Default)]
pub struct MisdeclaredTool;

impl GovernedTool for MisdeclaredTool {
    fn tool_name(&self) -> &str {
        "misdeclared"
    }

    fn declare(ops: &mut OperationTable<Self>) {
        ops.declare("sync", |_: &Self, _| Ok(Value::Null))
            .tier(RiskTier::Safe);
        ops.declare("sync", |_: &Self, _| Ok(Value::Null))
            .tier(RiskTier::Sensitive);
    }
}
