//! Test harness utilities.

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Create a temporary directory for a test.
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Install a test-writer subscriber with `filter`. Safe to call repeatedly.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_thread_names(true)
        .with_test_writer()
        .try_init();
}

/// Set up test logging at `warn`.
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}
