//! LLM-related error types.

use thiserror::Error;

/// Errors that can occur while talking to a model or agent runtime.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// Invalid response from the model.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// An emitted tool call could not be handed to the executor.
    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
