/// Errors raised by a decision channel while presenting a prompt.
///
/// Any such error resolves the pending invocation as denied.
#[derive(Debug, thiserror::Error)]
pub enum DecisionChannelError {
    /// The receiving side of the channel is gone.
    #[error("decision channel closed")]
    Closed,

    /// The decision thread could not be started.
    #[error("failed to spawn decision thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Channel-specific failure.
    #[error("decision channel failed: {0}")]
    Failed(String),
}

/// Result type for decision channel operations.
pub type DecisionChannelResult<T> = Result<T, DecisionChannelError>;
