/// Errors from accessor operations.
///
/// Reads, writes, and subscriptions are infallible; only rendering an
/// accessor's value to text can fail.
#[derive(Debug, thiserror::Error)]
pub enum AccessorError {
    /// The current value could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for accessor operations.
pub type AccessorResult<T> = Result<T, AccessorError>;
