/// Error types for feed-client
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Post not found: {0}")]
    NotFound(Uuid),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend timed out after {0}ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether retrying the same backend call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Backend(_) | ClientError::Timeout(_))
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
