use thiserror::Error;

/// Errors from an analysis store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach the backend.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend rejected the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// A value failed to serialize or deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A partial update targeted a row that does not exist.
    #[error("no analysis row for {0}")]
    NotFound(String),
}

impl StoreError {
    /// Whether the persist stage may succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Backend(_))
    }
}
