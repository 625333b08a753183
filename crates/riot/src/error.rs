use std::time::Duration;

use thiserror::Error;

/// Errors from the vendor match API.
#[derive(Debug, Error)]
pub enum RiotError {
    /// The match does not exist in the vendor namespace (HTTP 404).
    #[error("match not found: {0}")]
    NotFound(String),

    /// The API key is not allowed to read this resource (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Rate limited and the attempt budget is exhausted.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// A non-retryable API response outside the recognized cases.
    #[error("vendor API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// The call did not complete within the configured deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The client was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl RiotError {
    /// Whether the fetch stage may succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Connection(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Forbidden | Self::Decode(_) | Self::Configuration(_) => false,
        }
    }

    /// Whether the resource is permanently unavailable (fatal to the task).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Forbidden)
    }
}
