use thiserror::Error;

/// Errors from the narrator client.
#[derive(Debug, Error)]
pub enum NarratorError {
    /// The client was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An HTTP transport error occurred.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The call did not complete within the allowed duration.
    #[error("timeout after {0}s")]
    Timeout(u64),

    /// The vendor returned a non-success status.
    #[error("API error: {0}")]
    Api(String),

    /// The response was not the JSON object the contract requires.
    #[error("parse error: {0}")]
    Parse(String),
}

impl NarratorError {
    /// Whether this failure is the model's output being malformed, which
    /// warrants one strict-JSON retry before degrading to a template.
    #[must_use]
    pub fn is_malformed_output(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
