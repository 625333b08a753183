use thiserror::Error;

/// Errors constructing the delivery client.
///
/// Runtime delivery failures are not errors: they map onto
/// [`DeliveryOutcome`](crate::DeliveryOutcome) so the caller always gets a
/// classified result from the single PATCH.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// The client was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The platform API could not be reached during a health check.
    #[error("chat API unreachable: {0}")]
    Unreachable(String),
}
