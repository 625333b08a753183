use thiserror::Error;

/// Violations of the vendor invariants checked on a fetched match bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The participant list is not a recognized size (2, 5, or 10).
    #[error("unexpected participant count: {0}")]
    ParticipantCount(usize),

    /// A timeline frame went backwards in time.
    #[error("timeline frame at minute {minute} precedes minute {previous}")]
    NonMonotonicTimeline { minute: u32, previous: u32 },
}
