use thiserror::Error;

/// Errors from a scorer.
///
/// All of these indicate a contract violation between internal components,
/// never bad user input: the bundle was validated before scoring.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The requester does not appear in the match's participant list.
    #[error("requester {0} is not a participant of this match")]
    RequesterNotFound(String),

    /// A formula produced a non-finite or out-of-range value.
    #[error("score dimension out of bounds: {0}")]
    Numeric(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ScoreError::RequesterNotFound("u#1".into());
        assert_eq!(
            err.to_string(),
            "requester u#1 is not a participant of this match"
        );
    }
}
