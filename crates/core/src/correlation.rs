use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier present in every log line and external call made on
/// behalf of one analysis.
///
/// Rendered as `{session_id}:{branch_id}`. The session id is shared by all
/// work for one request; the branch id distinguishes separate executions of
/// the same request (e.g. a broker redelivery).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationId {
    pub session_id: String,
    pub branch_id: String,
}

impl CorrelationId {
    /// Derive a correlation id for a new execution of the given request.
    #[must_use]
    pub fn for_request(request_id: Uuid) -> Self {
        Self {
            session_id: request_id.simple().to_string(),
            branch_id: short_id(),
        }
    }

    #[must_use]
    pub fn new(session_id: impl Into<String>, branch_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            branch_id: branch_id.into(),
        }
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.session_id, self.branch_id)
    }
}

/// An 8-hex-char id, unique enough to tell branches of a session apart.
fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_owned()
}
