use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use riftcoach_core::LlmMetadata;

use crate::error::NarratorError;

/// One chat-completion request: a system message and a user message.
///
/// The strict-retry directive is appended by the caller; the client sends
/// exactly what it is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// A copy of this request with the strict-JSON directive appended,
    /// used on the second attempt after a schema violation.
    #[must_use]
    pub fn strict(&self) -> Self {
        Self {
            system: format!(
                "{}\nSTRICT JSON, no prose: respond with exactly one JSON object and nothing else.",
                self.system
            ),
            user: self.user.clone(),
        }
    }
}

/// A completed generation: the parsed JSON object plus call accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: serde_json::Value,
    pub metadata: LlmMetadata,
}

/// Trait for structured-JSON completion vendors.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Generate one JSON completion for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, NarratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_appends_directive_once() {
        let request = CompletionRequest::new("You are a coach.", "score: 78.4");
        let strict = request.strict();
        assert!(strict.system.starts_with("You are a coach."));
        assert!(strict.system.contains("STRICT JSON"));
        assert_eq!(strict.user, request.user);
        // The original is untouched.
        assert!(!request.system.contains("STRICT JSON"));
    }
}
