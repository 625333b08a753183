use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use riftcoach_core::LlmMetadata;

use crate::error::NarratorError;
use crate::narrator::{Completion, CompletionRequest, Narrator};

/// A scripted narrator for tests.
///
/// Pops one scripted result per call and records every request so tests
/// can assert on the strict-retry prompt.
#[derive(Debug, Default)]
pub struct MockNarrator {
    script: Mutex<VecDeque<Result<serde_json::Value, NarratorError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockNarrator {
    /// A mock that always returns the same content.
    #[must_use]
    pub fn returning(content: serde_json::Value) -> Self {
        let mock = Self::default();
        mock.push_ok(content);
        mock
    }

    /// Queue a successful completion.
    pub fn push_ok(&self, content: serde_json::Value) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Ok(content));
    }

    /// Queue a failure.
    pub fn push_err(&self, error: NarratorError) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Err(error));
    }

    /// Requests seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    /// Number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock poisoned").len()
    }

    fn mock_metadata() -> LlmMetadata {
        LlmMetadata {
            model_id: "mock".into(),
            prompt_tokens: 100,
            completion_tokens: 50,
            latency_ms: 1,
        }
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, NarratorError> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request.clone());

        let next = self
            .script
            .lock()
            .expect("script lock poisoned")
            .pop_front();

        match next {
            Some(Ok(content)) => Ok(Completion {
                content,
                metadata: Self::mock_metadata(),
            }),
            Some(Err(err)) => Err(err),
            // An exhausted script repeats the last behavior conservatively:
            // fail loudly so tests notice unexpected extra calls.
            None => Err(NarratorError::Api("mock script exhausted".into())),
        }
    }
}

/// A narrator that always fails with the same error message.
#[derive(Debug)]
pub struct FailingNarrator {
    message: String,
}

impl FailingNarrator {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Narrator for FailingNarrator {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, NarratorError> {
        Err(NarratorError::Api(self.message.clone()))
    }
}
