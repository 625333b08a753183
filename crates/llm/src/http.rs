use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, warn};

use riftcoach_core::LlmMetadata;

use crate::config::NarratorConfig;
use crate::error::NarratorError;
use crate::narrator::{Completion, CompletionRequest, Narrator};

/// HTTP narrator speaking an OpenAI-compatible chat completions API.
///
/// JSON mode is requested at the vendor level (`response_format =
/// json_object`); the returned content is additionally parsed here so a
/// vendor that ignores the hint still yields a [`NarratorError::Parse`]
/// the caller can retry on.
#[derive(Debug)]
pub struct HttpNarrator {
    client: reqwest::Client,
    config: NarratorConfig,
}

impl HttpNarrator {
    /// Create a new narrator with the given configuration.
    pub fn new(config: NarratorConfig) -> Result<Self, NarratorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NarratorError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Parse the completion content, stripping markdown code fences if present.
    fn parse_content(content: &str) -> Result<serde_json::Value, NarratorError> {
        let trimmed = content.trim();

        let json_str = if trimmed.starts_with("```") {
            let without_opening = if let Some(rest) = trimmed.strip_prefix("```json") {
                rest
            } else {
                trimmed.strip_prefix("```").unwrap_or(trimmed)
            };
            without_opening
                .strip_suffix("```")
                .unwrap_or(without_opening)
                .trim()
        } else {
            trimmed
        };

        serde_json::from_str(json_str).map_err(|e| {
            NarratorError::Parse(format!(
                "completion is not valid JSON: {e}. Raw content: {content}"
            ))
        })
    }
}

#[async_trait]
impl Narrator for HttpNarrator {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, NarratorError> {
        let request_body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user}
            ]
        });

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "sending narrator request");

        let started = Instant::now();
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NarratorError::Timeout(self.config.timeout_seconds)
                } else {
                    NarratorError::Http(e.to_string())
                }
            })?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "narrator API returned error");
            return Err(NarratorError::Api(format!("HTTP {status}: {body}")));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NarratorError::Parse(format!("failed to parse API response: {e}")))?;

        let content = response_json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                NarratorError::Parse(format!("unexpected response format: {response_json}"))
            })?;

        let usage = response_json.get("usage");
        let metadata = LlmMetadata {
            model_id: response_json
                .get("model")
                .and_then(|m| m.as_str())
                .unwrap_or(&self.config.model)
                .to_owned(),
            prompt_tokens: usage
                .and_then(|u| u.get("prompt_tokens"))
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0),
            completion_tokens: usage
                .and_then(|u| u.get("completion_tokens"))
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0),
            latency_ms,
        };

        Ok(Completion {
            content: Self::parse_content(content)?,
            metadata,
        })
    }
}
