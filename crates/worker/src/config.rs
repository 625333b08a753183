use serde::Deserialize;

use riftcoach_core::PipelineConfig;

/// Worker process configuration, loaded from TOML.
///
/// The pipeline keys (`worker_concurrency`, `stage_timeout.*`, `retry.*`,
/// `llm.*`, `rate_limit.*`, `degradation.*`, `feature.*`,
/// `interaction_token_ttl_seconds`) sit at the top level. Secrets are
/// never read from this file: `RIOT_API_TOKEN`, `LLM_API_KEY`, and
/// `DATABASE_URL` come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    #[serde(flatten)]
    pub pipeline: PipelineConfig,

    /// Capacity of the in-process task queue.
    pub queue_capacity: Option<usize>,

    /// OpenAI-compatible chat-completions endpoint.
    pub llm_endpoint: Option<String>,

    /// Chat platform API base.
    pub discord_api_base: Option<String>,
}

impl WorkerSettings {
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(256)
    }

    #[must_use]
    pub fn llm_endpoint(&self) -> &str {
        self.llm_endpoint
            .as_deref()
            .unwrap_or("https://api.openai.com/v1/chat/completions")
    }
}
