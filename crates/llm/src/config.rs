/// Configuration for the HTTP narrator.
#[derive(Clone)]
pub struct NarratorConfig {
    /// OpenAI-compatible API endpoint (e.g. `https://api.openai.com/v1/chat/completions`).
    pub endpoint: String,
    /// Model to use.
    pub model: String,
    /// API key for authentication.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
}

impl std::fmt::Debug for NarratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarratorConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl NarratorConfig {
    /// Create a new config with the given endpoint, model, and API key.
    ///
    /// Defaults: 30 s timeout, temperature 0.7, max 1024 tokens.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout_seconds: 30,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum tokens in the response.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
