use std::time::Duration;

/// Configuration for the deferred-interaction client.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Chat platform API base (e.g. `https://discord.com/api/v10`).
    pub api_base: String,

    /// Deadline for the single PATCH.
    pub timeout: Duration,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: "https://discord.com/api/v10".into(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl DiscordConfig {
    /// Create a config with a custom API base (used by tests and proxies).
    pub fn with_api_base(base: impl Into<String>) -> Self {
        Self {
            api_base: base.into(),
            ..Self::default()
        }
    }

    /// Set the PATCH deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
