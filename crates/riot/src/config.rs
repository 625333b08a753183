use std::time::Duration;

/// Configuration for the vendor match API client.
#[derive(Clone)]
pub struct RiotConfig {
    /// API key sent as `X-API-Token` on every call.
    pub api_key: String,

    /// Base URL override. When unset, the regional endpoint
    /// `https://{region}.api.riotgames.com` is used.
    pub base_url: Option<String>,

    /// Per-call deadline.
    pub timeout: Duration,

    /// Maximum attempts per fetch on transient errors (429/5xx/transport).
    pub max_attempts: u32,

    /// Floor applied to `Retry-After` waits.
    pub min_retry_after: Duration,
}

impl std::fmt::Debug for RiotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiotConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("min_retry_after", &self.min_retry_after)
            .finish()
    }
}

impl RiotConfig {
    /// Create a new configuration with the given API key and the vendor
    /// defaults: 10 s timeout, 3 attempts, 1 s `Retry-After` floor.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            min_retry_after: Duration::from_secs(1),
        }
    }

    /// Override the base URL (used by tests and proxies).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-call deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the transient-error attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the `Retry-After` floor.
    #[must_use]
    pub fn with_min_retry_after(mut self, floor: Duration) -> Self {
        self.min_retry_after = floor;
        self
    }

    /// Resolve the base URL for a region.
    #[must_use]
    pub fn base_url_for(&self, region: &str) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{region}.api.riotgames.com"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RiotConfig::new("RGAPI-test");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.min_retry_after, Duration::from_secs(1));
        assert_eq!(
            config.base_url_for("na1"),
            "https://na1.api.riotgames.com"
        );
    }

    #[test]
    fn base_url_override_wins() {
        let config = RiotConfig::new("k").with_base_url("http://127.0.0.1:9999");
        assert_eq!(config.base_url_for("euw1"), "http://127.0.0.1:9999");
    }

    #[test]
    fn attempts_floor_at_one() {
        let config = RiotConfig::new("k").with_max_attempts(0);
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = RiotConfig::new("RGAPI-secret-value");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("RGAPI-secret-value"));
    }
}
