use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

/// Per-stage deadlines. A stage that exceeds its deadline has that attempt
/// counted against its retry budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StageTimeouts {
    /// Per-call deadline for the vendor fetch, in seconds.
    pub fetch_secs: u64,
    /// CPU budget for scoring, in milliseconds.
    pub score_ms: u64,
    /// Store write deadline, in seconds.
    pub persist_secs: u64,
    /// LLM completion deadline, in seconds.
    pub narrate_secs: u64,
    /// Webhook edit deadline, in seconds.
    pub deliver_secs: u64,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            fetch_secs: 10,
            score_ms: 200,
            persist_secs: 2,
            narrate_secs: 30,
            deliver_secs: 5,
        }
    }
}

impl StageTimeouts {
    #[must_use]
    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }

    #[must_use]
    pub fn score(&self) -> Duration {
        Duration::from_millis(self.score_ms)
    }

    #[must_use]
    pub fn persist(&self) -> Duration {
        Duration::from_secs(self.persist_secs)
    }

    #[must_use]
    pub fn narrate(&self) -> Duration {
        Duration::from_secs(self.narrate_secs)
    }

    #[must_use]
    pub fn deliver(&self) -> Duration {
        Duration::from_secs(self.deliver_secs)
    }
}

/// Retry budgets for the stages that retry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryBudgets {
    /// Maximum fetch attempts on transient vendor errors.
    pub fetch_max_attempts: u32,
    /// Maximum persist attempts on transient store errors.
    pub persist_max_attempts: u32,
}

impl Default for RetryBudgets {
    fn default() -> Self {
        Self {
            fetch_max_attempts: 3,
            persist_max_attempts: 2,
        }
    }
}

/// Narrator tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model_id: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model_id: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_output_tokens: 1024,
        }
    }
}

/// Token-bucket sizes for one vendor region.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegionLimit {
    /// Requests allowed per short window.
    pub short_limit: u32,
    /// Short window length in seconds.
    pub short_window_secs: u64,
    /// Requests allowed per long window.
    pub long_limit: u32,
    /// Long window length in seconds.
    pub long_window_secs: u64,
}

impl Default for RegionLimit {
    fn default() -> Self {
        // Vendor development-tier published limits.
        Self {
            short_limit: 20,
            short_window_secs: 1,
            long_limit: 100,
            long_window_secs: 120,
        }
    }
}

/// Rate-limit table keyed by region, with a default for unlisted regions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub regions: HashMap<String, RegionLimit>,
}

impl RateLimitSettings {
    /// The limit for a region, falling back to the vendor default.
    #[must_use]
    pub fn for_region(&self, region: &str) -> RegionLimit {
        self.regions.get(region).cloned().unwrap_or_default()
    }
}

/// Degradation controls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    /// Allow the narrate stage to fall back to a template narrative.
    pub template_enabled: bool,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            template_enabled: true,
        }
    }
}

/// Strategy gating.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub arena_enabled: bool,
    pub blind_mode_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            arena_enabled: true,
            blind_mode_enabled: true,
        }
    }
}

/// The full recognized configuration surface of the pipeline.
///
/// Loaded from TOML by the worker; secrets (API keys, store URL) come from
/// the environment, never from this struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent tasks per worker process.
    pub worker_concurrency: Option<usize>,

    pub stage_timeout: StageTimeouts,
    pub retry: RetryBudgets,
    pub llm: LlmSettings,
    pub rate_limit: RateLimitSettings,
    pub degradation: DegradationConfig,
    pub feature: FeatureFlags,

    /// Hard deadline for the deliver stage, measured from request receipt.
    pub interaction_token_ttl_seconds: Option<u64>,
}

impl PipelineConfig {
    #[must_use]
    pub fn worker_concurrency(&self) -> usize {
        self.worker_concurrency.unwrap_or(4)
    }

    #[must_use]
    pub fn interaction_token_ttl_seconds(&self) -> u64 {
        self.interaction_token_ttl_seconds.unwrap_or(900)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stage_table() {
        let config = PipelineConfig::default();
        assert_eq!(config.stage_timeout.fetch(), Duration::from_secs(10));
        assert_eq!(config.stage_timeout.score(), Duration::from_millis(200));
        assert_eq!(config.stage_timeout.persist(), Duration::from_secs(2));
        assert_eq!(config.stage_timeout.narrate(), Duration::from_secs(30));
        assert_eq!(config.stage_timeout.deliver(), Duration::from_secs(5));
        assert_eq!(config.retry.fetch_max_attempts, 3);
        assert_eq!(config.retry.persist_max_attempts, 2);
        assert_eq!(config.worker_concurrency(), 4);
        assert_eq!(config.interaction_token_ttl_seconds(), 900);
        assert!(config.degradation.template_enabled);
        assert!(config.feature.arena_enabled);
    }

    #[test]
    fn region_limit_fallback() {
        let settings = RateLimitSettings::default();
        let limit = settings.for_region("euw1");
        assert_eq!(limit.short_limit, 20);
        assert_eq!(limit.long_limit, 100);
    }

    #[test]
    fn partial_deserialization_fills_defaults() {
        let parsed: PipelineConfig = serde_json::from_str(
            r#"{
                "worker_concurrency": 8,
                "stage_timeout": {"narrate_secs": 45},
                "feature": {"arena_enabled": false}
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.worker_concurrency(), 8);
        assert_eq!(parsed.stage_timeout.narrate(), Duration::from_secs(45));
        // Unlisted fields keep defaults.
        assert_eq!(parsed.stage_timeout.fetch(), Duration::from_secs(10));
        assert!(!parsed.feature.arena_enabled);
        assert!(parsed.feature.blind_mode_enabled);
    }

    #[test]
    fn region_table_overrides() {
        let parsed: RateLimitSettings = serde_json::from_str(
            r#"{"regions": {"kr": {"short_limit": 500, "short_window_secs": 10,
                                    "long_limit": 30000, "long_window_secs": 600}}}"#,
        )
        .unwrap();
        assert_eq!(parsed.for_region("kr").short_limit, 500);
        assert_eq!(parsed.for_region("na1").short_limit, 20);
    }
}
