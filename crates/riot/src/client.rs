use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use riftcoach_core::{MatchDetail, MatchTimeline, RetryStrategy};

use crate::config::RiotConfig;
use crate::error::RiotError;
use crate::metrics::FetchMetrics;
use crate::rate_limit::RegionLimiters;
use crate::source::MatchSource;

/// HTTP client for the vendor match API.
///
/// Serializes against the process-wide [`RegionLimiters`] before every
/// call, waits out `Retry-After` on 429, and backs off exponentially on
/// 5xx. 404 and 403 are permanent and surface immediately.
pub struct RiotClient {
    client: Client,
    config: RiotConfig,
    limiter: Arc<RegionLimiters>,
    backoff: RetryStrategy,
    metrics: Arc<FetchMetrics>,
}

impl RiotClient {
    /// Create a new client with the given configuration and shared limiter.
    pub fn new(config: RiotConfig, limiter: Arc<RegionLimiters>) -> Result<Self, RiotError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RiotError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            config,
            limiter,
            backoff: RetryStrategy::vendor_backoff(),
            metrics: Arc::new(FetchMetrics::default()),
        })
    }

    /// Shared call counters.
    #[must_use]
    pub fn metrics(&self) -> Arc<FetchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The wait prescribed by a 429 response: the vendor's `Retry-After`
    /// seconds, floored at the configured minimum.
    fn retry_after_delay(&self, headers: &reqwest::header::HeaderMap) -> Duration {
        let advertised = headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.config.min_retry_after);
        advertised.max(self.config.min_retry_after)
    }

    /// Verify the vendor platform is reachable for a region.
    ///
    /// One unretried GET against the platform status endpoint; rate-limit
    /// slots are consumed like any other call.
    #[instrument(skip(self), fields(endpoint = "status"))]
    pub async fn health_check(&self, region: &str) -> Result<(), RiotError> {
        self.limiter.acquire(region).await;
        let url = format!("{}/status", self.config.base_url_for(region));

        let response = self
            .client
            .get(&url)
            .header("X-API-Token", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("vendor health check passed");
            return Ok(());
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(RiotError::Forbidden);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RiotError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Issue one GET with the retry policy applied.
    async fn get_json<T: DeserializeOwned>(
        &self,
        region: &str,
        path: &str,
        endpoint: &'static str,
    ) -> Result<T, RiotError> {
        let url = format!("{}{path}", self.config.base_url_for(region));
        let mut attempt = 0u32;

        loop {
            self.limiter.acquire(region).await;
            self.metrics.increment_calls();

            let started = Instant::now();
            let result = self
                .client
                .get(&url)
                .header("X-API-Token", &self.config.api_key)
                .send()
                .await;
            let duration_ms = started.elapsed().as_millis();

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    let err = if e.is_timeout() {
                        RiotError::Timeout(self.config.timeout)
                    } else {
                        RiotError::Connection(e)
                    };
                    debug!(endpoint, status = "transport", duration_ms, "vendor API call");
                    if attempt + 1 < self.config.max_attempts {
                        let delay = self.backoff.delay_for(attempt);
                        warn!(endpoint, attempt, error = %err, delay_ms = %delay.as_millis(), "transport error, will retry");
                        self.metrics.increment_retries();
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            };

            let status = response.status();
            debug!(endpoint, status = status.as_u16(), duration_ms, "vendor API call");

            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(|e| RiotError::Decode(e.to_string()));
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(RiotError::NotFound(path.to_owned()));
            }
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(RiotError::Forbidden);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.metrics.increment_rate_limited();
                let wait = self.retry_after_delay(response.headers());
                if attempt + 1 < self.config.max_attempts {
                    warn!(endpoint, attempt, wait_ms = %wait.as_millis(), "rate limited, honoring Retry-After");
                    self.metrics.increment_retries();
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                    continue;
                }
                return Err(RiotError::RateLimited { retry_after: wait });
            }

            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() && attempt + 1 < self.config.max_attempts {
                let delay = self.backoff.delay_for(attempt);
                warn!(endpoint, attempt, status = status.as_u16(), delay_ms = %delay.as_millis(), "server error, will retry");
                self.metrics.increment_retries();
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(RiotError::Api {
                status: status.as_u16(),
                body,
            });
        }
    }
}

#[async_trait]
impl MatchSource for RiotClient {
    #[instrument(skip(self), fields(endpoint = "match_detail"))]
    async fn get_match_detail(
        &self,
        match_id: &str,
        region: &str,
    ) -> Result<MatchDetail, RiotError> {
        self.get_json(region, &format!("/match/{match_id}"), "match_detail")
            .await
    }

    #[instrument(skip(self), fields(endpoint = "match_timeline"))]
    async fn get_match_timeline(
        &self,
        match_id: &str,
        region: &str,
    ) -> Result<MatchTimeline, RiotError> {
        self.get_json(
            region,
            &format!("/match/{match_id}/timeline"),
            "match_timeline",
        )
        .await
    }
}
