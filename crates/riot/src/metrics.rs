use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for vendor API calls.
///
/// Relaxed ordering; call [`snapshot`](Self::snapshot) for a point-in-time
/// view.
#[derive(Debug, Default)]
pub struct FetchMetrics {
    /// Calls issued (every attempt counts).
    pub calls_total: AtomicU64,
    /// Attempts retried after a transient error.
    pub retries_total: AtomicU64,
    /// 429 responses observed.
    pub rate_limited_total: AtomicU64,
}

impl FetchMetrics {
    pub fn increment_calls(&self) {
        self.calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retries(&self) {
        self.retries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of all counters.
    #[must_use]
    pub fn snapshot(&self) -> FetchMetricsSnapshot {
        FetchMetricsSnapshot {
            calls_total: self.calls_total.load(Ordering::Relaxed),
            retries_total: self.retries_total.load(Ordering::Relaxed),
            rate_limited_total: self.rate_limited_total.load(Ordering::Relaxed),
        }
    }
}

/// Frozen view of [`FetchMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchMetricsSnapshot {
    pub calls_total: u64,
    pub retries_total: u64,
    pub rate_limited_total: u64,
}
