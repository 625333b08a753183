use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking pipeline outcomes.
///
/// Relaxed ordering for throughput; [`snapshot`](Self::snapshot) gives a
/// point-in-time view.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Tasks claimed from the queue.
    pub tasks_started: AtomicU64,
    /// Tasks reaching a completed terminal status.
    pub tasks_completed: AtomicU64,
    /// Tasks reaching `failed`.
    pub tasks_failed: AtomicU64,
    /// Completed tasks that took any degradation path.
    pub tasks_degraded: AtomicU64,
    /// Narrate-stage strict-JSON retries.
    pub llm_schema_retries: AtomicU64,
    /// Narrate-stage template substitutions.
    pub llm_template_degraded: AtomicU64,
    /// Arena narratives rejected by the compliance panel.
    pub compliance_rejections: AtomicU64,
    /// Requests routed to the Fallback strategy.
    pub fallback_selected: AtomicU64,
    /// Deliveries skipped or dropped on an expired token.
    pub deliveries_expired: AtomicU64,
    /// Deliveries that failed transiently (not retried).
    pub deliveries_transient: AtomicU64,
    /// Slash commands rejected at validation.
    pub dispatch_invalid: AtomicU64,
    /// Slash commands dropped because the queue was unavailable.
    pub dispatch_busy: AtomicU64,
}

macro_rules! increment {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl PipelineMetrics {
    increment! {
        increment_tasks_started => tasks_started,
        increment_tasks_completed => tasks_completed,
        increment_tasks_failed => tasks_failed,
        increment_tasks_degraded => tasks_degraded,
        increment_llm_schema_retries => llm_schema_retries,
        increment_llm_template_degraded => llm_template_degraded,
        increment_compliance_rejections => compliance_rejections,
        increment_fallback_selected => fallback_selected,
        increment_deliveries_expired => deliveries_expired,
        increment_deliveries_transient => deliveries_transient,
        increment_dispatch_invalid => dispatch_invalid,
        increment_dispatch_busy => dispatch_busy,
    }

    /// Point-in-time view of all counters.
    #[must_use]
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            tasks_started: self.tasks_started.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_degraded: self.tasks_degraded.load(Ordering::Relaxed),
            llm_schema_retries: self.llm_schema_retries.load(Ordering::Relaxed),
            llm_template_degraded: self.llm_template_degraded.load(Ordering::Relaxed),
            compliance_rejections: self.compliance_rejections.load(Ordering::Relaxed),
            fallback_selected: self.fallback_selected.load(Ordering::Relaxed),
            deliveries_expired: self.deliveries_expired.load(Ordering::Relaxed),
            deliveries_transient: self.deliveries_transient.load(Ordering::Relaxed),
            dispatch_invalid: self.dispatch_invalid.load(Ordering::Relaxed),
            dispatch_busy: self.dispatch_busy.load(Ordering::Relaxed),
        }
    }
}

/// Frozen view of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineMetricsSnapshot {
    pub tasks_started: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub tasks_degraded: u64,
    pub llm_schema_retries: u64,
    pub llm_template_degraded: u64,
    pub compliance_rejections: u64,
    pub fallback_selected: u64,
    pub deliveries_expired: u64,
    pub deliveries_transient: u64,
    pub dispatch_invalid: u64,
    pub dispatch_busy: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = PipelineMetrics::default();
        metrics.increment_tasks_started();
        metrics.increment_tasks_started();
        metrics.increment_tasks_completed();
        metrics.increment_llm_schema_retries();

        let snap = metrics.snapshot();
        assert_eq!(snap.tasks_started, 2);
        assert_eq!(snap.tasks_completed, 1);
        assert_eq!(snap.llm_schema_retries, 1);
        assert_eq!(snap.tasks_failed, 0);
    }
}
