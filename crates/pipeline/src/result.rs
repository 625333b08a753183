use std::collections::HashMap;

use riftcoach_core::{CorrelationId, DegradationFlags};
use uuid::Uuid;

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Score,
    Persist,
    Narrate,
    Deliver,
}

impl Stage {
    /// Stable label used in logs and duration maps.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Score => "score",
            Self::Persist => "persist",
            Self::Narrate => "narrate",
            Self::Deliver => "deliver",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one task execution, returned to the worker.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub request_id: Uuid,
    pub correlation_id: CorrelationId,

    /// Whether an analysis row reached a completed terminal status.
    pub success: bool,

    /// The stage that failed, when `success` is false.
    pub error_stage: Option<Stage>,
    pub error_message: Option<String>,

    /// Whether the failure was a contract violation between internal
    /// components; the worker surfaces these to the broker's dead-letter
    /// policy.
    pub programming_error: bool,

    pub degradation: DegradationFlags,

    /// Whether the deferred reply was actually edited.
    pub delivered: bool,

    /// Wall-clock duration per executed stage.
    pub stage_durations_ms: HashMap<&'static str, u64>,
}

impl TaskResult {
    pub(crate) fn started(request_id: Uuid, correlation_id: CorrelationId) -> Self {
        Self {
            request_id,
            correlation_id,
            success: false,
            error_stage: None,
            error_message: None,
            programming_error: false,
            degradation: DegradationFlags::default(),
            delivered: false,
            stage_durations_ms: HashMap::new(),
        }
    }

    pub(crate) fn record_duration(&mut self, stage: Stage, duration: std::time::Duration) {
        self.stage_durations_ms.insert(
            stage.as_str(),
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        );
    }
}
