use std::sync::Arc;

use tracing::{debug, warn};

use riftcoach_core::{AnalysisStatus, CorrelationId, RecordKey};
use riftcoach_store::{AnalysisStore, StoreError};

/// Moves a persisted row through the status machine between stages.
///
/// Transitions are single-row updates, atomic at the store, and logged
/// under the task's correlation id. An out-of-order transition is a bug in
/// the orchestrator and is logged loudly but still written: the store is
/// the source of truth for what actually happened.
pub struct StatusTracker {
    store: Arc<dyn AnalysisStore>,
    correlation_id: CorrelationId,
}

impl StatusTracker {
    #[must_use]
    pub fn new(store: Arc<dyn AnalysisStore>, correlation_id: CorrelationId) -> Self {
        Self {
            store,
            correlation_id,
        }
    }

    /// Transition the row to `next`, recording an optional error message.
    pub async fn transition(
        &self,
        key: &RecordKey,
        current: AnalysisStatus,
        next: AnalysisStatus,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        if !current.can_transition_to(next) {
            warn!(
                correlation_id = %self.correlation_id,
                key = %key,
                current = %current,
                next = %next,
                "out-of-order status transition"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            key = %key,
            status = %next,
            "status transition"
        );
        self.store.update_status(key, next, error_message).await
    }
}
