use serde::{Deserialize, Serialize};

/// Lifecycle of a persisted analysis record.
///
/// `Pending` exists only conceptually before the first write (no row yet);
/// the row is created at `Processing`. `Completed`, `CompletedNoDelivery`,
/// and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Enqueued, no worker claim yet. Never written to the store.
    Pending,
    /// Stages 1-3: fetch, score, first persist.
    Processing,
    /// Stage 4: narrative generation.
    Analyzing,
    /// Stage 5: webhook delivery.
    Delivering,
    /// Analysis persisted and the deferred reply was edited.
    Completed,
    /// Analysis persisted but the reply could not be delivered.
    CompletedNoDelivery,
    /// A fatal stage failure; the record keeps the error message.
    Failed,
}

impl AnalysisStatus {
    /// Stable label used in the `status` column and in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Analyzing => "analyzing",
            Self::Delivering => "delivering",
            Self::Completed => "completed",
            Self::CompletedNoDelivery => "completed_no_delivery",
            Self::Failed => "failed",
        }
    }

    /// Parse a stored label back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "analyzing" => Some(Self::Analyzing),
            "delivering" => Some(Self::Delivering),
            "completed" => Some(Self::Completed),
            "completed_no_delivery" => Some(Self::CompletedNoDelivery),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether no further transitions are allowed from this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedNoDelivery | Self::Failed
        )
    }

    /// Whether moving to `next` follows the stage order.
    ///
    /// Forward progress only; `Failed` is reachable from any non-terminal
    /// status. Re-analysis of a terminal row starts over at `Processing`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (s, Self::Failed) if !s.is_terminal() => true,
            (Self::Pending, Self::Processing)
            | (Self::Processing, Self::Analyzing)
            | (Self::Analyzing, Self::Delivering)
            | (Self::Delivering, Self::Completed | Self::CompletedNoDelivery) => true,
            // Terminal rows accept a fresh run.
            (s, Self::Processing) if s.is_terminal() => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
