use async_trait::async_trait;

use riftcoach_core::{AnalysisRecord, AnalysisStatus, RecordKey};

use crate::error::StoreError;

/// Whether an upsert created a fresh row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Trait for persisting analysis rows.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// At most one row exists per [`RecordKey`]; concurrent upserts resolve to
/// last-write-wins with `created_at` preserved from the first write.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Insert or replace the row for the record's key.
    ///
    /// Idempotent: a uniqueness conflict is an update, never an error.
    /// The existing row's `created_at` is kept; everything else takes the
    /// incoming record's values.
    async fn upsert_record(&self, record: &AnalysisRecord) -> Result<UpsertOutcome, StoreError>;

    /// Partial update for the status machine: set `status`, the optional
    /// error message, and bump `updated_at`.
    async fn update_status(
        &self,
        key: &RecordKey,
        status: AnalysisStatus,
        error_message: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Read the row for a key. Returns `None` if absent.
    async fn get_record(&self, key: &RecordKey) -> Result<Option<AnalysisRecord>, StoreError>;
}
