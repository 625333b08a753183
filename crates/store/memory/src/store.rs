use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use riftcoach_core::{AnalysisRecord, AnalysisStatus, RecordKey};
use riftcoach_store::error::StoreError;
use riftcoach_store::store::{AnalysisStore, UpsertOutcome};

/// In-memory [`AnalysisStore`].
///
/// Suitable for tests and single-node deployments. Entries live for the
/// process lifetime; there is no eviction.
#[derive(Debug, Default)]
pub struct MemoryAnalysisStore {
    rows: DashMap<String, AnalysisRecord>,
}

impl MemoryAnalysisStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn upsert_record(&self, record: &AnalysisRecord) -> Result<UpsertOutcome, StoreError> {
        let rendered = record.key().canonical();

        match self.rows.entry(rendered) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let mut incoming = record.clone();
                // Last write wins per field, except the row's birth time.
                incoming.created_at = occupied.get().created_at;
                incoming.updated_at = Utc::now();
                occupied.insert(incoming);
                Ok(UpsertOutcome::Updated)
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(record.clone());
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn update_status(
        &self,
        key: &RecordKey,
        status: AnalysisStatus,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        let rendered = key.canonical();
        let mut row = self
            .rows
            .get_mut(&rendered)
            .ok_or_else(|| StoreError::NotFound(rendered.clone()))?;

        row.status = status;
        row.error_message = error_message.map(str::to_owned);
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn get_record(&self, key: &RecordKey) -> Result<Option<AnalysisRecord>, StoreError> {
        Ok(self.rows.get(&key.canonical()).map(|r| r.value().clone()))
    }
}
