use riftcoach_core::{AnalysisRecord, AnalysisStatus, RecordKey};

use crate::error::StoreError;
use crate::store::{AnalysisStore, UpsertOutcome};

fn test_record(match_id: &str, requester: &str) -> AnalysisRecord {
    AnalysisRecord::processing(
        &RecordKey::new(match_id, requester),
        "classic",
        "v1",
        serde_json::json!({"player_scores": [], "requester_score": null}),
    )
}

/// Run the full analysis-store conformance suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn AnalysisStore) -> Result<(), StoreError> {
    test_get_missing(store).await?;
    test_upsert_then_get(store).await?;
    test_upsert_twice_preserves_created_at(store).await?;
    test_update_status(store).await?;
    test_update_status_missing_row(store).await?;
    test_json_roundtrip(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn AnalysisStore) -> Result<(), StoreError> {
    let key = RecordKey::new("CONF_missing", "u1");
    let row = store.get_record(&key).await?;
    assert!(row.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_upsert_then_get(store: &dyn AnalysisStore) -> Result<(), StoreError> {
    let record = test_record("CONF_upsert", "u1");
    let outcome = store.upsert_record(&record).await?;
    assert_eq!(outcome, UpsertOutcome::Created);

    let row = store.get_record(&record.key()).await?.expect("row exists");
    assert_eq!(row.status, AnalysisStatus::Processing);
    assert_eq!(row.mode, "classic");
    Ok(())
}

async fn test_upsert_twice_preserves_created_at(
    store: &dyn AnalysisStore,
) -> Result<(), StoreError> {
    let first = test_record("CONF_rewrite", "u1");
    store.upsert_record(&first).await?;
    let original = store.get_record(&first.key()).await?.expect("row exists");

    let mut second = test_record("CONF_rewrite", "u1");
    second.narrative_text = Some("revised".into());
    let outcome = store.upsert_record(&second).await?;
    assert_eq!(outcome, UpsertOutcome::Updated);

    let row = store.get_record(&first.key()).await?.expect("row exists");
    assert_eq!(row.narrative_text.as_deref(), Some("revised"));
    assert_eq!(
        row.created_at, original.created_at,
        "re-analysis must preserve created_at"
    );
    assert!(row.updated_at >= original.updated_at);
    Ok(())
}

async fn test_update_status(store: &dyn AnalysisStore) -> Result<(), StoreError> {
    let record = test_record("CONF_status", "u1");
    store.upsert_record(&record).await?;

    store
        .update_status(&record.key(), AnalysisStatus::Analyzing, None)
        .await?;
    let row = store.get_record(&record.key()).await?.expect("row exists");
    assert_eq!(row.status, AnalysisStatus::Analyzing);
    assert!(row.error_message.is_none());

    store
        .update_status(&record.key(), AnalysisStatus::Failed, Some("vendor 404"))
        .await?;
    let row = store.get_record(&record.key()).await?.expect("row exists");
    assert_eq!(row.status, AnalysisStatus::Failed);
    assert_eq!(row.error_message.as_deref(), Some("vendor 404"));
    Ok(())
}

async fn test_update_status_missing_row(store: &dyn AnalysisStore) -> Result<(), StoreError> {
    let key = RecordKey::new("CONF_nope", "u1");
    let result = store
        .update_status(&key, AnalysisStatus::Completed, None)
        .await;
    assert!(
        matches!(result, Err(StoreError::NotFound(_))),
        "status update without a row should be NotFound"
    );
    Ok(())
}

async fn test_json_roundtrip(store: &dyn AnalysisStore) -> Result<(), StoreError> {
    let mut record = test_record("CONF_json", "u1");
    record.score_data = serde_json::json!({
        "player_scores": [{"participant_id": 1, "overall": 78.4}],
        "requester_score": {"participant_id": 1, "overall": 78.4}
    });
    store.upsert_record(&record).await?;

    let row = store.get_record(&record.key()).await?.expect("row exists");
    assert_eq!(
        row.score_data, record.score_data,
        "JSON columns must round-trip structurally"
    );
    Ok(())
}
