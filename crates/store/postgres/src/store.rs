use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use riftcoach_core::report::{DegradationFlags, EmotionTag, LlmMetadata};
use riftcoach_core::{AnalysisRecord, AnalysisStatus, RecordKey};
use riftcoach_store::error::StoreError;
use riftcoach_store::store::{AnalysisStore, UpsertOutcome};

use crate::config::PostgresConfig;
use crate::migrations;

/// PostgreSQL-backed implementation of [`AnalysisStore`].
///
/// Uses `sqlx::PgPool` for connection pooling. Upserts go through
/// `INSERT … ON CONFLICT (match_id, requester_id) DO UPDATE`, which makes
/// uniqueness conflicts updates by construction and preserves the first
/// writer's `created_at`.
pub struct PostgresAnalysisStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresAnalysisStore {
    /// Connect, build the pool, and run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if pool creation fails, or
    /// [`StoreError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::from_pool(pool, config).await
    }

    /// Create a store from an existing pool. Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, StoreError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool, config })
    }

    fn row_to_record(row: &PgRow) -> Result<AnalysisRecord, StoreError> {
        let status_text: String = row
            .try_get("status")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let status = AnalysisStatus::parse(&status_text)
            .ok_or_else(|| StoreError::Serialization(format!("unknown status: {status_text}")))?;

        let emotion_text: Option<String> = row
            .try_get("emotion_tag")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let emotion_tag = match emotion_text {
            Some(text) => Some(EmotionTag::parse(&text).ok_or_else(|| {
                StoreError::Serialization(format!("unknown emotion tag: {text}"))
            })?),
            None => None,
        };

        let llm_metadata: Option<serde_json::Value> = row
            .try_get("llm_metadata")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let llm_metadata = match llm_metadata {
            Some(value) => Some(
                serde_json::from_value::<LlmMetadata>(value)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            ),
            None => None,
        };

        let degradation_value: serde_json::Value = row
            .try_get("degradation_flags")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let degradation_flags: DegradationFlags = serde_json::from_value(degradation_value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let get_text = |name: &str| -> Result<String, StoreError> {
            row.try_get(name)
                .map_err(|e| StoreError::Backend(e.to_string()))
        };
        let get_opt_text = |name: &str| -> Result<Option<String>, StoreError> {
            row.try_get(name)
                .map_err(|e| StoreError::Backend(e.to_string()))
        };
        let get_time = |name: &str| -> Result<DateTime<Utc>, StoreError> {
            row.try_get(name)
                .map_err(|e| StoreError::Backend(e.to_string()))
        };

        Ok(AnalysisRecord {
            match_id: get_text("match_id")?,
            requester_id: get_text("requester_id")?,
            status,
            mode: get_text("mode")?,
            algorithm_version: get_text("algorithm_version")?,
            score_data: row
                .try_get("score_data")
                .map_err(|e| StoreError::Backend(e.to_string()))?,
            narrative_text: get_opt_text("narrative_text")?,
            tts_summary: get_opt_text("tts_summary")?,
            emotion_tag,
            llm_metadata,
            degradation_flags,
            error_message: get_opt_text("error_message")?,
            created_at: get_time("created_at")?,
            updated_at: get_time("updated_at")?,
        })
    }
}

#[async_trait]
impl AnalysisStore for PostgresAnalysisStore {
    async fn upsert_record(&self, record: &AnalysisRecord) -> Result<UpsertOutcome, StoreError> {
        let table = self.config.analysis_table();

        let llm_metadata = record
            .llm_metadata
            .as_ref()
            .map(|m| serde_json::to_value(m).map_err(|e| StoreError::Serialization(e.to_string())))
            .transpose()?;
        let degradation_flags = serde_json::to_value(record.degradation_flags)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // xmax = 0 distinguishes a fresh insert from a conflict update.
        let query = format!(
            "INSERT INTO {table} (match_id, requester_id, status, mode, algorithm_version, \
                                  score_data, narrative_text, tts_summary, emotion_tag, \
                                  llm_metadata, degradation_flags, error_message, \
                                  created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (match_id, requester_id) DO UPDATE SET \
                 status = EXCLUDED.status, \
                 mode = EXCLUDED.mode, \
                 algorithm_version = EXCLUDED.algorithm_version, \
                 score_data = EXCLUDED.score_data, \
                 narrative_text = EXCLUDED.narrative_text, \
                 tts_summary = EXCLUDED.tts_summary, \
                 emotion_tag = EXCLUDED.emotion_tag, \
                 llm_metadata = EXCLUDED.llm_metadata, \
                 degradation_flags = EXCLUDED.degradation_flags, \
                 error_message = EXCLUDED.error_message, \
                 updated_at = NOW() \
             RETURNING (xmax = 0) AS inserted"
        );

        let row = sqlx::query(&query)
            .bind(&record.match_id)
            .bind(&record.requester_id)
            .bind(record.status.as_str())
            .bind(&record.mode)
            .bind(&record.algorithm_version)
            .bind(&record.score_data)
            .bind(&record.narrative_text)
            .bind(&record.tts_summary)
            .bind(record.emotion_tag.map(EmotionTag::as_str))
            .bind(llm_metadata)
            .bind(degradation_flags)
            .bind(&record.error_message)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let inserted: bool = row
            .try_get("inserted")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn update_status(
        &self,
        key: &RecordKey,
        status: AnalysisStatus,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        let table = self.config.analysis_table();

        let query = format!(
            "UPDATE {table} SET status = $3, error_message = $4, updated_at = NOW() \
             WHERE match_id = $1 AND requester_id = $2"
        );

        let result = sqlx::query(&query)
            .bind(&key.match_id)
            .bind(&key.requester_id)
            .bind(status.as_str())
            .bind(error_message)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(key.canonical()));
        }
        Ok(())
    }

    async fn get_record(&self, key: &RecordKey) -> Result<Option<AnalysisRecord>, StoreError> {
        let table = self.config.analysis_table();

        let query = format!(
            "SELECT match_id, requester_id, status, mode, algorithm_version, score_data, \
                    narrative_text, tts_summary, emotion_tag, llm_metadata, degradation_flags, \
                    error_message, created_at, updated_at \
             FROM {table} WHERE match_id = $1 AND requester_id = $2"
        );

        let row = sqlx::query(&query)
            .bind(&key.match_id)
            .bind(&key.requester_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }
}
