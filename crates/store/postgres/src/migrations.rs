use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating the analysis table if it does not exist.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let analysis_table = config.analysis_table();

    let create_analysis = format!(
        "CREATE TABLE IF NOT EXISTS {analysis_table} (
            match_id TEXT NOT NULL,
            requester_id TEXT NOT NULL,
            status TEXT NOT NULL,
            mode TEXT NOT NULL,
            algorithm_version TEXT NOT NULL,
            score_data JSONB NOT NULL,
            narrative_text TEXT,
            tts_summary TEXT,
            emotion_tag TEXT,
            llm_metadata JSONB,
            degradation_flags JSONB NOT NULL DEFAULT '{{}}'::jsonb,
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (match_id, requester_id)
        )"
    );

    let create_status_idx = format!(
        "CREATE INDEX IF NOT EXISTS {}analysis_status_idx ON {analysis_table} (status)",
        config.table_prefix
    );

    sqlx::query(&create_analysis).execute(pool).await?;
    sqlx::query(&create_status_idx).execute(pool).await?;

    Ok(())
}
