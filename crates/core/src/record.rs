use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::{AnalysisReport, DegradationFlags, EmotionTag, LlmMetadata};
use crate::status::AnalysisStatus;

/// Primary key of a persisted analysis: one row per match per requester.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub match_id: String,
    pub requester_id: String,
}

impl RecordKey {
    #[must_use]
    pub fn new(match_id: impl Into<String>, requester_id: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            requester_id: requester_id.into(),
        }
    }

    /// Canonical string form, used as the map key in the memory backend.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.match_id, self.requester_id)
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.match_id, self.requester_id)
    }
}

/// The persisted analysis row.
///
/// Created at the persist stage with status `processing`, mutated through
/// the narrate and deliver stages, terminal at `completed`,
/// `completed_no_delivery`, or `failed`. Re-analysis updates the row in
/// place and preserves `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub match_id: String,
    pub requester_id: String,

    pub status: AnalysisStatus,

    /// Mode label (`classic`, `blind_mode`, `arena`, `fallback`).
    pub mode: String,

    pub algorithm_version: String,

    /// Serialized scoring payload: player scores plus the requester score.
    pub score_data: serde_json::Value,

    pub narrative_text: Option<String>,
    pub tts_summary: Option<String>,
    pub emotion_tag: Option<EmotionTag>,

    pub llm_metadata: Option<LlmMetadata>,

    #[serde(default)]
    pub degradation_flags: DegradationFlags,

    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// A fresh row for the start of a run: scores persisted, no narrative yet.
    #[must_use]
    pub fn processing(
        key: &RecordKey,
        mode: &str,
        algorithm_version: &str,
        score_data: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            match_id: key.match_id.clone(),
            requester_id: key.requester_id.clone(),
            status: AnalysisStatus::Processing,
            mode: mode.to_owned(),
            algorithm_version: algorithm_version.to_owned(),
            score_data,
            narrative_text: None,
            tts_summary: None,
            emotion_tag: None,
            llm_metadata: None,
            degradation_flags: DegradationFlags::default(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Key of this record.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.match_id.clone(), self.requester_id.clone())
    }

    /// Fold a finished report into the row.
    pub fn apply_report(&mut self, report: &AnalysisReport, llm_metadata: Option<LlmMetadata>) {
        self.narrative_text = Some(report.narrative_text.clone());
        self.tts_summary = Some(report.tts_summary.clone());
        self.emotion_tag = Some(report.emotion_tag);
        self.degradation_flags = report.observability.degradation;
        self.llm_metadata = llm_metadata;
        self.updated_at = Utc::now();
    }
}
