use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mode::GameMode;
use crate::score::PlayerScore;

/// Emotional register of the coaching narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionTag {
    Excited,
    Encouraging,
    Critical,
    Neutral,
    Sympathetic,
}

impl EmotionTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excited => "excited",
            Self::Encouraging => "encouraging",
            Self::Critical => "critical",
            Self::Neutral => "neutral",
            Self::Sympathetic => "sympathetic",
        }
    }

    /// Parse a stored label back into a tag.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "excited" => Some(Self::Excited),
            "encouraging" => Some(Self::Encouraging),
            "critical" => Some(Self::Critical),
            "neutral" => Some(Self::Neutral),
            "sympathetic" => Some(Self::Sympathetic),
            _ => None,
        }
    }
}

impl std::fmt::Display for EmotionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which lower-fidelity paths the pipeline took for this analysis.
///
/// All flags false means a full-fidelity run. Degradation is operationally
/// normal, not a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradationFlags {
    /// The LLM output was invalid twice and a template narrative was used.
    #[serde(default)]
    pub llm_template: bool,

    /// Arena output tripped the compliance filter; template substituted.
    #[serde(default)]
    pub arena_compliance: bool,

    /// Unknown mode; the generic fallback template was used without an LLM call.
    #[serde(default)]
    pub fallback_strategy: bool,
}

impl DegradationFlags {
    /// Whether any degradation occurred.
    #[must_use]
    pub fn any(self) -> bool {
        self.llm_template || self.arena_compliance || self.fallback_strategy
    }
}

/// Vendor call accounting for the narrate stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmMetadata {
    pub model_id: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub latency_ms: u64,
}

/// Observability block attached to every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportObservability {
    /// Session identifier shared by every call of one analysis.
    pub session_id: String,

    /// Branch identifier distinguishing retries within a session.
    pub branch_id: String,

    /// Wall-clock duration per stage, keyed by stage label.
    pub stage_durations_ms: HashMap<String, u64>,

    pub degradation: DegradationFlags,
}

/// The authoritative output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub match_id: String,
    pub mode: GameMode,

    /// Version tag of the scoring formulas that produced `player_scores`.
    pub algorithm_version: String,

    /// One score per participant, in participant order.
    pub player_scores: Vec<PlayerScore>,

    /// The requester's own score, duplicated for direct access.
    pub requester_score: PlayerScore,

    pub narrative_text: String,

    /// Shorter narrative variant suitable for speech synthesis.
    pub tts_summary: String,

    pub emotion_tag: EmotionTag,

    /// Short bullet lists rendered into the reply.
    pub highlights: Vec<String>,
    pub improvements: Vec<String>,

    pub observability: ReportObservability,
}

impl AnalysisReport {
    /// Rank of the requester among all participants by overall score
    /// (1-based). Ties break by participant index.
    #[must_use]
    pub fn requester_rank(&self) -> usize {
        let mut ordered: Vec<&PlayerScore> = self.player_scores.iter().collect();
        ordered.sort_by(|a, b| {
            b.overall
                .partial_cmp(&a.overall)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.participant_id.cmp(&b.participant_id))
        });
        ordered
            .iter()
            .position(|s| s.participant_id == self.requester_score.participant_id)
            .map_or(1, |i| i + 1)
    }
}
