use serde::{Deserialize, Serialize};

use riftcoach_core::GameMode;

use crate::error::NarratorError;

/// The typed shape every narrative completion must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeDraft {
    /// The full coaching narrative.
    pub narrative: String,

    /// Shorter variant suitable for speech synthesis.
    pub tts_summary: String,

    /// What went well, as short bullets.
    #[serde(default)]
    pub highlights: Vec<String>,

    /// What to work on, as short bullets.
    #[serde(default)]
    pub improvements: Vec<String>,
}

/// Per-mode constraints applied to a [`NarrativeDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeSchema {
    pub max_narrative_chars: usize,
    pub max_tts_chars: usize,
    pub max_bullets: usize,
}

impl NarrativeSchema {
    /// The schema for a game mode. Arena narratives are kept shorter since
    /// rounds carry less evidence than a full map game.
    #[must_use]
    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Arena => Self {
                max_narrative_chars: 1200,
                max_tts_chars: 280,
                max_bullets: 3,
            },
            _ => Self {
                max_narrative_chars: 2000,
                max_tts_chars: 280,
                max_bullets: 5,
            },
        }
    }

    /// Validate a completion against this schema.
    ///
    /// # Errors
    ///
    /// Returns [`NarratorError::Parse`] describing the first violation.
    pub fn validate(&self, content: &serde_json::Value) -> Result<NarrativeDraft, NarratorError> {
        let draft: NarrativeDraft = serde_json::from_value(content.clone())
            .map_err(|e| NarratorError::Parse(format!("draft shape mismatch: {e}")))?;

        if draft.narrative.trim().is_empty() {
            return Err(NarratorError::Parse("narrative is empty".into()));
        }
        if draft.narrative.chars().count() > self.max_narrative_chars {
            return Err(NarratorError::Parse(format!(
                "narrative exceeds {} chars",
                self.max_narrative_chars
            )));
        }
        if draft.tts_summary.trim().is_empty() {
            return Err(NarratorError::Parse("tts_summary is empty".into()));
        }
        if draft.tts_summary.chars().count() > self.max_tts_chars {
            return Err(NarratorError::Parse(format!(
                "tts_summary exceeds {} chars",
                self.max_tts_chars
            )));
        }
        if draft.highlights.len() > self.max_bullets {
            return Err(NarratorError::Parse(format!(
                "more than {} highlights",
                self.max_bullets
            )));
        }
        if draft.improvements.len() > self.max_bullets {
            return Err(NarratorError::Parse(format!(
                "more than {} improvements",
                self.max_bullets
            )));
        }

        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_content() -> serde_json::Value {
        serde_json::json!({
            "narrative": "You held mid well and rotated on time.",
            "tts_summary": "Strong mid control.",
            "highlights": ["good roams"],
            "improvements": ["ward deeper"]
        })
    }

    #[test]
    fn valid_draft_passes() {
        let schema = NarrativeSchema::for_mode(GameMode::Classic);
        let draft = schema.validate(&valid_content()).unwrap();
        assert_eq!(draft.tts_summary, "Strong mid control.");
        assert_eq!(draft.highlights.len(), 1);
    }

    #[test]
    fn bullets_default_to_empty() {
        let schema = NarrativeSchema::for_mode(GameMode::Classic);
        let content = serde_json::json!({
            "narrative": "Decent game.",
            "tts_summary": "Decent game."
        });
        let draft = schema.validate(&content).unwrap();
        assert!(draft.highlights.is_empty());
        assert!(draft.improvements.is_empty());
    }

    #[test]
    fn missing_narrative_rejected() {
        let schema = NarrativeSchema::for_mode(GameMode::Classic);
        let content = serde_json::json!({"tts_summary": "x"});
        let err = schema.validate(&content).unwrap_err();
        assert!(err.is_malformed_output());
    }

    #[test]
    fn empty_narrative_rejected() {
        let schema = NarrativeSchema::for_mode(GameMode::Classic);
        let content = serde_json::json!({"narrative": "   ", "tts_summary": "x"});
        assert!(schema.validate(&content).is_err());
    }

    #[test]
    fn oversized_tts_rejected() {
        let schema = NarrativeSchema::for_mode(GameMode::Classic);
        let content = serde_json::json!({
            "narrative": "fine",
            "tts_summary": "y".repeat(300)
        });
        let err = schema.validate(&content).unwrap_err();
        assert!(err.to_string().contains("tts_summary"));
    }

    #[test]
    fn too_many_bullets_rejected() {
        let schema = NarrativeSchema::for_mode(GameMode::Arena);
        let content = serde_json::json!({
            "narrative": "fine",
            "tts_summary": "fine",
            "highlights": ["a", "b", "c", "d"]
        });
        assert!(schema.validate(&content).is_err());
    }

    #[test]
    fn arena_schema_is_tighter() {
        let arena = NarrativeSchema::for_mode(GameMode::Arena);
        let classic = NarrativeSchema::for_mode(GameMode::Classic);
        assert!(arena.max_narrative_chars < classic.max_narrative_chars);
        assert!(arena.max_bullets < classic.max_bullets);
    }

    #[test]
    fn non_object_rejected() {
        let schema = NarrativeSchema::for_mode(GameMode::Classic);
        assert!(schema.validate(&serde_json::json!("just a string")).is_err());
        assert!(schema.validate(&serde_json::json!(["array"])).is_err());
    }
}
