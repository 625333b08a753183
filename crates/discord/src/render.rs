use riftcoach_core::{AnalysisReport, EmotionTag, GameMode};

use crate::types::{Embed, EmbedField, EmbedFooter, InteractionReply};

/// Embed accent color per emotional register.
fn color_for(emotion: EmotionTag) -> u32 {
    match emotion {
        EmotionTag::Excited => 0x00F1_C40F,
        EmotionTag::Encouraging => 0x002E_CC71,
        EmotionTag::Critical => 0x00E7_4C3C,
        EmotionTag::Sympathetic => 0x0034_98DB,
        EmotionTag::Neutral => 0x0095_A5A6,
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("• {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render an analysis report into the deferred-reply payload.
///
/// Pure: the same report always renders the same reply. The pipeline core
/// treats the result as an opaque payload.
#[must_use]
pub fn render_report(report: &AnalysisReport) -> InteractionReply {
    let score = &report.requester_score;

    let mut fields = vec![
        EmbedField {
            name: "Overall".into(),
            value: format!("{:.1}", score.overall),
            inline: Some(true),
        },
        EmbedField {
            name: "Rank".into(),
            value: format!("{}/{}", report.requester_rank(), report.player_scores.len()),
            inline: Some(true),
        },
    ];

    // Dimension lines; omitted dimensions (forced 0 by the mode) are hidden.
    let dimensions = [
        ("Combat", score.combat),
        ("Economy", score.economy),
        ("Vision", score.vision),
        ("Objectives", score.objectives),
        ("Teamplay", score.teamplay),
    ];
    let dimension_text = dimensions
        .iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(name, v)| format!("{name} {v:.0}"))
        .collect::<Vec<_>>()
        .join(" · ");
    if !dimension_text.is_empty() {
        fields.push(EmbedField {
            name: "Dimensions".into(),
            value: dimension_text,
            inline: Some(false),
        });
    }

    if !report.highlights.is_empty() {
        fields.push(EmbedField {
            name: "Highlights".into(),
            value: bullet_list(&report.highlights),
            inline: Some(false),
        });
    }
    if !report.improvements.is_empty() {
        fields.push(EmbedField {
            name: "Improvements".into(),
            value: bullet_list(&report.improvements),
            inline: Some(false),
        });
    }

    let footer_text = if report.observability.degradation.any() {
        format!("partial analysis · scores {}", report.algorithm_version)
    } else {
        format!("scores {}", report.algorithm_version)
    };

    let title = if report.mode == GameMode::Fallback {
        format!("Match {} · mode not supported", report.match_id)
    } else {
        format!("Match {} · {}", report.match_id, score.champion)
    };

    InteractionReply {
        content: None,
        embeds: Some(vec![Embed {
            title: Some(title),
            description: Some(report.narrative_text.clone()),
            color: Some(color_for(report.emotion_tag)),
            fields: Some(fields),
            footer: Some(EmbedFooter { text: footer_text }),
        }]),
    }
}

/// Render a concise failure embed: "analysis failed: <short reason>".
#[must_use]
pub fn render_error(match_id: &str, reason: &str) -> InteractionReply {
    InteractionReply {
        content: None,
        embeds: Some(vec![Embed {
            title: Some(format!("Match {match_id}")),
            description: Some(format!("analysis failed: {reason}")),
            color: Some(0x00E7_4C3C),
            fields: None,
            footer: None,
        }]),
    }
}
