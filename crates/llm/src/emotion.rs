use riftcoach_core::EmotionTag;

/// Keyword tables scanned in priority order. The first category with a hit
/// wins, making classification a pure function of its inputs.
const EXCITED: &[&str] = &[
    "incredible",
    "dominant",
    "unstoppable",
    "carried the game",
    "outstanding",
    "phenomenal",
    "flawless",
];

const CRITICAL: &[&str] = &[
    "careless",
    "avoidable",
    "sloppy",
    "repeatedly",
    "must improve",
    "poor decision",
    "overextended",
];

const SYMPATHETIC: &[&str] = &[
    "tough game",
    "unlucky",
    "rough",
    "heartbreaking",
    "unfortunate",
    "hard-fought loss",
];

const ENCOURAGING: &[&str] = &[
    "keep it up",
    "good foundation",
    "build on",
    "practice",
    "progress",
    "next step",
    "solid",
];

/// Deterministic emotion classification over a narrative.
///
/// Keyword mapping, not a second model call, so the tag is reproducible
/// for a given narrative. When no keyword matches, the match result and
/// the requester's overall score decide: a win reads encouraging, a heavy
/// loss sympathetic, anything else neutral.
#[must_use]
pub fn classify_emotion(narrative: &str, won: bool, requester_overall: f64) -> EmotionTag {
    let lower = narrative.to_lowercase();

    let tables: [(&[&str], EmotionTag); 4] = [
        (EXCITED, EmotionTag::Excited),
        (CRITICAL, EmotionTag::Critical),
        (SYMPATHETIC, EmotionTag::Sympathetic),
        (ENCOURAGING, EmotionTag::Encouraging),
    ];

    for (keywords, tag) in tables {
        if keywords.iter().any(|k| lower.contains(k)) {
            return tag;
        }
    }

    if won {
        EmotionTag::Encouraging
    } else if requester_overall < 40.0 {
        EmotionTag::Sympathetic
    } else {
        EmotionTag::Neutral
    }
}
