use riftcoach_core::{GameMode, MatchBundle, Participant};

use crate::scorer::{Scorer, damage_share, kda};

/// Scorer for unrecognized queues.
///
/// Keeps the strategy mapping total: a combat-only score computed from the
/// stats every mode reports, so the persisted row still carries one score
/// per participant. The reply uses the generic template and no LLM call is
/// made.
#[derive(Debug, Default)]
pub struct FallbackScorer;

impl Scorer for FallbackScorer {
    fn mode(&self) -> GameMode {
        GameMode::Fallback
    }

    fn weights(&self) -> [f64; 5] {
        [1.0, 0.0, 0.0, 0.0, 0.0]
    }

    fn dimensions(&self, p: &Participant, bundle: &MatchBundle) -> [f64; 5] {
        let combat = 12.0 * kda(p) + 180.0 * damage_share(p, bundle);
        [combat, 0.0, 0.0, 0.0, 0.0]
    }
}
