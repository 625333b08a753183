use riftcoach_core::{GameMode, MatchBundle, Participant};

use crate::scorer::{
    Scorer, cs_per_minute, damage_share, gold_per_minute, kda, kill_participation,
};

/// Scorer for the single-lane mode.
///
/// No lanes to ward, no neutral objectives: vision and objectives are
/// forced to 0 and omitted from prompts. Weights: combat 0.50,
/// economy 0.30, teamplay 0.20.
#[derive(Debug, Default)]
pub struct BlindModeScorer;

impl Scorer for BlindModeScorer {
    fn mode(&self) -> GameMode {
        GameMode::BlindMode
    }

    fn weights(&self) -> [f64; 5] {
        [0.50, 0.30, 0.0, 0.0, 0.20]
    }

    fn dimensions(&self, p: &Participant, bundle: &MatchBundle) -> [f64; 5] {
        let combat = 12.0 * kda(p) + 180.0 * damage_share(p, bundle);
        let economy = 0.12 * gold_per_minute(p, bundle) + 3.5 * cs_per_minute(p, bundle);
        let teamplay = 80.0 * kill_participation(p, bundle) + f64::from(p.assists);

        [combat, economy, 0.0, 0.0, teamplay]
    }
}
