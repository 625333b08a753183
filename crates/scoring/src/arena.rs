use riftcoach_core::{GameMode, MatchBundle, Participant};

use crate::scorer::{Scorer, damage_share, kda, kill_participation};

/// Scorer for round-based duos.
///
/// Two dimensions: combat 0.60 and duo synergy 0.40 (carried in the
/// `teamplay` slot). Rounds are short and bloody, so kills and shared
/// takedowns dominate; farm and vision do not exist here.
#[derive(Debug, Default)]
pub struct ArenaScorer;

impl Scorer for ArenaScorer {
    fn mode(&self) -> GameMode {
        GameMode::Arena
    }

    fn weights(&self) -> [f64; 5] {
        [0.60, 0.0, 0.0, 0.0, 0.40]
    }

    fn dimensions(&self, p: &Participant, bundle: &MatchBundle) -> [f64; 5] {
        let combat = 14.0 * kda(p) + 200.0 * damage_share(p, bundle);
        let duo_synergy = 70.0 * kill_participation(p, bundle) + 2.5 * f64::from(p.assists);

        [combat, 0.0, 0.0, 0.0, duo_synergy]
    }
}
