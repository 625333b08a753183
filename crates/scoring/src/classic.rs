use riftcoach_core::{GameMode, MatchBundle, Participant};

use crate::scorer::{
    Scorer, cs_per_minute, damage_share, gold_per_minute, kda, kill_participation,
};

/// Scorer for standard five-lane matches: all five dimensions populated.
///
/// Weights: combat 0.30, economy 0.25, objectives 0.20, vision 0.15,
/// teamplay 0.10.
#[derive(Debug, Default)]
pub struct ClassicScorer;

impl Scorer for ClassicScorer {
    fn mode(&self) -> GameMode {
        GameMode::Classic
    }

    fn weights(&self) -> [f64; 5] {
        // (combat, economy, vision, objectives, teamplay)
        [0.30, 0.25, 0.15, 0.20, 0.10]
    }

    fn dimensions(&self, p: &Participant, bundle: &MatchBundle) -> [f64; 5] {
        let combat = 12.0 * kda(p) + 180.0 * damage_share(p, bundle);
        let economy = 0.12 * gold_per_minute(p, bundle) + 3.5 * cs_per_minute(p, bundle);
        let vision = 2.2 * f64::from(p.vision_score) / bundle.detail.duration_minutes() * 30.0
            + 0.8 * f64::from(p.wards_placed);
        let objectives = 10.0 * f64::from(p.turret_takedowns)
            + 12.0 * f64::from(p.dragon_takedowns)
            + 18.0 * f64::from(p.baron_takedowns);
        let teamplay = 80.0 * kill_participation(p, bundle) + f64::from(p.assists);

        [combat, economy, vision, objectives, teamplay]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::test_fixtures::classic_bundle;

    #[test]
    fn all_dimensions_populated_and_bounded() {
        let scores = ClassicScorer.score(&classic_bundle()).unwrap();
        assert_eq!(scores.len(), 10);
        for score in &scores {
            assert!(score.is_bounded(), "unbounded: {score:?}");
            assert!(score.combat > 0.0);
            assert!(score.economy > 0.0);
            assert!(score.vision > 0.0);
            assert!(score.teamplay > 0.0);
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let bundle = classic_bundle();
        let first = ClassicScorer.score(&bundle).unwrap();
        let second = ClassicScorer.score(&bundle).unwrap();
        // Bitwise equality, not approximate.
        assert_eq!(first, second);
    }

    #[test]
    fn combat_is_monotone_in_damage_share() {
        let mut bundle = classic_bundle();
        let baseline = ClassicScorer.score(&bundle).unwrap()[0].combat;

        bundle.detail.participants[0].damage_to_champions += 10_000;
        let boosted = ClassicScorer.score(&bundle).unwrap()[0].combat;
        assert!(boosted > baseline);
    }

    #[test]
    fn economy_is_monotone_in_gold() {
        let mut bundle = classic_bundle();
        let baseline = ClassicScorer.score(&bundle).unwrap()[0].economy;

        bundle.detail.participants[0].gold_earned += 5_000;
        let boosted = ClassicScorer.score(&bundle).unwrap()[0].economy;
        assert!(boosted > baseline);
    }

    #[test]
    fn vision_is_monotone_in_vision_score() {
        let mut bundle = classic_bundle();
        let baseline = ClassicScorer.score(&bundle).unwrap()[0].vision;

        bundle.detail.participants[0].vision_score += 30;
        let boosted = ClassicScorer.score(&bundle).unwrap()[0].vision;
        assert!(boosted > baseline);
    }

    #[test]
    fn objectives_reward_takedowns() {
        let mut bundle = classic_bundle();
        let baseline = ClassicScorer.score(&bundle).unwrap()[0].objectives;

        bundle.detail.participants[0].baron_takedowns += 1;
        let boosted = ClassicScorer.score(&bundle).unwrap()[0].objectives;
        assert!(boosted > baseline);
    }

    #[test]
    fn overall_is_weighted_sum() {
        let scores = ClassicScorer.score(&classic_bundle()).unwrap();
        let s = &scores[0];
        let expected = 0.30 * s.combat
            + 0.25 * s.economy
            + 0.15 * s.vision
            + 0.20 * s.objectives
            + 0.10 * s.teamplay;
        assert!((s.overall - (expected * 10.0).round() / 10.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_stats_stay_bounded() {
        let mut bundle = classic_bundle();
        let p = &mut bundle.detail.participants[0];
        p.kills = 40;
        p.deaths = 0;
        p.assists = 30;
        p.damage_to_champions = 200_000;
        p.gold_earned = 40_000;
        p.vision_score = 150;
        p.turret_takedowns = 11;
        p.baron_takedowns = 4;

        let scores = ClassicScorer.score(&bundle).unwrap();
        assert!(scores[0].is_bounded());
        assert!((scores[0].combat - 100.0).abs() < f64::EPSILON);
    }
}
