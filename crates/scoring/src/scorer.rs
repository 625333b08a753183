use riftcoach_core::score::{clamp_dimension, round_overall};
use riftcoach_core::{GameMode, MatchBundle, Participant, PlayerScore};

use crate::error::ScoreError;

/// A deterministic, bounded scoring function for one game mode.
///
/// Implementations must satisfy three laws, enforced by the shared tests:
/// every dimension lands in `[0, 100]`; the same bundle always produces
/// bitwise-equal scores; and each dimension is monotone in its principal
/// input (more damage share never lowers combat, all else equal).
pub trait Scorer: Send + Sync {
    /// The mode this scorer is built for.
    fn mode(&self) -> GameMode;

    /// Dimension weights as `(combat, economy, vision, objectives, teamplay)`.
    /// A zero weight means the dimension is omitted for this mode.
    fn weights(&self) -> [f64; 5];

    /// Compute raw dimension values for one participant.
    fn dimensions(&self, participant: &Participant, bundle: &MatchBundle) -> [f64; 5];

    /// Score every participant, in participant order.
    fn score(&self, bundle: &MatchBundle) -> Result<Vec<PlayerScore>, ScoreError> {
        let weights = self.weights();
        let mut scores = Vec::with_capacity(bundle.detail.participants.len());

        for participant in &bundle.detail.participants {
            let raw = self.dimensions(participant, bundle);

            for (value, weight) in raw.iter().zip(weights) {
                if !value.is_finite() && weight > 0.0 {
                    return Err(ScoreError::Numeric(format!(
                        "non-finite dimension for participant {}",
                        participant.participant_id
                    )));
                }
            }

            // Zero-weight dimensions are forced to 0 so they read as omitted.
            let bounded: Vec<f64> = raw
                .iter()
                .zip(weights)
                .map(|(v, w)| if w > 0.0 { clamp_dimension(*v) } else { 0.0 })
                .collect();

            let overall = round_overall(
                bounded
                    .iter()
                    .zip(weights)
                    .map(|(d, w)| d * w)
                    .sum::<f64>(),
            );

            scores.push(PlayerScore {
                participant_id: participant.participant_id,
                summoner_identifier: participant.summoner_identifier.clone(),
                champion: participant.champion.clone(),
                combat: bounded[0],
                economy: bounded[1],
                vision: bounded[2],
                objectives: bounded[3],
                teamplay: bounded[4],
                overall,
            });
        }

        Ok(scores)
    }
}

/// Kills plus assists over deaths, with deaths floored at 1.
#[must_use]
pub fn kda(p: &Participant) -> f64 {
    f64::from(p.kills + p.assists) / f64::from(p.deaths.max(1))
}

/// Share of the participant's team damage to champions, in `[0, 1]`.
#[must_use]
pub fn damage_share(p: &Participant, bundle: &MatchBundle) -> f64 {
    let team_damage = bundle.detail.team_damage(p.team_id);
    if team_damage == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let share = p.damage_to_champions as f64 / team_damage as f64;
    share
}

/// Share of team kills the participant took part in, in `[0, 1]`.
#[must_use]
pub fn kill_participation(p: &Participant, bundle: &MatchBundle) -> f64 {
    let team_kills = bundle.detail.team_kills(p.team_id);
    if team_kills == 0 {
        return 0.0;
    }
    (f64::from(p.kills + p.assists) / f64::from(team_kills)).min(1.0)
}

/// Gold earned per minute of match time.
#[must_use]
pub fn gold_per_minute(p: &Participant, bundle: &MatchBundle) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let gold = p.gold_earned as f64;
    gold / bundle.detail.duration_minutes()
}

/// Minions and monsters killed per minute of match time.
#[must_use]
pub fn cs_per_minute(p: &Participant, bundle: &MatchBundle) -> f64 {
    f64::from(p.minions_killed) / bundle.detail.duration_minutes()
}
