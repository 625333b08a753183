use serde::{Deserialize, Serialize};

use crate::error::BundleError;

/// One player within a match, as reported by the vendor match detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// 1-based participant index within the match.
    pub participant_id: u32,

    /// Vendor account handle (game name + tag line).
    pub summoner_identifier: String,

    /// Champion played.
    pub champion: String,

    /// Team the participant belongs to.
    pub team_id: u32,

    /// Whether this participant's team won.
    pub win: bool,

    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,

    /// Total damage dealt to enemy champions.
    pub damage_to_champions: u64,

    pub gold_earned: u64,

    /// Lane minions plus neutral monsters killed.
    pub minions_killed: u32,

    pub vision_score: u32,
    pub wards_placed: u32,

    pub turret_takedowns: u32,
    pub dragon_takedowns: u32,
    pub baron_takedowns: u32,
}

/// Match summary: participants, queue identifier, duration, result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    /// Vendor match identifier.
    pub match_id: String,

    /// Vendor integer tag identifying the match's mode.
    pub queue_id: u32,

    /// Match duration in seconds.
    pub game_duration_secs: u32,

    /// All participants, in vendor order.
    pub participants: Vec<Participant>,
}

impl MatchDetail {
    /// Duration in whole minutes, never below 1 so per-minute rates stay finite.
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        (f64::from(self.game_duration_secs) / 60.0).max(1.0)
    }

    /// Look up a participant by the requester's account handle.
    #[must_use]
    pub fn participant_by_identifier(&self, identifier: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.summoner_identifier == identifier)
    }

    /// Sum of kills on the given team.
    #[must_use]
    pub fn team_kills(&self, team_id: u32) -> u32 {
        self.participants
            .iter()
            .filter(|p| p.team_id == team_id)
            .map(|p| p.kills)
            .sum()
    }

    /// Sum of damage to champions on the given team.
    #[must_use]
    pub fn team_damage(&self, team_id: u32) -> u64 {
        self.participants
            .iter()
            .filter(|p| p.team_id == team_id)
            .map(|p| p.damage_to_champions)
            .sum()
    }
}

/// Per-participant state captured at one timeline frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStat {
    pub participant_id: u32,
    pub total_gold: u64,
    pub xp: u64,
}

/// One per-minute frame of participant state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineFrame {
    /// Minute mark of this frame.
    pub minute: u32,

    /// State of every participant at this frame.
    pub participants: Vec<FrameStat>,
}

/// Ordered per-minute frames describing participant state across a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchTimeline {
    pub frames: Vec<TimelineFrame>,
}

impl MatchTimeline {
    /// Total gold for a participant at the given minute, if the frame exists.
    #[must_use]
    pub fn gold_at(&self, participant_id: u32, minute: u32) -> Option<u64> {
        self.frames
            .iter()
            .find(|f| f.minute == minute)?
            .participants
            .iter()
            .find(|p| p.participant_id == participant_id)
            .map(|p| p.total_gold)
    }
}

/// The raw material of one analysis: match detail plus timeline.
///
/// Exists only during task execution; never persisted beyond a short-lived
/// cache. Invariants are checked by [`MatchBundle::validate`] right after
/// the fetch stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchBundle {
    pub detail: MatchDetail,
    pub timeline: MatchTimeline,
}

impl MatchBundle {
    /// Validate vendor invariants: participant count is 2, 5, or 10
    /// depending on mode, and timeline frames are monotonically
    /// non-decreasing in time.
    pub fn validate(&self) -> Result<(), BundleError> {
        let count = self.detail.participants.len();
        if !matches!(count, 2 | 5 | 10) {
            return Err(BundleError::ParticipantCount(count));
        }

        let mut last_minute = 0u32;
        for frame in &self.timeline.frames {
            if frame.minute < last_minute {
                return Err(BundleError::NonMonotonicTimeline {
                    minute: frame.minute,
                    previous: last_minute,
                });
            }
            last_minute = frame.minute;
        }

        Ok(())
    }
}
