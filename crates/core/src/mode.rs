use serde::{Deserialize, Serialize};

/// Closed enumeration of supported game modes.
///
/// Selected from the vendor queue id; [`GameMode::Fallback`] keeps the
/// mapping total, so an unknown queue never fails strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Standard five-lane mode with full vision and objective play.
    Classic,
    /// Single-lane mode: no vision game, no neutral objectives.
    BlindMode,
    /// Round-based duos.
    Arena,
    /// Any queue the pipeline has no dedicated strategy for.
    Fallback,
}

impl GameMode {
    /// Map a vendor queue id to a mode. Unknown ids map to `Fallback`.
    #[must_use]
    pub fn from_queue_id(queue_id: u32) -> Self {
        match queue_id {
            400 | 420 | 430 | 440 => Self::Classic,
            450 => Self::BlindMode,
            1700 | 1710 => Self::Arena,
            _ => Self::Fallback,
        }
    }

    /// Short stable label used in persisted rows and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::BlindMode => "blind_mode",
            Self::Arena => "arena",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
