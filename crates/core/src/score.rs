use serde::{Deserialize, Serialize};

/// Dimensional performance scores for one participant.
///
/// Every dimension is bounded to `[0, 100]`. Mode-specific strategies may
/// omit dimensions, in which case the omitted value is 0 and carries no
/// weight in `overall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub participant_id: u32,
    pub summoner_identifier: String,
    pub champion: String,

    pub combat: f64,
    pub economy: f64,
    pub vision: f64,
    pub objectives: f64,
    pub teamplay: f64,

    /// Weighted sum of the populated dimensions, rounded to one decimal.
    pub overall: f64,
}

impl PlayerScore {
    /// All dimension values in declaration order.
    #[must_use]
    pub fn dimensions(&self) -> [f64; 5] {
        [
            self.combat,
            self.economy,
            self.vision,
            self.objectives,
            self.teamplay,
        ]
    }

    /// Whether every dimension and the overall are within `[0, 100]` and finite.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.dimensions()
            .iter()
            .chain(std::iter::once(&self.overall))
            .all(|v| v.is_finite() && (0.0..=100.0).contains(v))
    }
}

/// Clamp a raw dimension value into `[0, 100]`.
#[must_use]
pub fn clamp_dimension(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) }
}

/// Round an overall score to one decimal place.
#[must_use]
pub fn round_overall(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
