//! Mode-specific scoring strategies.
//!
//! The [`StrategyFactory`] maps a vendor queue id to one of four
//! strategies, each pairing a deterministic [`Scorer`] with a prompt
//! builder, a response schema, and (for Arena) a compliance filter. The
//! Fallback strategy keeps the mapping total: an unknown queue scores
//! minimally and replies with a template, never an error.

pub mod arena;
pub mod blind;
pub mod classic;
pub mod compliance;
pub mod error;
pub mod fallback;
pub mod prompt;
pub mod scorer;
pub mod strategy;
pub mod template;

pub use compliance::{ComplianceFilter, ComplianceViolation};
pub use error::ScoreError;
pub use prompt::build_prompt;
pub use scorer::Scorer;
pub use strategy::{Strategy, StrategyFactory};
pub use template::{fallback_draft, template_draft};

/// Version tag of the scoring formulas, persisted with every record.
pub const ALGORITHM_VERSION: &str = "v1";
