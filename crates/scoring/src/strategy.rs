use std::sync::Arc;

use riftcoach_core::config::FeatureFlags;
use riftcoach_core::GameMode;
use riftcoach_llm::NarrativeSchema;

use crate::arena::ArenaScorer;
use crate::blind::BlindModeScorer;
use crate::classic::ClassicScorer;
use crate::compliance::ComplianceFilter;
use crate::fallback::FallbackScorer;
use crate::scorer::Scorer;

/// One mode's full configuration: scorer, response schema, whether the
/// narrator is consulted, and an optional post-generation filter.
pub struct Strategy {
    pub mode: GameMode,
    pub scorer: Arc<dyn Scorer>,
    pub schema: NarrativeSchema,
    pub compliance: Option<ComplianceFilter>,
    /// Fallback replies come from a template; no LLM call is made.
    pub uses_llm: bool,
}

impl Strategy {
    fn classic() -> Self {
        Self {
            mode: GameMode::Classic,
            scorer: Arc::new(ClassicScorer),
            schema: NarrativeSchema::for_mode(GameMode::Classic),
            compliance: None,
            uses_llm: true,
        }
    }

    fn blind_mode() -> Self {
        Self {
            mode: GameMode::BlindMode,
            scorer: Arc::new(BlindModeScorer),
            schema: NarrativeSchema::for_mode(GameMode::BlindMode),
            compliance: None,
            uses_llm: true,
        }
    }

    fn arena() -> Self {
        Self {
            mode: GameMode::Arena,
            scorer: Arc::new(ArenaScorer),
            schema: NarrativeSchema::for_mode(GameMode::Arena),
            compliance: Some(ComplianceFilter::new()),
            uses_llm: true,
        }
    }

    fn fallback() -> Self {
        Self {
            mode: GameMode::Fallback,
            scorer: Arc::new(FallbackScorer),
            schema: NarrativeSchema::for_mode(GameMode::Fallback),
            compliance: None,
            uses_llm: false,
        }
    }
}

/// Selects the strategy for a match by inspecting its queue id.
///
/// Total over all queue ids: gated or unknown modes land on Fallback.
pub struct StrategyFactory {
    classic: Arc<Strategy>,
    blind_mode: Arc<Strategy>,
    arena: Arc<Strategy>,
    fallback: Arc<Strategy>,
    features: FeatureFlags,
}

impl StrategyFactory {
    #[must_use]
    pub fn new(features: FeatureFlags) -> Self {
        Self {
            classic: Arc::new(Strategy::classic()),
            blind_mode: Arc::new(Strategy::blind_mode()),
            arena: Arc::new(Strategy::arena()),
            fallback: Arc::new(Strategy::fallback()),
            features,
        }
    }

    /// The strategy for a queue id, honoring feature gates.
    #[must_use]
    pub fn for_queue(&self, queue_id: u32) -> Arc<Strategy> {
        match GameMode::from_queue_id(queue_id) {
            GameMode::Classic => Arc::clone(&self.classic),
            GameMode::BlindMode if self.features.blind_mode_enabled => {
                Arc::clone(&self.blind_mode)
            }
            GameMode::Arena if self.features.arena_enabled => Arc::clone(&self.arena),
            _ => Arc::clone(&self.fallback),
        }
    }

    /// The Fallback strategy, used directly when an Arena narrative trips
    /// the compliance panel.
    #[must_use]
    pub fn fallback(&self) -> Arc<Strategy> {
        Arc::clone(&self.fallback)
    }
}

impl Default for StrategyFactory {
    fn default() -> Self {
        Self::new(FeatureFlags::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_selection() {
        let factory = StrategyFactory::default();
        assert_eq!(factory.for_queue(420).mode, GameMode::Classic);
        assert_eq!(factory.for_queue(450).mode, GameMode::BlindMode);
        assert_eq!(factory.for_queue(1700).mode, GameMode::Arena);
        assert_eq!(factory.for_queue(9999).mode, GameMode::Fallback);
    }

    #[test]
    fn feature_gates_fall_back() {
        let factory = StrategyFactory::new(FeatureFlags {
            arena_enabled: false,
            blind_mode_enabled: false,
        });
        assert_eq!(factory.for_queue(1700).mode, GameMode::Fallback);
        assert_eq!(factory.for_queue(450).mode, GameMode::Fallback);
        // Classic is never gated.
        assert_eq!(factory.for_queue(420).mode, GameMode::Classic);
    }

    #[test]
    fn only_arena_carries_compliance() {
        let factory = StrategyFactory::default();
        assert!(factory.for_queue(1700).compliance.is_some());
        assert!(factory.for_queue(420).compliance.is_none());
        assert!(factory.for_queue(9999).compliance.is_none());
    }

    #[test]
    fn fallback_skips_llm() {
        let factory = StrategyFactory::default();
        assert!(!factory.for_queue(9999).uses_llm);
        assert!(factory.for_queue(420).uses_llm);
    }

    #[test]
    fn strategies_are_shared() {
        let factory = StrategyFactory::default();
        let a = factory.for_queue(420);
        let b = factory.for_queue(440);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
