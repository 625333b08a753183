use async_trait::async_trait;

use riftcoach_core::{MatchDetail, MatchTimeline};

use crate::error::RiotError;

/// Source of raw match data.
///
/// The production implementation is [`RiotClient`](crate::RiotClient);
/// tests inject scripted fakes.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Retrieve the match summary.
    async fn get_match_detail(&self, match_id: &str, region: &str)
    -> Result<MatchDetail, RiotError>;

    /// Retrieve the per-minute timeline.
    async fn get_match_timeline(
        &self,
        match_id: &str,
        region: &str,
    ) -> Result<MatchTimeline, RiotError>;
}
