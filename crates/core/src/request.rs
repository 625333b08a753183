use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored preferences of the requesting user, applied to narrative tone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name to address the user by in the narrative.
    pub display_name: Option<String>,

    /// Preferred narrative language (BCP-47 tag, e.g. `en`, `zh-CN`).
    pub language: Option<String>,

    /// Preferred coaching tone (e.g. `direct`, `gentle`).
    pub tone: Option<String>,
}

/// An inbound analysis request, produced by the dispatcher and carried
/// through the task queue.
///
/// The request is immutable once enqueued. `match_id` and `region` together
/// identify a single match in the vendor namespace. The serialized form is
/// stable: a request enqueued before a restart deserializes after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Unique request identifier.
    pub request_id: Uuid,

    /// Vendor match identifier (e.g. `NA1_4567890123`).
    pub match_id: String,

    /// Vendor platform code (e.g. `na1`, `euw1`).
    pub region: String,

    /// External handle of the requesting chat user.
    pub requester_id: String,

    /// Opaque token granting the right to edit the deferred reply.
    /// Valid for a bounded window from `requested_at`.
    pub interaction_token: String,

    /// Chat application id, required alongside the token for the edit.
    pub application_id: String,

    /// When the dispatcher received the slash command.
    pub requested_at: DateTime<Utc>,

    /// Stored preferences of the requester, if any.
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

impl AnalysisRequest {
    /// Create a new request with a generated id and `requested_at` of now.
    #[must_use]
    pub fn new(
        match_id: impl Into<String>,
        region: impl Into<String>,
        requester_id: impl Into<String>,
        interaction_token: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            match_id: match_id.into(),
            region: region.into(),
            requester_id: requester_id.into(),
            interaction_token: interaction_token.into(),
            application_id: application_id.into(),
            requested_at: Utc::now(),
            user_profile: None,
        }
    }

    /// Attach the requester's stored preferences.
    #[must_use]
    pub fn with_user_profile(mut self, profile: UserProfile) -> Self {
        self.user_profile = Some(profile);
        self
    }

    /// The instant after which the interaction token must be treated as
    /// expired and delivery skipped.
    #[must_use]
    pub fn token_deadline(&self, ttl_seconds: u64) -> DateTime<Utc> {
        self.requested_at + Duration::seconds(ttl_seconds.cast_signed())
    }

    /// Whether the interaction token is still usable at `now`.
    #[must_use]
    pub fn token_valid_at(&self, now: DateTime<Utc>, ttl_seconds: u64) -> bool {
        now < self.token_deadline(ttl_seconds)
    }
}
