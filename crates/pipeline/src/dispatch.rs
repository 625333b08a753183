use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use riftcoach_core::request::UserProfile;
use riftcoach_core::AnalysisRequest;

use crate::metrics::PipelineMetrics;
use crate::queue::{QueueError, TaskQueue};

/// Vendor platform codes the dispatcher accepts.
const KNOWN_REGIONS: &[&str] = &[
    "na1", "euw1", "eun1", "kr", "br1", "jp1", "la1", "la2", "oc1", "tr1", "ru", "ph2", "sg2",
    "th2", "tw2", "vn2",
];

fn match_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9]{2,10}_\d{1,19}$").expect("pattern must compile"))
}

/// A validated-enough slash command, as handed over by the chat adapter.
#[derive(Debug, Clone)]
pub struct SlashCommand {
    pub match_id: String,
    pub region: String,
    pub requester_id: String,
    pub interaction_token: String,
    pub application_id: String,
    pub user_profile: Option<UserProfile>,
}

/// The dispatcher's reply, produced within the platform's response window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// The interaction was deferred; a worker will finish the reply.
    Deferred { request_id: Uuid },
    /// Arguments failed validation; the user sees this synchronously and
    /// nothing is enqueued.
    Invalid { message: String },
    /// The broker is unavailable; the user is asked to retry and nothing
    /// is enqueued.
    Busy,
}

/// Validates slash commands and enqueues analysis requests.
///
/// The only producer of interaction tokens into the pipeline. Never blocks
/// on analysis: the acknowledgement is computed from validation and the
/// enqueue result alone.
pub struct Dispatcher {
    queue: Arc<dyn TaskQueue>,
    metrics: Arc<PipelineMetrics>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(queue: Arc<dyn TaskQueue>, metrics: Arc<PipelineMetrics>) -> Self {
        Self { queue, metrics }
    }

    fn validate(command: &SlashCommand) -> Result<(), String> {
        if !match_id_pattern().is_match(&command.match_id) {
            return Err(format!("'{}' is not a valid match id", command.match_id));
        }
        if !KNOWN_REGIONS.contains(&command.region.as_str()) {
            return Err(format!("unknown region '{}'", command.region));
        }
        if command.requester_id.trim().is_empty() {
            return Err("missing requester".into());
        }
        if command.interaction_token.is_empty() || command.application_id.is_empty() {
            return Err("missing interaction credentials".into());
        }
        Ok(())
    }

    /// Handle one slash command: validate, enqueue, acknowledge.
    pub async fn dispatch(&self, command: SlashCommand) -> Ack {
        if let Err(message) = Self::validate(&command) {
            self.metrics.increment_dispatch_invalid();
            return Ack::Invalid { message };
        }

        let mut request = AnalysisRequest::new(
            command.match_id,
            command.region,
            command.requester_id,
            command.interaction_token,
            command.application_id,
        );
        request.user_profile = command.user_profile;

        match self.queue.enqueue(&request).await {
            Ok(()) => {
                info!(request_id = %request.request_id, match_id = %request.match_id, "analysis enqueued");
                Ack::Deferred {
                    request_id: request.request_id,
                }
            }
            Err(e @ (QueueError::Full | QueueError::Closed)) => {
                warn!(error = %e, "queue unavailable, asking user to retry");
                self.metrics.increment_dispatch_busy();
                Ack::Busy
            }
            Err(QueueError::Serialization(e)) => {
                warn!(error = %e, "request failed to serialize");
                self.metrics.increment_dispatch_busy();
                Ack::Busy
            }
        }
    }
}
