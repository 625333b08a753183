use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, instrument, warn};

use riftcoach_core::report::ReportObservability;
use riftcoach_core::{
    AnalysisRecord, AnalysisReport, AnalysisRequest, AnalysisStatus, CorrelationId,
    DegradationFlags, LlmMetadata, MatchBundle, PipelineConfig, PlayerScore, RecordKey,
    RetryStrategy,
};
use riftcoach_discord::{DeliveryOutcome, DeliverySink, render_error, render_report};
use riftcoach_llm::{Completion, CompletionRequest, Narrator, NarratorError, classify_emotion};
use riftcoach_riot::{MatchSource, RiotError};
use riftcoach_llm::NarrativeDraft;
use riftcoach_scoring::{
    ALGORITHM_VERSION, ScoreError, Strategy, StrategyFactory, build_prompt, fallback_draft,
    template_draft,
};
use riftcoach_store::{AnalysisStore, StoreError};

use crate::metrics::PipelineMetrics;
use crate::observe::observed;
use crate::result::{Stage, TaskResult};
use crate::status::StatusTracker;

/// Classified failure of one stage, matched by the orchestrator to pick
/// the transition. Degradation is not a failure: the narrate stage handles
/// it internally and the task proceeds.
#[derive(Debug)]
enum StageFailure {
    /// Retry budget exhausted on a retryable condition.
    Transient(String),
    /// The resource is gone or the input can never succeed.
    Permanent(String),
    /// A contract violation between internal components.
    Programming(String),
}

impl StageFailure {
    fn message(&self) -> &str {
        match self {
            Self::Transient(m) | Self::Permanent(m) | Self::Programming(m) => m,
        }
    }
}

fn classify_fetch(err: &RiotError) -> StageFailure {
    if err.is_permanent() {
        StageFailure::Permanent(err.to_string())
    } else {
        StageFailure::Transient(err.to_string())
    }
}

/// 1-based rank of a participant by overall score; ties break by
/// participant index.
fn rank_of(scores: &[PlayerScore], participant_id: u32) -> usize {
    let mut ordered: Vec<&PlayerScore> = scores.iter().collect();
    ordered.sort_by(|a, b| {
        b.overall
            .partial_cmp(&a.overall)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.participant_id.cmp(&b.participant_id))
    });
    ordered
        .iter()
        .position(|s| s.participant_id == participant_id)
        .map_or(1, |i| i + 1)
}

/// What one narrator attempt produced, after schema and compliance checks.
enum Evaluation {
    Valid(NarrativeDraft, LlmMetadata),
    ComplianceRejected(LlmMetadata),
    Malformed(String, Option<LlmMetadata>),
    Failed(String),
}

/// The canonical orchestrator: one analysis request, five sequential
/// stages, one persisted record, one deferred-reply edit.
///
/// Collaborators are injected once at worker startup and shared across
/// invocations; per-task state is passed by value. Exactly-once execution
/// is not promised: the store upsert and the self-idempotent webhook
/// PATCH make re-execution safe.
pub struct AnalyzeMatch {
    source: Arc<dyn MatchSource>,
    store: Arc<dyn AnalysisStore>,
    narrator: Arc<dyn Narrator>,
    delivery: Arc<dyn DeliverySink>,
    strategies: Arc<StrategyFactory>,
    config: PipelineConfig,
    metrics: Arc<PipelineMetrics>,
}

impl AnalyzeMatch {
    #[must_use]
    pub fn new(
        source: Arc<dyn MatchSource>,
        store: Arc<dyn AnalysisStore>,
        narrator: Arc<dyn Narrator>,
        delivery: Arc<dyn DeliverySink>,
        strategies: Arc<StrategyFactory>,
        config: PipelineConfig,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            source,
            store,
            narrator,
            delivery,
            strategies,
            config,
            metrics,
        }
    }

    /// Shared pipeline counters.
    #[must_use]
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Execute the five stages for one request.
    #[instrument(skip(self, request), fields(request_id = %request.request_id, match_id = %request.match_id))]
    pub async fn run(&self, request: AnalysisRequest) -> TaskResult {
        let correlation = CorrelationId::for_request(request.request_id);
        let mut result = TaskResult::started(request.request_id, correlation.clone());
        self.metrics.increment_tasks_started();

        let key = RecordKey::new(request.match_id.clone(), request.requester_id.clone());
        let tracker = StatusTracker::new(Arc::clone(&self.store), correlation.clone());

        // Stage 1: fetch.
        let bundle = match self.fetch(&request, &correlation, &mut result).await {
            Ok(bundle) => bundle,
            Err(failure) => {
                return self
                    .fail(&request, &key, None, Stage::Fetch, &failure, result)
                    .await;
            }
        };

        let strategy = self.strategies.for_queue(bundle.detail.queue_id);
        let mode_label = strategy.mode.as_str();

        // Stage 2: score.
        let scores = match self.score(&bundle, &strategy, &mut result).await {
            Ok(scores) => scores,
            Err(failure) => {
                return self
                    .fail(&request, &key, Some(mode_label), Stage::Score, &failure, result)
                    .await;
            }
        };

        let Some(requester) = bundle
            .detail
            .participant_by_identifier(&request.requester_id)
        else {
            let failure = StageFailure::Permanent(format!(
                "requester {} is not a participant of this match",
                request.requester_id
            ));
            return self
                .fail(&request, &key, Some(mode_label), Stage::Score, &failure, result)
                .await;
        };
        let requester_score = scores
            .iter()
            .find(|s| s.participant_id == requester.participant_id)
            .cloned()
            .unwrap_or_else(|| scores[0].clone());
        let requester_won = requester.win;

        // Stage 3: first persist, creating the row at `processing`.
        let score_data = serde_json::json!({
            "player_scores": scores,
            "requester_score": requester_score,
        });
        let record = AnalysisRecord::processing(&key, mode_label, ALGORITHM_VERSION, score_data);
        if let Err(failure) = self
            .persist(&record, Stage::Persist, &correlation, &mut result)
            .await
        {
            return self
                .fail(&request, &key, Some(mode_label), Stage::Persist, &failure, result)
                .await;
        }
        if let Err(e) = tracker
            .transition(&key, AnalysisStatus::Processing, AnalysisStatus::Analyzing, None)
            .await
        {
            let failure = StageFailure::Transient(format!("status transition failed: {e}"));
            return self
                .fail(&request, &key, Some(mode_label), Stage::Persist, &failure, result)
                .await;
        }

        // Stage 4: narrate, with strict retry and template degradation.
        let mut flags = DegradationFlags::default();
        let narrate_started = Instant::now();
        let narrated = self
            .narrate(
                &request,
                &bundle,
                &strategy,
                &scores,
                &requester_score,
                requester_won,
                &correlation,
                &mut flags,
            )
            .await;
        result.record_duration(Stage::Narrate, narrate_started.elapsed());
        let (draft, llm_metadata) = match narrated {
            Ok(pair) => pair,
            Err(failure) => {
                return self
                    .fail(&request, &key, Some(mode_label), Stage::Narrate, &failure, result)
                    .await;
            }
        };

        let emotion = classify_emotion(&draft.narrative, requester_won, requester_score.overall);
        let report = AnalysisReport {
            match_id: request.match_id.clone(),
            mode: strategy.mode,
            algorithm_version: ALGORITHM_VERSION.to_owned(),
            player_scores: scores,
            requester_score,
            narrative_text: draft.narrative,
            tts_summary: draft.tts_summary,
            emotion_tag: emotion,
            highlights: draft.highlights,
            improvements: draft.improvements,
            observability: ReportObservability {
                session_id: correlation.session_id.clone(),
                branch_id: correlation.branch_id.clone(),
                stage_durations_ms: result
                    .stage_durations_ms
                    .iter()
                    .map(|(k, v)| ((*k).to_owned(), *v))
                    .collect(),
                degradation: flags,
            },
        };
        result.degradation = flags;

        // The stage-4 write and the transition to `delivering` are one
        // upsert, atomic at the store.
        let mut record = record;
        record.apply_report(&report, llm_metadata);
        record.status = AnalysisStatus::Delivering;
        if let Err(failure) = self
            .persist(&record, Stage::Narrate, &correlation, &mut result)
            .await
        {
            return self
                .fail(&request, &key, Some(mode_label), Stage::Narrate, &failure, result)
                .await;
        }

        // Stage 5: deliver, bounded by the interaction-token TTL.
        self.deliver(&request, &key, &tracker, &report, &correlation, &mut result)
            .await;

        result.success = true;
        self.metrics.increment_tasks_completed();
        if flags.any() {
            self.metrics.increment_tasks_degraded();
        }
        info!(
            correlation_id = %correlation,
            delivered = result.delivered,
            degraded = flags.any(),
            "analysis complete"
        );
        result
    }

    async fn fetch(
        &self,
        request: &AnalysisRequest,
        correlation: &CorrelationId,
        result: &mut TaskResult,
    ) -> Result<MatchBundle, StageFailure> {
        let budget = self.config.stage_timeout.fetch();

        let (detail, detail_duration) = {
            let (outcome, duration) = observed(
                correlation,
                "riot.get_match_detail",
                timeout(
                    budget,
                    self.source.get_match_detail(&request.match_id, &request.region),
                ),
            )
            .await;
            let detail = match outcome {
                Ok(Ok(detail)) => detail,
                Ok(Err(e)) => return Err(classify_fetch(&e)),
                Err(_) => {
                    return Err(StageFailure::Transient(format!(
                        "match detail fetch timed out after {budget:?}"
                    )));
                }
            };
            (detail, duration)
        };

        let (outcome, timeline_duration) = observed(
            correlation,
            "riot.get_match_timeline",
            timeout(
                budget,
                self.source
                    .get_match_timeline(&request.match_id, &request.region),
            ),
        )
        .await;
        let timeline = match outcome {
            Ok(Ok(timeline)) => timeline,
            Ok(Err(e)) => return Err(classify_fetch(&e)),
            Err(_) => {
                return Err(StageFailure::Transient(format!(
                    "match timeline fetch timed out after {budget:?}"
                )));
            }
        };

        result.record_duration(Stage::Fetch, detail_duration + timeline_duration);

        let bundle = MatchBundle { detail, timeline };
        bundle
            .validate()
            .map_err(|e| StageFailure::Permanent(format!("invalid match data: {e}")))?;
        Ok(bundle)
    }

    async fn score(
        &self,
        bundle: &MatchBundle,
        strategy: &Strategy,
        result: &mut TaskResult,
    ) -> Result<Vec<PlayerScore>, StageFailure> {
        let budget = self.config.stage_timeout.score();
        let scorer = Arc::clone(&strategy.scorer);
        let bundle = bundle.clone();
        let participant_count = bundle.detail.participants.len();

        let started = Instant::now();
        let outcome = timeout(
            budget,
            tokio::task::spawn_blocking(move || scorer.score(&bundle)),
        )
        .await;
        result.record_duration(Stage::Score, started.elapsed());

        let scores = match outcome {
            Ok(Ok(Ok(scores))) => scores,
            Ok(Ok(Err(e @ ScoreError::RequesterNotFound(_)))) => {
                return Err(StageFailure::Permanent(e.to_string()));
            }
            Ok(Ok(Err(e))) => return Err(StageFailure::Programming(e.to_string())),
            Ok(Err(join)) => {
                return Err(StageFailure::Programming(format!("scorer panicked: {join}")));
            }
            Err(_) => {
                return Err(StageFailure::Programming(format!(
                    "scoring exceeded its {budget:?} budget"
                )));
            }
        };

        if scores.len() != participant_count {
            return Err(StageFailure::Programming(format!(
                "scorer produced {} scores for {participant_count} participants",
                scores.len()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_bounded()) {
            return Err(StageFailure::Programming(format!(
                "score out of bounds for participant {}",
                bad.participant_id
            )));
        }
        Ok(scores)
    }

    async fn persist(
        &self,
        record: &AnalysisRecord,
        duration_stage: Stage,
        correlation: &CorrelationId,
        result: &mut TaskResult,
    ) -> Result<(), StageFailure> {
        let budget = self.config.stage_timeout.persist();
        let attempts = self.config.retry.persist_max_attempts.max(1);
        let backoff = RetryStrategy::Constant {
            delay: Duration::from_millis(100),
        };

        let started = Instant::now();
        let mut attempt = 0u32;
        loop {
            let (outcome, _) = observed(
                correlation,
                "store.upsert_record",
                timeout(budget, self.store.upsert_record(record)),
            )
            .await;

            let error_text = match outcome {
                Ok(Ok(_)) => {
                    if duration_stage == Stage::Persist {
                        result.record_duration(Stage::Persist, started.elapsed());
                    }
                    return Ok(());
                }
                Ok(Err(e)) if !e.is_retryable() => {
                    return Err(StageFailure::Programming(e.to_string()));
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("store write timed out after {budget:?}"),
            };

            if attempt + 1 >= attempts {
                return Err(StageFailure::Transient(error_text));
            }
            let delay = backoff.delay_for(attempt);
            warn!(
                correlation_id = %correlation,
                attempt,
                error = %error_text,
                delay_ms = %delay.as_millis(),
                "transient store error, will retry"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn complete_once(
        &self,
        prompt: &CompletionRequest,
        correlation: &CorrelationId,
    ) -> Result<Completion, NarratorError> {
        let budget = self.config.stage_timeout.narrate();
        let (outcome, _) = observed(
            correlation,
            "llm.complete",
            timeout(budget, self.narrator.complete(prompt)),
        )
        .await;
        match outcome {
            Ok(inner) => inner,
            Err(_) => Err(NarratorError::Timeout(budget.as_secs())),
        }
    }

    fn evaluate(attempt: Result<Completion, NarratorError>, strategy: &Strategy) -> Evaluation {
        let completion = match attempt {
            Ok(completion) => completion,
            Err(e) if e.is_malformed_output() => return Evaluation::Malformed(e.to_string(), None),
            Err(e) => return Evaluation::Failed(e.to_string()),
        };

        let draft = match strategy.schema.validate(&completion.content) {
            Ok(draft) => draft,
            Err(e) => return Evaluation::Malformed(e.to_string(), Some(completion.metadata)),
        };

        if let Some(filter) = &strategy.compliance {
            let pieces = std::iter::once(draft.narrative.as_str())
                .chain(std::iter::once(draft.tts_summary.as_str()))
                .chain(draft.highlights.iter().map(String::as_str))
                .chain(draft.improvements.iter().map(String::as_str));
            if let Err(violation) = filter.check_all(pieces) {
                warn!(pattern = %violation.pattern, "narrative rejected by compliance panel");
                return Evaluation::ComplianceRejected(completion.metadata);
            }
        }

        Evaluation::Valid(draft, completion.metadata)
    }

    #[allow(clippy::too_many_arguments)]
    async fn narrate(
        &self,
        request: &AnalysisRequest,
        bundle: &MatchBundle,
        strategy: &Strategy,
        scores: &[PlayerScore],
        requester_score: &PlayerScore,
        requester_won: bool,
        correlation: &CorrelationId,
        flags: &mut DegradationFlags,
    ) -> Result<(NarrativeDraft, Option<LlmMetadata>), StageFailure> {
        let profile = request.user_profile.as_ref();
        let display_name = profile
            .and_then(|p| p.display_name.as_deref())
            .unwrap_or(&request.requester_id);
        let rank = rank_of(scores, requester_score.participant_id);
        let total = scores.len();
        let weights = strategy.scorer.weights();

        if !strategy.uses_llm {
            self.metrics.increment_fallback_selected();
            flags.fallback_strategy = true;
            debug!(correlation_id = %correlation, "fallback strategy, skipping narrator");
            return Ok((fallback_draft(display_name, requester_score), None));
        }

        let prompt = build_prompt(
            strategy.mode,
            bundle,
            scores,
            &request.requester_id,
            profile,
            weights,
        )
        .map_err(|e| StageFailure::Programming(format!("prompt render failed: {e}")))?;

        let first = self.complete_once(&prompt, correlation).await;
        let malformed_reason = match Self::evaluate(first, strategy) {
            Evaluation::Valid(draft, metadata) => return Ok((draft, Some(metadata))),
            Evaluation::ComplianceRejected(metadata) => {
                self.metrics.increment_compliance_rejections();
                flags.arena_compliance = true;
                return Ok((fallback_draft(display_name, requester_score), Some(metadata)));
            }
            Evaluation::Malformed(reason, _) => Some(reason),
            Evaluation::Failed(reason) => {
                warn!(correlation_id = %correlation, error = %reason, "narrator call failed");
                None
            }
        };

        let last_metadata = if let Some(reason) = malformed_reason {
            // One strict retry, only for malformed output.
            debug!(correlation_id = %correlation, reason = %reason, "schema violation, strict retry");
            self.metrics.increment_llm_schema_retries();
            let second = self.complete_once(&prompt.strict(), correlation).await;
            match Self::evaluate(second, strategy) {
                Evaluation::Valid(draft, metadata) => return Ok((draft, Some(metadata))),
                Evaluation::ComplianceRejected(metadata) => {
                    self.metrics.increment_compliance_rejections();
                    flags.arena_compliance = true;
                    return Ok((fallback_draft(display_name, requester_score), Some(metadata)));
                }
                Evaluation::Malformed(_, metadata) => metadata,
                Evaluation::Failed(_) => None,
            }
        } else {
            None
        };

        // Both attempts failed (or the transport did). Degrade to the
        // deterministic template unless operators disabled it.
        if !self.config.degradation.template_enabled {
            return Err(StageFailure::Transient(
                "narrative generation failed and template fallback is disabled".into(),
            ));
        }
        self.metrics.increment_llm_template_degraded();
        flags.llm_template = true;
        Ok((
            template_draft(display_name, requester_score, weights, requester_won, rank, total),
            last_metadata,
        ))
    }

    async fn deliver(
        &self,
        request: &AnalysisRequest,
        key: &RecordKey,
        tracker: &StatusTracker,
        report: &AnalysisReport,
        correlation: &CorrelationId,
        result: &mut TaskResult,
    ) {
        let ttl = self.config.interaction_token_ttl_seconds();
        if !request.token_valid_at(Utc::now(), ttl) {
            info!(correlation_id = %correlation, "interaction token past TTL, skipping delivery");
            self.metrics.increment_deliveries_expired();
            self.finish_status(key, tracker, AnalysisStatus::CompletedNoDelivery, correlation)
                .await;
            return;
        }

        let reply = render_report(report);
        let budget = self.config.stage_timeout.deliver();
        let (outcome, duration) = observed(
            correlation,
            "discord.edit_original",
            timeout(
                budget,
                self.delivery
                    .edit_original(&request.application_id, &request.interaction_token, &reply),
            ),
        )
        .await;
        result.record_duration(Stage::Deliver, duration);

        let outcome = outcome.unwrap_or_else(|_| DeliveryOutcome::Transient {
            status: None,
            message: format!("delivery timed out after {budget:?}"),
        });

        let final_status = match outcome {
            DeliveryOutcome::Delivered => {
                result.delivered = true;
                AnalysisStatus::Completed
            }
            DeliveryOutcome::TokenExpired => {
                info!(correlation_id = %correlation, "interaction token expired at delivery");
                self.metrics.increment_deliveries_expired();
                AnalysisStatus::CompletedNoDelivery
            }
            DeliveryOutcome::Transient { status, message } => {
                warn!(
                    correlation_id = %correlation,
                    status = ?status,
                    error = %message,
                    "delivery failed transiently, not retrying"
                );
                self.metrics.increment_deliveries_transient();
                AnalysisStatus::CompletedNoDelivery
            }
        };
        self.finish_status(key, tracker, final_status, correlation).await;
    }

    /// Write the terminal status. The record already carries the full
    /// analysis; a failed write here is logged, never raised.
    async fn finish_status(
        &self,
        key: &RecordKey,
        tracker: &StatusTracker,
        status: AnalysisStatus,
        correlation: &CorrelationId,
    ) {
        if let Err(e) = tracker
            .transition(key, AnalysisStatus::Delivering, status, None)
            .await
        {
            error!(correlation_id = %correlation, error = %e, "failed to write terminal status");
        }
    }

    /// Terminal failure path: persist `failed` with the error message, then
    /// attempt one best-effort error webhook. Never re-raises from either.
    async fn fail(
        &self,
        request: &AnalysisRequest,
        key: &RecordKey,
        mode_label: Option<&str>,
        stage: Stage,
        failure: &StageFailure,
        mut result: TaskResult,
    ) -> TaskResult {
        let message = failure.message();
        error!(
            correlation_id = %result.correlation_id,
            stage = %stage,
            error = %message,
            "analysis failed"
        );
        self.metrics.increment_tasks_failed();

        match self
            .store
            .update_status(key, AnalysisStatus::Failed, Some(message))
            .await
        {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                // Failure before the stage-3 write: record the terminal row
                // so follow-up queries see what happened.
                let mut record = AnalysisRecord::processing(
                    key,
                    mode_label.unwrap_or("unknown"),
                    ALGORITHM_VERSION,
                    serde_json::json!({}),
                );
                record.status = AnalysisStatus::Failed;
                record.error_message = Some(message.to_owned());
                if let Err(e) = self.store.upsert_record(&record).await {
                    error!(correlation_id = %result.correlation_id, error = %e, "failed to persist failure row");
                }
            }
            Err(e) => {
                error!(correlation_id = %result.correlation_id, error = %e, "failed to persist failure status");
            }
        }

        let ttl = self.config.interaction_token_ttl_seconds();
        if request.token_valid_at(Utc::now(), ttl) {
            let reply = render_error(&request.match_id, message);
            let budget = self.config.stage_timeout.deliver();
            let _ = timeout(
                budget,
                self.delivery
                    .edit_original(&request.application_id, &request.interaction_token, &reply),
            )
            .await;
        }

        result.success = false;
        result.error_stage = Some(stage);
        result.error_message = Some(message.to_owned());
        result.programming_error = matches!(failure, StageFailure::Programming(_));
        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use riftcoach_core::bundle::FrameStat;
    use riftcoach_core::config::{DegradationConfig, FeatureFlags};
    use riftcoach_core::{MatchDetail, MatchTimeline, Participant, TimelineFrame};
    use riftcoach_discord::InteractionReply;
    use riftcoach_llm::MockNarrator;
    use riftcoach_store_memory::MemoryAnalysisStore;

    use super::*;

    // -- Scripted collaborators ------------------------------------------

    struct ScriptedSource {
        details: Mutex<VecDeque<Result<MatchDetail, RiotError>>>,
        timelines: Mutex<VecDeque<Result<MatchTimeline, RiotError>>>,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                details: Mutex::new(VecDeque::new()),
                timelines: Mutex::new(VecDeque::new()),
            }
        }

        fn push_bundle(&self, bundle: &MatchBundle) {
            self.details
                .lock()
                .unwrap()
                .push_back(Ok(bundle.detail.clone()));
            self.timelines
                .lock()
                .unwrap()
                .push_back(Ok(bundle.timeline.clone()));
        }

        fn push_detail_err(&self, err: RiotError) {
            self.details.lock().unwrap().push_back(Err(err));
        }
    }

    #[async_trait]
    impl MatchSource for ScriptedSource {
        async fn get_match_detail(
            &self,
            _match_id: &str,
            _region: &str,
        ) -> Result<MatchDetail, RiotError> {
            self.details.lock().unwrap().pop_front().unwrap_or(Err(RiotError::Api {
                status: 500,
                body: "script exhausted".into(),
            }))
        }

        async fn get_match_timeline(
            &self,
            _match_id: &str,
            _region: &str,
        ) -> Result<MatchTimeline, RiotError> {
            self.timelines.lock().unwrap().pop_front().unwrap_or(Err(RiotError::Api {
                status: 500,
                body: "script exhausted".into(),
            }))
        }
    }

    struct ScriptedSink {
        outcomes: Mutex<VecDeque<DeliveryOutcome>>,
        deliveries: Mutex<Vec<(String, String, InteractionReply)>>,
    }

    impl ScriptedSink {
        fn delivering() -> Self {
            Self {
                outcomes: Mutex::new(VecDeque::new()),
                deliveries: Mutex::new(Vec::new()),
            }
        }

        fn push_outcome(&self, outcome: DeliveryOutcome) {
            self.outcomes.lock().unwrap().push_back(outcome);
        }

        fn deliveries(&self) -> Vec<(String, String, InteractionReply)> {
            self.deliveries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliverySink for ScriptedSink {
        async fn edit_original(
            &self,
            application_id: &str,
            interaction_token: &str,
            reply: &InteractionReply,
        ) -> DeliveryOutcome {
            self.deliveries.lock().unwrap().push((
                application_id.to_owned(),
                interaction_token.to_owned(),
                reply.clone(),
            ));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(DeliveryOutcome::Delivered)
        }
    }

    // -- Fixtures --------------------------------------------------------

    fn participant(id: u32, team: u32) -> Participant {
        Participant {
            participant_id: id,
            summoner_identifier: format!("p{id}#na"),
            champion: if id == 1 { "Ahri".into() } else { format!("Champ{id}") },
            team_id: team,
            win: team == 100,
            kills: 4 + id % 3,
            deaths: 2 + id % 2,
            assists: 6,
            damage_to_champions: 15_000 + u64::from(id) * 1_000,
            gold_earned: 11_000 + u64::from(id) * 500,
            minions_killed: 150 + id * 10,
            vision_score: 20 + id,
            wards_placed: 8,
            turret_takedowns: 2,
            dragon_takedowns: 1,
            baron_takedowns: 0,
        }
    }

    fn classic_bundle() -> MatchBundle {
        MatchBundle {
            detail: MatchDetail {
                match_id: "NA1_1001".into(),
                queue_id: 420,
                game_duration_secs: 1800,
                participants: (1..=10)
                    .map(|i| participant(i, if i <= 5 { 100 } else { 200 }))
                    .collect(),
            },
            timeline: MatchTimeline {
                frames: vec![TimelineFrame {
                    minute: 10,
                    participants: vec![FrameStat {
                        participant_id: 1,
                        total_gold: 4000,
                        xp: 5000,
                    }],
                }],
            },
        }
    }

    fn arena_bundle() -> MatchBundle {
        MatchBundle {
            detail: MatchDetail {
                match_id: "NA1_1700".into(),
                queue_id: 1700,
                game_duration_secs: 900,
                participants: vec![participant(1, 100), participant(2, 100)],
            },
            timeline: MatchTimeline::default(),
        }
    }

    fn request_for(bundle: &MatchBundle) -> AnalysisRequest {
        AnalysisRequest::new(
            bundle.detail.match_id.clone(),
            "na1",
            "p1#na",
            "tok-abc",
            "app-1",
        )
    }

    fn valid_narrative(text: &str) -> serde_json::Value {
        serde_json::json!({
            "narrative": text,
            "tts_summary": "Quick summary.",
            "highlights": ["good fights"],
            "improvements": ["ward more"]
        })
    }

    struct Harness {
        task: AnalyzeMatch,
        source: Arc<ScriptedSource>,
        store: Arc<MemoryAnalysisStore>,
        narrator: Arc<MockNarrator>,
        sink: Arc<ScriptedSink>,
    }

    fn harness() -> Harness {
        harness_with_config(PipelineConfig::default())
    }

    fn harness_with_config(config: PipelineConfig) -> Harness {
        let source = Arc::new(ScriptedSource::new());
        let store = Arc::new(MemoryAnalysisStore::new());
        let narrator = Arc::new(MockNarrator::default());
        let sink = Arc::new(ScriptedSink::delivering());
        let task = AnalyzeMatch::new(
            Arc::clone(&source) as Arc<dyn MatchSource>,
            Arc::clone(&store) as Arc<dyn AnalysisStore>,
            Arc::clone(&narrator) as Arc<dyn Narrator>,
            Arc::clone(&sink) as Arc<dyn DeliverySink>,
            Arc::new(StrategyFactory::new(FeatureFlags::default())),
            config,
            Arc::new(PipelineMetrics::default()),
        );
        Harness {
            task,
            source,
            store,
            narrator,
            sink,
        }
    }

    // -- End-to-end scenarios --------------------------------------------

    #[tokio::test]
    async fn classic_victory_end_to_end() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.narrator
            .push_ok(valid_narrative("Solid control of the mid lane. Keep it up."));

        let result = h.task.run(request_for(&bundle)).await;

        assert!(result.success);
        assert!(result.delivered);
        assert!(!result.degradation.any());
        assert!(result.error_stage.is_none());
        for stage in ["fetch", "score", "persist", "narrate", "deliver"] {
            assert!(
                result.stage_durations_ms.contains_key(stage),
                "missing duration for {stage}"
            );
        }

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::Completed);
        assert_eq!(row.mode, "classic");
        assert!(row.narrative_text.as_deref().unwrap().contains("Keep it up"));
        assert_eq!(row.emotion_tag, Some(riftcoach_core::EmotionTag::Encouraging));
        assert_eq!(row.score_data["player_scores"].as_array().unwrap().len(), 10);
        assert!(row.llm_metadata.is_some());
        assert!(!row.degradation_flags.any());

        assert_eq!(h.narrator.call_count(), 1);
        assert_eq!(h.sink.deliveries().len(), 1);
        let metrics = h.task.metrics().snapshot();
        assert_eq!(metrics.tasks_completed, 1);
        assert_eq!(metrics.tasks_degraded, 0);
    }

    #[tokio::test]
    async fn arena_compliance_strip() {
        let h = harness();
        let bundle = arena_bundle();
        h.source.push_bundle(&bundle);
        // Valid shape, banned content.
        h.narrator
            .push_ok(valid_narrative("打得不错，你下一局胜率更高。"));

        let result = h.task.run(request_for(&bundle)).await;

        assert!(result.success);
        assert!(result.degradation.arena_compliance);
        assert!(!result.degradation.llm_template);
        assert_eq!(h.narrator.call_count(), 1, "no strict retry on compliance");

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1700", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::Completed);
        assert!(row.degradation_flags.arena_compliance);
        // The banned text never reaches the persisted narrative.
        assert!(!row.narrative_text.as_deref().unwrap().contains("胜率"));

        let metrics = h.task.metrics().snapshot();
        assert_eq!(metrics.compliance_rejections, 1);
    }

    #[tokio::test]
    async fn transient_fetch_failure_fails_task_with_error_webhook() {
        let h = harness();
        h.source.push_detail_err(RiotError::RateLimited {
            retry_after: Duration::from_secs(5),
        });

        let bundle = classic_bundle();
        let result = h.task.run(request_for(&bundle)).await;

        assert!(!result.success);
        assert_eq!(result.error_stage, Some(Stage::Fetch));
        assert!(!result.programming_error);

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::Failed);
        assert!(row.error_message.as_deref().unwrap().contains("rate limited"));

        // One best-effort error embed.
        let deliveries = h.sink.deliveries();
        assert_eq!(deliveries.len(), 1);
        let embed_text = serde_json::to_string(&deliveries[0].2).unwrap();
        assert!(embed_text.contains("analysis failed"));
        assert_eq!(h.task.metrics().snapshot().tasks_failed, 1);
    }

    #[tokio::test]
    async fn permanent_fetch_404_is_fatal() {
        let h = harness();
        h.source.push_detail_err(RiotError::NotFound("NA1_1001".into()));

        let bundle = classic_bundle();
        let result = h.task.run(request_for(&bundle)).await;

        assert!(!result.success);
        assert_eq!(result.error_stage, Some(Stage::Fetch));
        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert!(row.error_message.as_deref().unwrap().contains("not found"));
        // No LLM call was wasted.
        assert_eq!(h.narrator.call_count(), 0);
    }

    #[tokio::test]
    async fn llm_invalid_twice_degrades_to_template() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.narrator.push_ok(serde_json::json!({"oops": true}));
        h.narrator.push_ok(serde_json::json!({"still": "wrong"}));

        let result = h.task.run(request_for(&bundle)).await;

        assert!(result.success, "degradation is not failure");
        assert!(result.degradation.llm_template);
        assert!(result.delivered);

        assert_eq!(h.narrator.call_count(), 2);
        let requests = h.narrator.requests();
        assert!(!requests[0].system.contains("STRICT JSON"));
        assert!(requests[1].system.contains("STRICT JSON"));

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::Completed);
        assert!(row.degradation_flags.llm_template);
        // Template narrative carries the numbers.
        assert!(row.narrative_text.as_deref().unwrap().contains("Overall score"));

        let metrics = h.task.metrics().snapshot();
        assert_eq!(metrics.llm_schema_retries, 1);
        assert_eq!(metrics.llm_template_degraded, 1);
        assert_eq!(metrics.tasks_degraded, 1);
    }

    #[tokio::test]
    async fn llm_recovers_on_strict_retry() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.narrator.push_ok(serde_json::json!({"oops": true}));
        h.narrator.push_ok(valid_narrative("Clean second attempt."));

        let result = h.task.run(request_for(&bundle)).await;

        assert!(result.success);
        assert!(!result.degradation.any());
        assert_eq!(h.narrator.call_count(), 2);

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert!(row.narrative_text.as_deref().unwrap().contains("second attempt"));
    }

    #[tokio::test]
    async fn transport_failure_degrades_without_strict_retry() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.narrator.push_err(NarratorError::Api("HTTP 500".into()));

        let result = h.task.run(request_for(&bundle)).await;

        assert!(result.success);
        assert!(result.degradation.llm_template);
        // Transport failures get no strict retry; only schema violations do.
        assert_eq!(h.narrator.call_count(), 1);
        assert_eq!(h.task.metrics().snapshot().llm_schema_retries, 0);
    }

    #[tokio::test]
    async fn template_disabled_makes_degradation_fatal() {
        let config = PipelineConfig {
            degradation: DegradationConfig {
                template_enabled: false,
            },
            ..PipelineConfig::default()
        };
        let h = harness_with_config(config);
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.narrator.push_ok(serde_json::json!({"oops": 1}));
        h.narrator.push_ok(serde_json::json!({"oops": 2}));

        let result = h.task.run(request_for(&bundle)).await;

        assert!(!result.success);
        assert_eq!(result.error_stage, Some(Stage::Narrate));
        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::Failed);
    }

    #[tokio::test]
    async fn token_expired_at_delivery() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.narrator.push_ok(valid_narrative("Good game."));
        h.sink.push_outcome(DeliveryOutcome::TokenExpired);

        let result = h.task.run(request_for(&bundle)).await;

        assert!(result.success);
        assert!(!result.delivered);

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::CompletedNoDelivery);
        // The row is fully populated for a later re-issue.
        assert!(row.narrative_text.is_some());
        assert!(row.tts_summary.is_some());
        assert_eq!(h.task.metrics().snapshot().deliveries_expired, 1);
    }

    #[tokio::test]
    async fn ttl_elapsed_skips_delivery_entirely() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.narrator.push_ok(valid_narrative("Good game."));

        let mut request = request_for(&bundle);
        request.requested_at = Utc::now() - chrono::Duration::minutes(16);

        let result = h.task.run(request).await;

        assert!(result.success);
        assert!(!result.delivered);
        // Stage 5 never touched the sink.
        assert!(h.sink.deliveries().is_empty());
        assert!(!result.stage_durations_ms.contains_key("deliver"));

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::CompletedNoDelivery);
        assert!(row.narrative_text.is_some());
    }

    #[tokio::test]
    async fn transient_delivery_failure_keeps_record() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.narrator.push_ok(valid_narrative("Good game."));
        h.sink.push_outcome(DeliveryOutcome::Transient {
            status: Some(503),
            message: "try later".into(),
        });

        let result = h.task.run(request_for(&bundle)).await;

        assert!(result.success);
        assert!(!result.delivered);
        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::CompletedNoDelivery);
        assert_eq!(h.task.metrics().snapshot().deliveries_transient, 1);
    }

    #[tokio::test]
    async fn unknown_mode_uses_fallback_without_llm() {
        let h = harness();
        let mut bundle = classic_bundle();
        bundle.detail.queue_id = 9999;
        h.source.push_bundle(&bundle);

        let result = h.task.run(request_for(&bundle)).await;

        assert!(result.success);
        assert!(result.degradation.fallback_strategy);
        assert_eq!(h.narrator.call_count(), 0, "no LLM call for fallback");

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::Completed);
        assert_eq!(row.mode, "fallback");
        assert!(
            row.narrative_text
                .as_deref()
                .unwrap()
                .contains("not available for this game mode")
        );

        // The reply names the unsupported mode.
        let deliveries = h.sink.deliveries();
        let embed_text = serde_json::to_string(&deliveries[0].2).unwrap();
        assert!(embed_text.contains("mode not supported"));
        assert_eq!(h.task.metrics().snapshot().fallback_selected, 1);
    }

    #[tokio::test]
    async fn reanalysis_updates_in_place_and_redelivers() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);
        h.source.push_bundle(&bundle);
        h.narrator.push_ok(valid_narrative("First pass."));
        h.narrator.push_ok(valid_narrative("Second pass."));

        let first = h.task.run(request_for(&bundle)).await;
        let key = RecordKey::new("NA1_1001", "p1#na");
        let original = h.store.get_record(&key).await.unwrap().unwrap();

        let second = h.task.run(request_for(&bundle)).await;
        assert!(first.success && second.success);

        // Exactly one row, created_at preserved, narrative replaced.
        assert_eq!(h.store.len(), 1);
        let row = h.store.get_record(&key).await.unwrap().unwrap();
        assert_eq!(row.created_at, original.created_at);
        assert!(row.narrative_text.as_deref().unwrap().contains("Second pass"));
        assert!(row.updated_at >= original.updated_at);

        // The webhook was PATCHed once per run.
        assert_eq!(h.sink.deliveries().len(), 2);
    }

    #[tokio::test]
    async fn requester_not_in_match_is_permanent() {
        let h = harness();
        let bundle = classic_bundle();
        h.source.push_bundle(&bundle);

        let mut request = request_for(&bundle);
        request.requester_id = "stranger#eu".into();

        let result = h.task.run(request).await;

        assert!(!result.success);
        assert_eq!(result.error_stage, Some(Stage::Score));
        assert!(!result.programming_error);
        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "stranger#eu"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AnalysisStatus::Failed);
        assert!(
            row.error_message
                .as_deref()
                .unwrap()
                .contains("not a participant")
        );
    }

    #[tokio::test]
    async fn invalid_bundle_is_permanent() {
        let h = harness();
        let mut bundle = classic_bundle();
        bundle.detail.participants.truncate(7);
        h.source.push_bundle(&bundle);

        let result = h.task.run(request_for(&bundle)).await;

        assert!(!result.success);
        assert_eq!(result.error_stage, Some(Stage::Fetch));
        assert!(
            result
                .error_message
                .as_deref()
                .unwrap()
                .contains("participant count")
        );
    }

    #[tokio::test]
    async fn blind_mode_omits_vision_from_narrative_inputs() {
        let h = harness();
        let mut bundle = classic_bundle();
        bundle.detail.queue_id = 450;
        h.source.push_bundle(&bundle);
        h.narrator.push_ok(valid_narrative("All-in brawling paid off."));

        let result = h.task.run(request_for(&bundle)).await;
        assert!(result.success);

        let requests = h.narrator.requests();
        assert!(!requests[0].user.contains("vision"));
        assert!(!requests[0].user.contains("objectives"));

        let row = h
            .store
            .get_record(&RecordKey::new("NA1_1001", "p1#na"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.mode, "blind_mode");
    }
}
