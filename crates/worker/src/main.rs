//! Riftcoach worker.
//!
//! Loads configuration, constructs one set of clients, and consumes the
//! task queue until shutdown. The chat adapter hands slash commands to the
//! [`Dispatcher`]; `--analyze` dispatches a single request from the
//! command line for operational smoke tests.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use riftcoach_core::PipelineConfig;
use riftcoach_discord::{DiscordConfig, InteractionClient};
use riftcoach_llm::{HttpNarrator, NarratorConfig};
use riftcoach_pipeline::{
    Ack, AnalyzeMatch, Dispatcher, InMemoryTaskQueue, PipelineMetrics, SlashCommand, run_worker,
};
use riftcoach_riot::{RegionLimiters, RiotClient, RiotConfig};
use riftcoach_scoring::StrategyFactory;
use riftcoach_store::AnalysisStore;
use riftcoach_store_memory::MemoryAnalysisStore;
use riftcoach_store_postgres::{PostgresAnalysisStore, PostgresConfig};

use crate::config::WorkerSettings;

/// Riftcoach analysis worker.
#[derive(Parser, Debug)]
#[command(name = "riftcoach-worker", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "riftcoach.toml")]
    config: PathBuf,

    /// Dispatch one analysis on startup:
    /// `match_id,region,requester,interaction_token,application_id`.
    #[arg(long)]
    analyze: Option<String>,
}

fn parse_analyze(raw: &str) -> anyhow::Result<SlashCommand> {
    let parts: Vec<&str> = raw.split(',').collect();
    let [match_id, region, requester_id, interaction_token, application_id] = parts.as_slice()
    else {
        anyhow::bail!("--analyze expects match_id,region,requester,token,application_id");
    };
    Ok(SlashCommand {
        match_id: (*match_id).to_owned(),
        region: (*region).to_owned(),
        requester_id: (*requester_id).to_owned(),
        interaction_token: (*interaction_token).to_owned(),
        application_id: (*application_id).to_owned(),
        user_profile: None,
    })
}

fn load_settings(path: &Path) -> anyhow::Result<WorkerSettings> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        Ok(WorkerSettings::default())
    }
}

async fn build_store(pipeline: &PipelineConfig) -> anyhow::Result<Arc<dyn AnalysisStore>> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let config = PostgresConfig {
                url,
                pool_size: PostgresConfig::pool_size_for_concurrency(
                    pipeline.worker_concurrency(),
                ),
                ..PostgresConfig::default()
            };
            let store = PostgresAnalysisStore::new(config)
                .await
                .context("connecting to PostgreSQL")?;
            info!("analysis store: postgres");
            Ok(Arc::new(store))
        }
        Err(_) => {
            warn!("DATABASE_URL not set, analyses will not survive restarts");
            Ok(Arc::new(MemoryAnalysisStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;
    let pipeline_config = settings.pipeline.clone();

    let riot_api_key = std::env::var("RIOT_API_TOKEN").context("RIOT_API_TOKEN must be set")?;
    let llm_api_key = std::env::var("LLM_API_KEY").context("LLM_API_KEY must be set")?;

    let limiters = Arc::new(RegionLimiters::new(pipeline_config.rate_limit.clone()));
    let riot = RiotClient::new(
        RiotConfig::new(riot_api_key)
            .with_timeout(pipeline_config.stage_timeout.fetch())
            .with_max_attempts(pipeline_config.retry.fetch_max_attempts),
        limiters,
    )?;

    let narrator = HttpNarrator::new(
        NarratorConfig::new(
            settings.llm_endpoint(),
            pipeline_config.llm.model_id.clone(),
            llm_api_key,
        )
        .with_timeout(pipeline_config.stage_timeout.narrate_secs)
        .with_temperature(pipeline_config.llm.temperature)
        .with_max_tokens(pipeline_config.llm.max_output_tokens),
    )?;

    let discord_config = settings.discord_api_base.as_ref().map_or_else(
        DiscordConfig::default,
        DiscordConfig::with_api_base,
    );
    let delivery = InteractionClient::new(
        discord_config.with_timeout(pipeline_config.stage_timeout.deliver()),
    )?;

    let store = build_store(&pipeline_config).await?;
    let metrics = Arc::new(PipelineMetrics::default());

    let task = Arc::new(AnalyzeMatch::new(
        Arc::new(riot),
        store,
        Arc::new(narrator),
        Arc::new(delivery),
        Arc::new(StrategyFactory::new(pipeline_config.feature.clone())),
        pipeline_config.clone(),
        Arc::clone(&metrics),
    ));

    let (queue, receiver) = InMemoryTaskQueue::bounded(settings.queue_capacity());
    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::clone(&metrics));

    if let Some(raw) = cli.analyze.as_deref() {
        let command = parse_analyze(raw)?;
        match dispatcher.dispatch(command).await {
            Ack::Deferred { request_id } => info!(%request_id, "smoke-test analysis enqueued"),
            Ack::Invalid { message } => anyhow::bail!("invalid --analyze arguments: {message}"),
            Ack::Busy => anyhow::bail!("queue unavailable"),
        }
    }

    let concurrency = pipeline_config.worker_concurrency();
    let worker = tokio::spawn(run_worker(receiver, task, concurrency));

    info!("riftcoach worker ready, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("shutting down, draining in-flight analyses");

    // Dropping the dispatcher closes the queue; the worker drains and exits.
    drop(dispatcher);
    worker.await.context("worker task panicked")?;

    let snapshot = metrics.snapshot();
    info!(
        completed = snapshot.tasks_completed,
        failed = snapshot.tasks_failed,
        degraded = snapshot.tasks_degraded,
        "worker stopped"
    );
    Ok(())
}
