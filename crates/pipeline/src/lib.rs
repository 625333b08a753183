//! The asynchronous analysis pipeline.
//!
//! [`AnalyzeMatch`] is the canonical orchestrator: five sequential stages
//! (fetch, score, persist, narrate, deliver) against injected
//! collaborators, each with its own timeout, retry budget, and failure
//! classification. The surrounding pieces are the [`Dispatcher`] that
//! validates and enqueues requests, the [`TaskQueue`] carrying stable
//! serialized payloads, and the worker loop consuming them under bounded
//! concurrency.

pub mod dispatch;
pub mod metrics;
pub mod observe;
pub mod queue;
pub mod result;
pub mod status;
pub mod task;
pub mod worker;

pub use dispatch::{Ack, Dispatcher, SlashCommand};
pub use metrics::{PipelineMetrics, PipelineMetricsSnapshot};
pub use observe::observed;
pub use queue::{InMemoryTaskQueue, QueueError, TaskQueue, TaskReceiver};
pub use result::{Stage, TaskResult};
pub use status::StatusTracker;
pub use task::AnalyzeMatch;
pub use worker::run_worker;
