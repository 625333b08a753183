//! Narrator client: one structured-JSON completion per analysis.
//!
//! The [`Narrator`] trait hides the vendor; [`HttpNarrator`] speaks an
//! OpenAI-compatible chat-completions API with JSON mode enforced. Output
//! validation against the mode's [`NarrativeSchema`] happens at the call
//! site so the orchestrator owns the strict-retry and degradation policy.

pub mod config;
pub mod emotion;
pub mod error;
pub mod http;
pub mod mock;
pub mod narrator;
pub mod schema;

pub use config::NarratorConfig;
pub use emotion::classify_emotion;
pub use error::NarratorError;
pub use http::HttpNarrator;
pub use mock::{FailingNarrator, MockNarrator};
pub use narrator::{Completion, CompletionRequest, Narrator};
pub use schema::{NarrativeDraft, NarrativeSchema};
