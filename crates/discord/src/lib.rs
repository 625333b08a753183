//! Deferred-interaction delivery.
//!
//! One PATCH against the chat platform's `@original` webhook message per
//! analysis. The client never retries: the edit is self-idempotent, and a
//! second PATCH racing a first risks double-editing. Reply rendering from
//! an [`AnalysisReport`](riftcoach_core::AnalysisReport) is a pure
//! function kept beside the client.

pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod types;

pub use client::{DeliveryOutcome, DeliverySink, InteractionClient};
pub use config::DiscordConfig;
pub use error::DiscordError;
pub use render::{render_error, render_report};
pub use types::{Embed, EmbedField, EmbedFooter, InteractionReply};
