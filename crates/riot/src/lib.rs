//! Vendor match API client.
//!
//! Wraps the regional match endpoints behind the [`MatchSource`] trait,
//! enforcing the vendor's published per-region rate limits with a
//! dual-window token bucket shared process-wide, honoring `Retry-After` on
//! 429, and backing off exponentially on 5xx.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod rate_limit;
pub mod source;

pub use client::RiotClient;
pub use config::RiotConfig;
pub use error::RiotError;
pub use metrics::FetchMetrics;
pub use rate_limit::RegionLimiters;
pub use source::MatchSource;
