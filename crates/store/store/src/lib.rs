//! Analysis persistence: the [`AnalysisStore`] trait, its error type, and a
//! conformance suite backends run from their own test modules.

pub mod error;
pub mod store;
pub mod testing;

pub use error::StoreError;
pub use store::{AnalysisStore, UpsertOutcome};
