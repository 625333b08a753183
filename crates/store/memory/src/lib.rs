//! In-memory analysis store backed by a `DashMap`.

pub mod store;

pub use store::MemoryAnalysisStore;
