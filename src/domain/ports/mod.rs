//! Port trait definitions (hexagonal architecture).
//!
//! These traits are the seams between the pure selection logic and the
//! outside world: durable storage and randomness. Adapters implement
//! them; tests substitute deterministic fakes.

pub mod posterior_store;
pub mod random;

pub use posterior_store::{
    BaselineComparison, PosteriorStore, StoreSummary, TokenUsageBucket, TraceFilter,
};
pub use random::{RandomSource, SeededLcg, ThreadRandom};
