//! Loadout - Adaptive Context Selection
//!
//! Loadout decides which candidate components (tools, skills, context
//! files) an AI agent turn actually carries under a fixed token budget.
//! Each component is an "arm" with a durable Beta-Bernoulli posterior
//! over its usefulness; Thompson Sampling balances exploring uncertain
//! arms against exploiting proven ones, and a counterfactual baseline
//! protocol measures the token savings selection achieves.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): pure models, statistics, and port traits
//! - **Service Layer** (`services`): selection, trace capture, orchestration
//! - **Adapters** (`adapters`): SQLite implementation of the store port
//! - **Infrastructure** (`infrastructure`): config loading and logging
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use loadout::adapters::sqlite::{all_embedded_migrations, create_pool, Migrator, SqlitePosteriorStore};
//! use loadout::domain::models::{LoadoutConfig, SelectionContext};
//! use loadout::domain::ports::ThreadRandom;
//! use loadout::services::{Orchestrator, TurnInventory};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LoadoutConfig::default();
//!     let pool = create_pool("sqlite:.loadout/loadout.db", None).await?;
//!     Migrator::new(pool.clone()).run_embedded_migrations(all_embedded_migrations()).await?;
//!
//!     let store = Arc::new(SqlitePosteriorStore::new(pool));
//!     let orchestrator = Orchestrator::new(config, store, Arc::new(ThreadRandom));
//!
//!     let turn = orchestrator
//!         .select_for_turn(&TurnInventory::default(), SelectionContext::default())
//!         .await;
//!     // ... run the agent turn with turn.tools / turn.skills / turn.files,
//!     // then call orchestrator.observe_turn(...) with what happened.
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience.
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Arm, ArmId, ArmKind, ArmPosterior, ArmSource, BetaParams, LoadoutConfig, Phase, RunTrace,
    SelectionContext, SelectionResult, TokenUsage, TraceArm,
};
pub use domain::ports::{
    BaselineComparison, PosteriorStore, RandomSource, SeededLcg, StoreSummary, ThreadRandom,
    TokenUsageBucket, TraceFilter,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Orchestrator, SelectionEngine, TurnInventory, TurnObservation, TurnSelection};
