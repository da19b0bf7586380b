//! Port trait for durable posterior and trace storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ArmId, ArmPosterior, RunTrace};

/// Filter and pagination for trace listings.
#[derive(Debug, Clone, Default)]
pub struct TraceFilter {
    /// Restrict to one session.
    pub session_key: Option<String>,
    /// Maximum rows to return.
    pub limit: Option<u32>,
    /// Rows to skip before returning.
    pub offset: Option<u32>,
}

/// Store-wide aggregate counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSummary {
    /// Number of recorded traces.
    pub trace_count: u64,
    /// Number of distinct arms with a posterior row.
    pub arm_count: u64,
    /// Sum of total tokens across traces.
    pub total_tokens: u64,
    /// Mean total tokens per trace; 0 when the store is empty.
    pub avg_tokens: f64,
    /// Oldest trace timestamp.
    pub oldest: Option<DateTime<Utc>>,
    /// Newest trace timestamp.
    pub newest: Option<DateTime<Utc>>,
}

/// Baseline-vs-selected token comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaselineComparison {
    /// Mean total tokens across baseline runs.
    pub baseline_avg_tokens: f64,
    /// Mean total tokens across selected runs.
    pub selected_avg_tokens: f64,
    /// Percent saved by selection, `(b - s) / b * 100`; `None` when no
    /// baseline rows exist.
    pub token_savings_percent: Option<f64>,
    /// Number of baseline runs.
    pub baseline_runs: u64,
    /// Number of selected runs.
    pub selected_runs: u64,
}

/// One bucket in a time-bucketed token-usage series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsageBucket {
    /// Start of the bucket.
    pub bucket_start: DateTime<Utc>,
    /// Runs that fell into the bucket.
    pub runs: u64,
    /// Sum of total tokens in the bucket.
    pub total_tokens: u64,
    /// Mean total tokens per run in the bucket.
    pub avg_tokens: f64,
}

/// Durable, queryable storage for per-arm posteriors and per-run traces.
///
/// Posteriors are mutated only via upsert-by-key, so concurrent updates
/// to different arms are independent and same-arm updates are
/// last-writer-wins. Traces are append-only. All aggregations tolerate
/// an empty store.
#[async_trait]
pub trait PosteriorStore: Send + Sync {
    /// Point lookup of one arm's posterior.
    async fn get_posterior(&self, arm_id: &ArmId) -> DomainResult<Option<ArmPosterior>>;

    /// Insert or replace one arm's posterior.
    async fn upsert_posterior(&self, posterior: &ArmPosterior) -> DomainResult<()>;

    /// Load every posterior as a map keyed by arm id.
    async fn load_posteriors(&self) -> DomainResult<HashMap<ArmId, ArmPosterior>>;

    /// Append one run trace.
    async fn insert_trace(&self, trace: &RunTrace) -> DomainResult<()>;

    /// Look up one trace by id.
    async fn get_trace(&self, trace_id: Uuid) -> DomainResult<Option<RunTrace>>;

    /// List traces newest-first, optionally filtered and paginated.
    async fn list_traces(&self, filter: TraceFilter) -> DomainResult<Vec<RunTrace>>;

    /// Total number of recorded traces.
    async fn count_traces(&self) -> DomainResult<u64>;

    /// Store-wide aggregate counters.
    async fn summary(&self) -> DomainResult<StoreSummary>;

    /// Average-token comparison between baseline and selected runs.
    /// Aborted turns are excluded on both sides: their token totals
    /// reflect an interrupted turn, not what either policy costs.
    async fn baseline_comparison(&self) -> DomainResult<BaselineComparison>;

    /// Token usage grouped into fixed-width time buckets.
    async fn token_usage_series(&self, bucket_secs: u64) -> DomainResult<Vec<TokenUsageBucket>>;
}
