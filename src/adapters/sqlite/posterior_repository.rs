//! SQLite implementation of the `PosteriorStore` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ArmId, ArmPosterior, BetaParams, RunTrace, TokenUsage, TraceArm};
use crate::domain::ports::{
    BaselineComparison, PosteriorStore, StoreSummary, TokenUsageBucket, TraceFilter,
};

/// SQLite-backed posterior and trace repository.
#[derive(Clone)]
pub struct SqlitePosteriorStore {
    pool: SqlitePool,
}

impl SqlitePosteriorStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_posterior(row: PosteriorRow) -> DomainResult<ArmPosterior> {
        let last_updated = DateTime::parse_from_rfc3339(&row.last_updated)?.with_timezone(&Utc);
        Ok(ArmPosterior {
            arm_id: ArmId::from_key(row.arm_id),
            params: BetaParams::new(row.alpha, row.beta),
            pulls: u64::try_from(row.pulls).unwrap_or(0),
            last_updated,
        })
    }

    fn row_to_trace(row: TraceRow) -> DomainResult<RunTrace> {
        let trace_id = Uuid::parse_str(&row.trace_id)
            .map_err(|e| DomainError::Database(format!("Invalid trace id: {e}")))?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)?.with_timezone(&Utc);
        let arms: Vec<TraceArm> = serde_json::from_str(&row.arms_json)?;

        Ok(RunTrace {
            trace_id,
            run_id: row.run_id,
            session_id: row.session_id,
            timestamp,
            is_baseline: row.is_baseline != 0,
            arms,
            usage: TokenUsage {
                input: u64::try_from(row.input_tokens).unwrap_or(0),
                output: u64::try_from(row.output_tokens).unwrap_or(0),
                total: u64::try_from(row.total_tokens).unwrap_or(0),
            },
            system_prompt_chars: u64::try_from(row.system_prompt_chars).unwrap_or(0),
            duration_ms: row.duration_ms.and_then(|d| u64::try_from(d).ok()),
            aborted: row.aborted != 0,
            error: row.error,
        })
    }
}

#[async_trait]
impl PosteriorStore for SqlitePosteriorStore {
    async fn get_posterior(&self, arm_id: &ArmId) -> DomainResult<Option<ArmPosterior>> {
        let row: Option<PosteriorRow> = sqlx::query_as(
            "SELECT arm_id, alpha, beta, pulls, last_updated FROM arm_posteriors WHERE arm_id = ?",
        )
        .bind(arm_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_posterior).transpose()
    }

    async fn upsert_posterior(&self, posterior: &ArmPosterior) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO arm_posteriors (arm_id, alpha, beta, pulls, last_updated)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(arm_id) DO UPDATE SET
                alpha = excluded.alpha,
                beta = excluded.beta,
                pulls = excluded.pulls,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(posterior.arm_id.as_str())
        .bind(posterior.params.alpha)
        .bind(posterior.params.beta)
        .bind(i64::try_from(posterior.pulls).unwrap_or(i64::MAX))
        .bind(posterior.last_updated.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_posteriors(&self) -> DomainResult<HashMap<ArmId, ArmPosterior>> {
        let rows: Vec<PosteriorRow> =
            sqlx::query_as("SELECT arm_id, alpha, beta, pulls, last_updated FROM arm_posteriors")
                .fetch_all(&self.pool)
                .await?;

        let mut posteriors = HashMap::with_capacity(rows.len());
        for row in rows {
            let posterior = Self::row_to_posterior(row)?;
            posteriors.insert(posterior.arm_id.clone(), posterior);
        }
        Ok(posteriors)
    }

    async fn insert_trace(&self, trace: &RunTrace) -> DomainResult<()> {
        let arms_json = serde_json::to_string(&trace.arms)?;

        sqlx::query(
            r#"
            INSERT INTO run_traces (
                trace_id, run_id, session_id, timestamp, is_baseline, arms_json,
                input_tokens, output_tokens, total_tokens, system_prompt_chars,
                duration_ms, aborted, error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(trace.trace_id.to_string())
        .bind(&trace.run_id)
        .bind(&trace.session_id)
        .bind(trace.timestamp.to_rfc3339())
        .bind(i32::from(trace.is_baseline))
        .bind(arms_json)
        .bind(i64::try_from(trace.usage.input).unwrap_or(i64::MAX))
        .bind(i64::try_from(trace.usage.output).unwrap_or(i64::MAX))
        .bind(i64::try_from(trace.usage.total).unwrap_or(i64::MAX))
        .bind(i64::try_from(trace.system_prompt_chars).unwrap_or(i64::MAX))
        .bind(trace.duration_ms.and_then(|d| i64::try_from(d).ok()))
        .bind(i32::from(trace.aborted))
        .bind(&trace.error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_trace(&self, trace_id: Uuid) -> DomainResult<Option<RunTrace>> {
        let row: Option<TraceRow> = sqlx::query_as(
            "SELECT trace_id, run_id, session_id, timestamp, is_baseline, arms_json, \
             input_tokens, output_tokens, total_tokens, system_prompt_chars, \
             duration_ms, aborted, error FROM run_traces WHERE trace_id = ?",
        )
        .bind(trace_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_trace).transpose()
    }

    async fn list_traces(&self, filter: TraceFilter) -> DomainResult<Vec<RunTrace>> {
        let mut sql = String::from(
            "SELECT trace_id, run_id, session_id, timestamp, is_baseline, arms_json, \
             input_tokens, output_tokens, total_tokens, system_prompt_chars, \
             duration_ms, aborted, error FROM run_traces",
        );
        if filter.session_key.is_some() {
            sql.push_str(" WHERE session_id = ?");
        }
        // LIMIT -1 is SQLite's "no limit".
        sql.push_str(" ORDER BY timestamp DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, TraceRow>(&sql);
        if let Some(ref session) = filter.session_key {
            query = query.bind(session.clone());
        }
        let rows = query
            .bind(filter.limit.map_or(-1_i64, i64::from))
            .bind(filter.offset.map_or(0_i64, i64::from))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_trace).collect()
    }

    async fn count_traces(&self) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM run_traces")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn summary(&self) -> DomainResult<StoreSummary> {
        let (trace_count, total_tokens, avg_tokens, oldest, newest): (
            i64,
            Option<i64>,
            Option<f64>,
            Option<String>,
            Option<String>,
        ) = sqlx::query_as(
            "SELECT COUNT(*), SUM(total_tokens), AVG(total_tokens), \
             MIN(timestamp), MAX(timestamp) FROM run_traces",
        )
        .fetch_one(&self.pool)
        .await?;

        let (arm_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM arm_posteriors")
            .fetch_one(&self.pool)
            .await?;

        let parse = |ts: Option<String>| -> DomainResult<Option<DateTime<Utc>>> {
            ts.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(DomainError::from)
            })
            .transpose()
        };

        Ok(StoreSummary {
            trace_count: u64::try_from(trace_count).unwrap_or(0),
            arm_count: u64::try_from(arm_count).unwrap_or(0),
            total_tokens: total_tokens.and_then(|t| u64::try_from(t).ok()).unwrap_or(0),
            avg_tokens: avg_tokens.unwrap_or(0.0),
            oldest: parse(oldest)?,
            newest: parse(newest)?,
        })
    }

    async fn baseline_comparison(&self) -> DomainResult<BaselineComparison> {
        // AVG over a CASE expression ignores the NULLs produced by the
        // other branch, giving per-group means in one pass.
        let (baseline_runs, selected_runs, baseline_avg, selected_avg): (
            i64,
            i64,
            Option<f64>,
            Option<f64>,
        ) = sqlx::query_as(
            "SELECT \
             COALESCE(SUM(CASE WHEN is_baseline = 1 THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN is_baseline = 0 THEN 1 ELSE 0 END), 0), \
             AVG(CASE WHEN is_baseline = 1 THEN total_tokens END), \
             AVG(CASE WHEN is_baseline = 0 THEN total_tokens END) \
             FROM run_traces WHERE aborted = 0",
        )
        .fetch_one(&self.pool)
        .await?;

        let baseline_avg_tokens = baseline_avg.unwrap_or(0.0);
        let selected_avg_tokens = selected_avg.unwrap_or(0.0);
        let token_savings_percent = match baseline_avg {
            Some(b) if b > 0.0 => Some((b - selected_avg_tokens) / b * 100.0),
            _ => None,
        };

        Ok(BaselineComparison {
            baseline_avg_tokens,
            selected_avg_tokens,
            token_savings_percent,
            baseline_runs: u64::try_from(baseline_runs).unwrap_or(0),
            selected_runs: u64::try_from(selected_runs).unwrap_or(0),
        })
    }

    async fn token_usage_series(&self, bucket_secs: u64) -> DomainResult<Vec<TokenUsageBucket>> {
        let bucket = i64::try_from(bucket_secs.max(1)).unwrap_or(i64::MAX);

        let rows: Vec<(i64, i64, Option<i64>, Option<f64>)> = sqlx::query_as(
            "SELECT (CAST(strftime('%s', timestamp) AS INTEGER) / ?1) * ?1 AS bucket_start, \
             COUNT(*), SUM(total_tokens), AVG(total_tokens) \
             FROM run_traces GROUP BY bucket_start ORDER BY bucket_start ASC",
        )
        .bind(bucket)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(start, runs, total, avg)| {
                DateTime::from_timestamp(start, 0).map(|bucket_start| TokenUsageBucket {
                    bucket_start,
                    runs: u64::try_from(runs).unwrap_or(0),
                    total_tokens: total.and_then(|t| u64::try_from(t).ok()).unwrap_or(0),
                    avg_tokens: avg.unwrap_or(0.0),
                })
            })
            .collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PosteriorRow {
    arm_id: String,
    alpha: f64,
    beta: f64,
    pulls: i64,
    last_updated: String,
}

#[derive(Debug, sqlx::FromRow)]
struct TraceRow {
    trace_id: String,
    run_id: String,
    session_id: String,
    timestamp: String,
    is_baseline: i32,
    arms_json: String,
    input_tokens: i64,
    output_tokens: i64,
    total_tokens: i64,
    system_prompt_chars: i64,
    duration_ms: Option<i64>,
    aborted: i32,
    error: Option<String>,
}
