//! Integration tests for the SQLite posterior store against a real
//! on-disk database.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use loadout::adapters::sqlite::{
    all_embedded_migrations, create_pool, Migrator, SqlitePosteriorStore,
};
use loadout::domain::models::{ArmId, ArmKind, ArmPosterior, BetaParams, RunTrace, TokenUsage, TraceArm};
use loadout::domain::ports::{PosteriorStore, TraceFilter};

async fn setup_store(dir: &tempfile::TempDir) -> SqlitePosteriorStore {
    let url = format!("sqlite:{}", dir.path().join("loadout.db").display());
    let pool = create_pool(&url, None).await.expect("failed to create pool");
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .expect("failed to run migrations");
    SqlitePosteriorStore::new(pool)
}

fn trace_at(offset_secs: i64, session: &str, total: u64, is_baseline: bool) -> RunTrace {
    RunTrace {
        trace_id: Uuid::new_v4(),
        run_id: format!("run-{offset_secs}"),
        session_id: session.to_string(),
        timestamp: Utc::now() - Duration::seconds(offset_secs),
        is_baseline,
        arms: vec![TraceArm {
            arm_id: ArmId::new(ArmKind::Tool, "exec", "bash"),
            included: true,
            referenced: false,
            token_cost: 200,
        }],
        usage: TokenUsage {
            input: total,
            output: 0,
            total,
        },
        system_prompt_chars: 0,
        duration_ms: None,
        aborted: false,
        error: None,
    }
}

#[tokio::test]
async fn test_posterior_roundtrip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup_store(&dir).await;

    let arm_id = ArmId::new(ArmKind::File, "workspace", "notes.md");
    let posterior = ArmPosterior {
        arm_id: arm_id.clone(),
        params: BetaParams::new(2.5, 3.5),
        pulls: 4,
        last_updated: Utc::now(),
    };
    store.upsert_posterior(&posterior).await.unwrap();

    let loaded = store.get_posterior(&arm_id).await.unwrap().unwrap();
    assert!((loaded.params.alpha - 2.5).abs() < f64::EPSILON);
    assert!((loaded.params.beta - 3.5).abs() < f64::EPSILON);
    assert_eq!(loaded.pulls, 4);
}

#[tokio::test]
async fn test_traces_list_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup_store(&dir).await;

    // Older traces get larger offsets.
    for offset in [300, 200, 100] {
        store
            .insert_trace(&trace_at(offset, "sess", 100, false))
            .await
            .unwrap();
    }

    let traces = store.list_traces(TraceFilter::default()).await.unwrap();
    assert_eq!(traces.len(), 3);
    assert!(traces[0].timestamp > traces[1].timestamp);
    assert!(traces[1].timestamp > traces[2].timestamp);

    let limited = store
        .list_traces(TraceFilter {
            limit: Some(1),
            ..TraceFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].run_id, "run-100");
}

#[tokio::test]
async fn test_summary_and_savings() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup_store(&dir).await;

    store.insert_trace(&trace_at(30, "a", 1000, true)).await.unwrap();
    store.insert_trace(&trace_at(20, "a", 800, false)).await.unwrap();
    store.insert_trace(&trace_at(10, "b", 600, false)).await.unwrap();

    let summary = store.summary().await.unwrap();
    assert_eq!(summary.trace_count, 3);
    assert_eq!(summary.total_tokens, 2400);
    assert!((summary.avg_tokens - 800.0).abs() < f64::EPSILON);
    assert!(summary.oldest.unwrap() < summary.newest.unwrap());

    let cmp = store.baseline_comparison().await.unwrap();
    assert_eq!(cmp.baseline_runs, 1);
    assert_eq!(cmp.selected_runs, 2);
    assert!((cmp.baseline_avg_tokens - 1000.0).abs() < f64::EPSILON);
    assert!((cmp.selected_avg_tokens - 700.0).abs() < f64::EPSILON);
    assert!((cmp.token_savings_percent.unwrap() - 30.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_concurrent_upserts_to_distinct_arms() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(setup_store(&dir).await);

    let mut handles = Vec::new();
    for i in 0..8_u32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let posterior = ArmPosterior {
                arm_id: ArmId::from_key(format!("tool:other:t{i}")),
                params: BetaParams::new(1.0 + f64::from(i), 1.0),
                pulls: u64::from(i),
                last_updated: Utc::now(),
            };
            store.upsert_posterior(&posterior).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let map = store.load_posteriors().await.unwrap();
    assert_eq!(map.len(), 8);
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("loadout.db").display());
    let pool = create_pool(&url, None).await.unwrap();

    let migrator = Migrator::new(pool.clone());
    let first = migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .unwrap();
    assert_eq!(first, 1);

    let second = migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .unwrap();
    assert_eq!(second, 0);
    assert_eq!(migrator.get_current_version().await.unwrap(), 1);
}
