//! End-to-end integration: select -> observe -> posterior movement,
//! against the real SQLite store.

use std::sync::Arc;

use loadout::adapters::sqlite::{
    all_embedded_migrations, create_test_pool, Migrator, SqlitePosteriorStore,
};
use loadout::domain::models::{ArmId, LoadoutConfig, Phase, SelectionContext, TokenUsage};
use loadout::domain::ports::{PosteriorStore, SeededLcg, TraceFilter};
use loadout::services::{
    FileCandidate, Orchestrator, SkillCandidate, ToolCandidate, ToolInvocation, TurnInventory,
    TurnObservation,
};

async fn setup_store() -> Arc<SqlitePosteriorStore> {
    let pool = create_test_pool().await.unwrap();
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .unwrap();
    Arc::new(SqlitePosteriorStore::new(pool))
}

fn inventory() -> TurnInventory {
    TurnInventory {
        tools: vec![
            ToolCandidate {
                name: "bash".to_string(),
                declared_cost: Some(150),
            },
            ToolCandidate {
                name: "web_search".to_string(),
                declared_cost: Some(150),
            },
        ],
        skills: vec![SkillCandidate {
            name: "reviewing".to_string(),
            prompt_chars: 2000,
        }],
        files: vec![FileCandidate {
            path: "TODO.md".to_string(),
            content_chars: 1200,
        }],
    }
}

fn context() -> SelectionContext {
    SelectionContext {
        session_key: "session-42".to_string(),
        channel: Some("cli".to_string()),
        model: None,
        provider: None,
    }
}

fn bash_observation() -> TurnObservation {
    TurnObservation {
        run_id: "run-7".to_string(),
        assistant_texts: vec!["ran the build".to_string()],
        tool_invocations: vec![ToolInvocation {
            name: "bash".to_string(),
            arguments: "{\"command\": \"cargo build\"}".to_string(),
        }],
        usage: TokenUsage {
            input: 900,
            output: 200,
            total: 1100,
        },
        system_prompt_chars: 5000,
        duration_ms: Some(2500),
        aborted: false,
        error: None,
    }
}

#[tokio::test]
async fn test_full_cycle_moves_posteriors() {
    let store = setup_store().await;
    let config = LoadoutConfig {
        phase: Phase::Active,
        baseline_rate: 0.0,
        ..LoadoutConfig::default()
    };
    let orch = Orchestrator::new(config, store.clone(), Arc::new(SeededLcg::new(5)));

    let turn = orch.select_for_turn(&inventory(), context()).await;
    // Default budget fits all four candidates.
    assert_eq!(turn.decision.selected.len(), 4);
    assert!(turn.decision.used_tokens <= turn.decision.token_budget);

    let report = orch.observe_turn(&turn, &bash_observation()).await;
    assert!(report.trace_id.is_some());
    assert_eq!(report.outcomes_applied, 4);
    assert!(report.update_failures.is_empty());

    // bash was invoked: its posterior gained a success.
    let bash = store
        .get_posterior(&ArmId::from_key("tool:exec:bash"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bash.pulls, 1);
    assert!((bash.params.alpha - 4.0).abs() < f64::EPSILON);
    assert!((bash.params.beta - 1.0).abs() < f64::EPSILON);

    // web_search was not: it gained a failure.
    let search = store
        .get_posterior(&ArmId::from_key("tool:web:web_search"))
        .await
        .unwrap()
        .unwrap();
    assert!((search.params.alpha - 3.0).abs() < f64::EPSILON);
    assert!((search.params.beta - 2.0).abs() < f64::EPSILON);

    // The trace is queryable by session.
    let traces = store
        .list_traces(TraceFilter {
            session_key: Some("session-42".to_string()),
            ..TraceFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].arms.len(), 4);
    assert!(!traces[0].is_baseline);
}

#[tokio::test]
async fn test_repeated_turns_accumulate_evidence() {
    let store = setup_store().await;
    let config = LoadoutConfig {
        baseline_rate: 0.0,
        ..LoadoutConfig::default()
    };
    let orch = Orchestrator::new(config, store.clone(), Arc::new(SeededLcg::new(9)));

    for _ in 0..6 {
        let turn = orch.select_for_turn(&inventory(), context()).await;
        orch.observe_turn(&turn, &bash_observation()).await;
    }

    let bash = store
        .get_posterior(&ArmId::from_key("tool:exec:bash"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bash.pulls, 6);
    assert!((bash.params.alpha - 9.0).abs() < f64::EPSILON);

    assert_eq!(store.count_traces().await.unwrap(), 6);

    // Six referenced pulls pushed the mean well above the prior.
    assert!(bash.params.mean() > 0.85);
}

#[tokio::test]
async fn test_conversational_turn_records_trace_without_feedback() {
    let store = setup_store().await;
    let orch = Orchestrator::new(
        LoadoutConfig::default(),
        store.clone(),
        Arc::new(SeededLcg::new(3)),
    );

    let turn = orch.select_for_turn(&inventory(), context()).await;
    let observation = TurnObservation {
        run_id: "run-chat".to_string(),
        assistant_texts: vec!["hello!".to_string()],
        tool_invocations: Vec::new(),
        usage: TokenUsage {
            input: 200,
            output: 20,
            total: 220,
        },
        system_prompt_chars: 5000,
        duration_ms: Some(300),
        aborted: false,
        error: None,
    };

    let report = orch.observe_turn(&turn, &observation).await;
    assert!(report.trace_id.is_some());
    assert_eq!(report.outcomes_applied, 0);

    assert_eq!(store.count_traces().await.unwrap(), 1);
    assert!(store.load_posteriors().await.unwrap().is_empty());
}
