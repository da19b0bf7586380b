//! End-to-end orchestration of the select -> agent turn -> observe cycle.
//!
//! The orchestrator is the only component that talks to both the store
//! and the selection engine. Selection always returns a result: a
//! failing backend degrades to full inclusion (a forced baseline)
//! instead of failing the turn, and observation errors are reported,
//! never propagated.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::domain::models::{
    Arm, ArmKind, LoadoutConfig, Phase, SelectionContext, SelectionResult,
};
use crate::domain::ports::{PosteriorStore, RandomSource};
use crate::services::candidates::{build_candidates, TurnInventory};
use crate::services::posterior_update::{PosteriorUpdater, UpdateFailure};
use crate::services::selection::SelectionEngine;
use crate::services::trace_capture::{build_trace, feedback_outcomes, TurnObservation};

/// The selection handed back to the agent runtime for one turn.
#[derive(Debug)]
pub struct TurnSelection {
    /// The raw decision, recorded in the turn's trace.
    pub decision: SelectionResult,
    /// All candidate arms this turn (kept for trace capture).
    pub candidates: Vec<Arm>,
    /// Context the turn was selected under.
    pub context: SelectionContext,
    /// Tool names to expose to the agent.
    pub tools: Vec<String>,
    /// Skill names to inject.
    pub skills: Vec<String>,
    /// File paths to include.
    pub files: Vec<String>,
}

/// Outcome of recording one turn's observation.
#[derive(Debug, Default)]
pub struct ObserveReport {
    /// Id of the emitted trace, when one was persisted.
    pub trace_id: Option<Uuid>,
    /// Error encountered persisting the trace, if any.
    pub trace_error: Option<String>,
    /// Posterior updates applied.
    pub outcomes_applied: usize,
    /// Per-arm posterior update failures.
    pub update_failures: Vec<UpdateFailure>,
}

/// Drives candidate building, selection, trace capture, and posterior
/// updates for each agent turn.
pub struct Orchestrator {
    config: LoadoutConfig,
    store: Arc<dyn PosteriorStore>,
    engine: SelectionEngine,
    updater: PosteriorUpdater,
}

impl Orchestrator {
    /// Build an orchestrator over an injected store and random source.
    #[must_use]
    pub fn new(
        config: LoadoutConfig,
        store: Arc<dyn PosteriorStore>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        let engine = SelectionEngine::new(&config, rng);
        let updater = PosteriorUpdater::new(store.clone());
        Self {
            config,
            store,
            engine,
            updater,
        }
    }

    /// Select the components for one agent turn.
    ///
    /// Never fails the turn: a malformed or empty inventory yields an
    /// empty selection, and an unavailable backend degrades to full
    /// inclusion as a forced baseline.
    pub async fn select_for_turn(
        &self,
        inventory: &TurnInventory,
        context: SelectionContext,
    ) -> TurnSelection {
        let candidates = build_candidates(inventory);
        let budget = self.config.token_budget;

        if !self.config.enabled || candidates.is_empty() {
            let decision = forced_baseline(&candidates, budget);
            return self.to_turn_selection(decision, candidates, context, false);
        }

        let decision = match self.store.load_posteriors().await {
            Ok(posteriors) => self.engine.select(&candidates, &posteriors, &context, budget),
            Err(e) => {
                // Fail open: the turn proceeds with everything included
                // and the run counts as an implicit baseline.
                warn!(error = %e, "posterior store unavailable; selecting full candidate set");
                forced_baseline(&candidates, budget)
            }
        };

        let enforce =
            self.config.phase == Phase::Active && !decision.is_baseline;
        self.to_turn_selection(decision, candidates, context, enforce)
    }

    /// Record the completed turn: emit its trace and feed posteriors.
    ///
    /// Storage failures are collected into the report and logged; they
    /// never propagate to the caller. Aborted turns and turns without
    /// any concrete tool usage record a trace but produce no feedback.
    pub async fn observe_turn(
        &self,
        turn: &TurnSelection,
        observation: &TurnObservation,
    ) -> ObserveReport {
        let mut report = ObserveReport::default();

        let trace = build_trace(&turn.candidates, &turn.decision, &turn.context, observation);
        match self.store.insert_trace(&trace).await {
            Ok(()) => report.trace_id = Some(trace.trace_id),
            Err(e) => {
                warn!(error = %e, "failed to persist run trace");
                report.trace_error = Some(e.to_string());
            }
        }

        let outcomes = feedback_outcomes(&trace, observation);
        if outcomes.is_empty() {
            return report;
        }

        let update = self.updater.apply(&outcomes).await;
        report.outcomes_applied = update.updated;
        report.update_failures = update.failures;
        report
    }

    /// Map selected arm ids back to the concrete tool/skill/file
    /// references the runtime consumes. When `enforce` is false
    /// (passive phase, baseline, disabled, degraded) every candidate
    /// is returned and the decision is only recorded.
    fn to_turn_selection(
        &self,
        decision: SelectionResult,
        candidates: Vec<Arm>,
        context: SelectionContext,
        enforce: bool,
    ) -> TurnSelection {
        let mut tools = Vec::new();
        let mut skills = Vec::new();
        let mut files = Vec::new();

        for arm in &candidates {
            if enforce && !decision.selected.contains(&arm.id) {
                continue;
            }
            match arm.kind {
                ArmKind::Tool => tools.push(arm.label.clone()),
                ArmKind::Skill => skills.push(arm.label.clone()),
                ArmKind::File => files.push(arm.label.clone()),
            }
        }

        TurnSelection {
            decision,
            candidates,
            context,
            tools,
            skills,
            files,
        }
    }
}

/// Greedy full-inclusion packing in input order, marked as a baseline.
/// Used for the counterfactual-equivalent degraded and disabled paths.
fn forced_baseline(candidates: &[Arm], token_budget: u32) -> SelectionResult {
    if candidates.is_empty() {
        return SelectionResult::empty(token_budget);
    }

    let mut selected = Vec::new();
    let mut excluded = Vec::new();
    let mut used: u64 = 0;
    let budget = u64::from(token_budget);

    for arm in candidates {
        if used + u64::from(arm.token_cost) <= budget {
            used += u64::from(arm.token_cost);
            selected.push(arm.id.clone());
        } else {
            excluded.push(arm.id.clone());
        }
    }

    SelectionResult {
        selected,
        excluded,
        is_baseline: true,
        token_budget,
        used_tokens: u32::try_from(used).unwrap_or(token_budget),
    }
}
