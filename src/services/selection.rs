//! Budget-constrained arm selection via Thompson Sampling.
//!
//! Every candidate arm gets one draw from its posterior (or its
//! source-appropriate prior when no posterior row exists yet), then a
//! strict first-fit pass packs arms into the token budget in priority
//! order: seed arms, underexplored arms, descending Thompson score.
//! Priority dominates; no arm is skipped to make room for a later,
//! cheaper one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::domain::models::{
    Arm, ArmId, ArmPosterior, BetaParams, LoadoutConfig, SelectionContext, SelectionResult,
};
use crate::domain::ports::RandomSource;

/// Priority tier of an arm during packing. Lower packs first.
const TIER_SEED: u8 = 0;
const TIER_UNDEREXPLORED: u8 = 1;
const TIER_SCORED: u8 = 2;

/// The selection strategy: scores arms against their posteriors and
/// packs them into the turn's token budget.
pub struct SelectionEngine {
    baseline_rate: f64,
    min_pulls: u64,
    seed_arm_ids: HashSet<ArmId>,
    rng: Arc<dyn RandomSource>,
}

impl SelectionEngine {
    /// Build an engine from configuration and an injected random source.
    #[must_use]
    pub fn new(config: &LoadoutConfig, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            baseline_rate: config.baseline_rate,
            min_pulls: config.min_pulls,
            seed_arm_ids: config
                .seed_arm_ids
                .iter()
                .map(|id| ArmId::from_key(id.clone()))
                .collect(),
            rng,
        }
    }

    /// Decide which arms to include this turn.
    ///
    /// Never rejects input: an empty candidate list yields an empty,
    /// non-baseline result; a zero budget excludes everything except
    /// zero-cost arms.
    #[must_use]
    pub fn select(
        &self,
        arms: &[Arm],
        posteriors: &HashMap<ArmId, ArmPosterior>,
        context: &SelectionContext,
        token_budget: u32,
    ) -> SelectionResult {
        if arms.is_empty() {
            return SelectionResult::empty(token_budget);
        }

        if self.rng.next_f64() < self.baseline_rate {
            // Counterfactual baseline: greedy include in input order,
            // no Thompson filtering, so token usage stays comparable
            // to the pre-learning full-prompt state.
            let result = pack(arms.iter().collect(), token_budget, true);
            debug!(
                session = %context.session_key,
                candidates = arms.len(),
                selected = result.selected.len(),
                budget = token_budget,
                "baseline selection"
            );
            return result;
        }

        let mut ranked: Vec<(&Arm, u8, f64)> = arms
            .iter()
            .map(|arm| {
                let posterior = posteriors.get(&arm.id);
                let params = posterior
                    .map(|p| p.params)
                    .unwrap_or_else(|| BetaParams::initial_prior(arm.kind.source()));
                let score = params.sample(self.rng.as_ref());

                let tier = if self.seed_arm_ids.contains(&arm.id) {
                    TIER_SEED
                } else if posterior.is_none_or(|p| p.pulls < self.min_pulls) {
                    // Underexplored arms surface repeatedly until their
                    // estimate is trustworthy.
                    TIER_UNDEREXPLORED
                } else {
                    TIER_SCORED
                };

                (arm, tier, score)
            })
            .collect();

        // Stable sort: tier first, Thompson score within a tier.
        ranked.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then_with(|| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
        });

        let result = pack(ranked.into_iter().map(|(arm, _, _)| arm).collect(), token_budget, false);
        debug!(
            session = %context.session_key,
            candidates = arms.len(),
            selected = result.selected.len(),
            excluded = result.excluded.len(),
            used_tokens = result.used_tokens,
            budget = token_budget,
            "thompson selection"
        );
        result
    }
}

/// Strict first-fit-by-priority packing over an already-ordered list.
fn pack(ordered: Vec<&Arm>, token_budget: u32, is_baseline: bool) -> SelectionResult {
    let mut selected = Vec::new();
    let mut excluded = Vec::new();
    let mut used: u64 = 0;
    let budget = u64::from(token_budget);

    for arm in ordered {
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
        is_baseline,
        token_budget,
        used_tokens: u32::try_from(used).unwrap_or(token_budget),
    }
}
