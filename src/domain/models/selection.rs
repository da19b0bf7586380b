//! Selection decision types.

use serde::{Deserialize, Serialize};

use super::arm::ArmId;

/// Read-only metadata about the invoking turn, carried for logging and
/// audit. It does not condition the statistical model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionContext {
    /// Stable key of the session issuing the turn.
    pub session_key: String,
    /// Channel the turn arrived on (e.g. `cli`, `slack`).
    pub channel: Option<String>,
    /// Model serving the turn.
    pub model: Option<String>,
    /// Provider serving the turn.
    pub provider: Option<String>,
}

/// The outcome of one selection call.
///
/// Invariants: `selected` and `excluded` are disjoint, together they
/// cover the full candidate set, and `used_tokens <= token_budget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Arms packed into the budget, in priority order.
    pub selected: Vec<ArmId>,
    /// Arms left out this turn.
    pub excluded: Vec<ArmId>,
    /// Whether this run is a counterfactual baseline (no Thompson
    /// filtering applied).
    pub is_baseline: bool,
    /// The budget the packing ran against.
    pub token_budget: u32,
    /// Tokens consumed by the selected arms.
    pub used_tokens: u32,
}

impl SelectionResult {
    /// An empty, non-baseline result for an empty candidate list.
    #[must_use]
    pub fn empty(token_budget: u32) -> Self {
        Self {
            selected: Vec::new(),
            excluded: Vec::new(),
            is_baseline: false,
            token_budget,
            used_tokens: 0,
        }
    }
}
