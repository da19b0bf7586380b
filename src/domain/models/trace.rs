//! Run traces: the immutable per-turn records behind all aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::arm::ArmId;

/// Token usage reported by the agent runtime for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt-side tokens.
    pub input: u64,
    /// Completion-side tokens.
    pub output: u64,
    /// Total billed tokens.
    pub total: u64,
}

/// Per-arm outcome captured in a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceArm {
    /// The arm in question.
    pub arm_id: ArmId,
    /// Whether the arm made it into the turn's context.
    pub included: bool,
    /// Whether the agent's behaviour actually referenced it.
    pub referenced: bool,
    /// The arm's token cost at selection time.
    pub token_cost: u32,
}

/// An immutable record of one agent turn. Created once after the turn
/// completes; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTrace {
    /// Primary key.
    pub trace_id: Uuid,
    /// Caller-supplied run identifier.
    pub run_id: String,
    /// Session the turn belongs to.
    pub session_id: String,
    /// When the turn completed.
    pub timestamp: DateTime<Utc>,
    /// Whether this was a counterfactual baseline run.
    pub is_baseline: bool,
    /// Every candidate arm with its inclusion/reference outcome.
    pub arms: Vec<TraceArm>,
    /// Token usage for the turn.
    pub usage: TokenUsage,
    /// Size of the assembled system prompt, in characters.
    pub system_prompt_chars: u64,
    /// Wall-clock duration, when the runtime reports one.
    pub duration_ms: Option<u64>,
    /// Whether the caller aborted the turn mid-flight. Aborted traces
    /// are recorded but never feed posteriors.
    pub aborted: bool,
    /// Error reported by the runtime, if any.
    pub error: Option<String>,
}
