//! Trace capture: recording what each turn actually used.
//!
//! After a turn completes, every candidate arm is checked against the
//! agent's visible behaviour (tool invocations, assistant texts) and a
//! single immutable `RunTrace` is emitted for later analysis and
//! posterior update.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::models::{Arm, ArmKind, RunTrace, SelectionContext, SelectionResult, TraceArm};
use crate::services::posterior_update::ArmOutcome;

/// One tool call made by the agent during the turn.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Name of the invoked tool.
    pub name: String,
    /// Raw argument payload, searched for file references.
    pub arguments: String,
}

/// What the agent runtime reports after a turn completes.
#[derive(Debug, Clone, Default)]
pub struct TurnObservation {
    /// Caller-supplied run identifier.
    pub run_id: String,
    /// Assistant-visible output texts.
    pub assistant_texts: Vec<String>,
    /// Concrete tool calls made during the turn.
    pub tool_invocations: Vec<ToolInvocation>,
    /// Token usage for the turn.
    pub usage: crate::domain::models::TokenUsage,
    /// Size of the assembled system prompt, in characters.
    pub system_prompt_chars: u64,
    /// Wall-clock duration, when reported.
    pub duration_ms: Option<u64>,
    /// Whether the caller aborted the turn mid-flight.
    pub aborted: bool,
    /// Error reported by the runtime, if any.
    pub error: Option<String>,
}

/// Did the agent's behaviour reference this arm during the turn?
///
/// Tools match by invocation name; skills by label mention in any
/// assistant text; files by path mention in any text or invocation
/// argument.
#[must_use]
pub fn is_referenced(arm: &Arm, observation: &TurnObservation) -> bool {
    match arm.kind {
        ArmKind::Tool => observation
            .tool_invocations
            .iter()
            .any(|inv| inv.name == arm.label),
        ArmKind::Skill => observation
            .assistant_texts
            .iter()
            .any(|text| text.contains(&arm.label)),
        ArmKind::File => {
            observation
                .assistant_texts
                .iter()
                .any(|text| text.contains(&arm.label))
                || observation
                    .tool_invocations
                    .iter()
                    .any(|inv| inv.arguments.contains(&arm.label))
        }
    }
}

/// Build the immutable trace for a completed turn.
///
/// `included` records the selection *decision*, not what the runtime
/// was actually handed: in the passive phase every candidate reaches
/// the agent, yet decision-excluded arms are still traced with
/// `included = false` (and `referenced` forced false), so passive
/// traces measure what the decision would have done, not what the
/// full context did.
#[must_use]
pub fn build_trace(
    candidates: &[Arm],
    decision: &SelectionResult,
    context: &SelectionContext,
    observation: &TurnObservation,
) -> RunTrace {
    let arms = candidates
        .iter()
        .map(|arm| {
            let included = decision.selected.contains(&arm.id);
            TraceArm {
                arm_id: arm.id.clone(),
                included,
                referenced: included && is_referenced(arm, observation),
                token_cost: arm.token_cost,
            }
        })
        .collect();

    RunTrace {
        trace_id: Uuid::new_v4(),
        run_id: observation.run_id.clone(),
        session_id: context.session_key.clone(),
        timestamp: Utc::now(),
        is_baseline: decision.is_baseline,
        arms,
        usage: observation.usage,
        system_prompt_chars: observation.system_prompt_chars,
        duration_ms: observation.duration_ms,
        aborted: observation.aborted,
        error: observation.error.clone(),
    }
}

/// Derive posterior feedback from a completed turn.
///
/// A turn with zero tool invocations produces no feedback: absence of
/// tool use is not evidence against unused arms. Aborted turns produce
/// none either. Otherwise every *included* arm gets reward 1.0 if
/// referenced, 0.0 if not.
#[must_use]
pub fn feedback_outcomes(trace: &RunTrace, observation: &TurnObservation) -> Vec<ArmOutcome> {
    if observation.aborted || observation.tool_invocations.is_empty() {
        return Vec::new();
    }

    trace
        .arms
        .iter()
        .filter(|arm| arm.included)
        .map(|arm| ArmOutcome {
            arm_id: arm.arm_id.clone(),
            reward: if arm.referenced { 1.0 } else { 0.0 },
        })
        .collect()
}
