//! Service layer: selection, baseline sampling, candidate building,
//! posterior updates, trace capture, and the turn orchestrator.

pub mod baseline;
pub mod candidates;
pub mod orchestrator;
pub mod posterior_update;
pub mod selection;
pub mod trace_capture;

pub use baseline::{
    generate_baseline_seed, recommended_baseline_rate, should_run_baseline,
    should_run_baseline_seeded,
};
pub use candidates::{
    build_candidates, FileCandidate, SkillCandidate, ToolCandidate, TurnInventory,
    DEFAULT_TOOL_TOKEN_COST,
};
pub use orchestrator::{ObserveReport, Orchestrator, TurnSelection};
pub use posterior_update::{ArmOutcome, PosteriorUpdater, UpdateFailure, UpdateReport};
pub use selection::SelectionEngine;
pub use trace_capture::{build_trace, feedback_outcomes, ToolInvocation, TurnObservation};
