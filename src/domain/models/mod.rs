//! Domain models: pure data types and pure statistics.

pub mod arm;
pub mod beta;
pub mod config;
pub mod selection;
pub mod trace;

pub use arm::{Arm, ArmId, ArmKind, ArmPosterior};
pub use beta::{ArmSource, BetaParams};
pub use config::{DatabaseConfig, LoadoutConfig, LoggingConfig, Phase};
pub use selection::{SelectionContext, SelectionResult};
pub use trace::{RunTrace, TokenUsage, TraceArm};
