//! Arms: the selectable components competing for a turn's token budget.
//!
//! Candidates of heterogeneous shapes (tools, skills, context files) are
//! resolved once at build time into uniform `Arm` records; downstream
//! code never branches on the original shape again.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::beta::{ArmSource, BetaParams};

/// The kind of component an arm represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmKind {
    /// A callable tool exposed to the agent.
    Tool,
    /// A skill prompt injected into the system prompt.
    Skill,
    /// A workspace context file.
    File,
}

impl ArmKind {
    /// Stable string form used inside `ArmId` keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ArmKind::Tool => "tool",
            ArmKind::Skill => "skill",
            ArmKind::File => "file",
        }
    }

    /// The prior source for arms of this kind: files are arbitrary
    /// workspace content, everything else ships deliberately.
    #[must_use]
    pub fn source(self) -> ArmSource {
        match self {
            ArmKind::Tool | ArmKind::Skill => ArmSource::Curated,
            ArmKind::File => ArmSource::Learned,
        }
    }
}

/// Composite arm key `kind:category:label`, e.g. `tool:exec:bash` or
/// `file:workspace:notes.md`.
///
/// Derived deterministically from a candidate, and used as the join key
/// between ephemeral candidates and durable posteriors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArmId(String);

impl ArmId {
    /// Build an id from its components.
    #[must_use]
    pub fn new(kind: ArmKind, category: &str, label: &str) -> Self {
        Self(format!("{}:{}:{}", kind.as_str(), category, label))
    }

    /// Wrap an already-formatted key, e.g. one read back from storage
    /// or listed in configuration.
    #[must_use]
    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The kind encoded in the key prefix. Unknown prefixes default to
    /// `File` so their posteriors start from the neutral prior.
    #[must_use]
    pub fn kind(&self) -> ArmKind {
        match self.0.split(':').next() {
            Some("tool") => ArmKind::Tool,
            Some("skill") => ArmKind::Skill,
            _ => ArmKind::File,
        }
    }

    /// The raw key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate for inclusion this turn. Ephemeral; rebuilt every turn
/// from the current tool/skill/file inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arm {
    /// Deterministic composite key.
    pub id: ArmId,
    /// Component kind.
    pub kind: ArmKind,
    /// Inferred category (e.g. `exec`, `web`, `workspace`).
    pub category: String,
    /// The candidate's name or path.
    pub label: String,
    /// Estimated tokens this arm consumes when included.
    pub token_cost: u32,
    /// Free-form audit metadata; never conditions the model.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Durable statistical state for one arm.
///
/// Created lazily on first observation, updated in place, never
/// deleted: history stays authoritative for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmPosterior {
    /// The arm this belief is about.
    pub arm_id: ArmId,
    /// Current Beta(alpha, beta) belief.
    pub params: BetaParams,
    /// Number of `observe` calls applied; exactly one per observation.
    pub pulls: u64,
    /// When the posterior last changed.
    pub last_updated: DateTime<Utc>,
}

impl ArmPosterior {
    /// A fresh posterior seeded from the source-appropriate prior.
    #[must_use]
    pub fn with_prior(arm_id: ArmId, source: ArmSource) -> Self {
        Self {
            arm_id,
            params: BetaParams::initial_prior(source),
            pulls: 0,
            last_updated: Utc::now(),
        }
    }
}
