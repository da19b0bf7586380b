//! Candidate building: mapping the turn's tool/skill/file inventory
//! into uniform `Arm` records with deterministic ids and token costs.

use std::collections::HashMap;

use crate::domain::models::{Arm, ArmId, ArmKind};

/// Token cost assumed for a tool that does not declare one.
pub const DEFAULT_TOOL_TOKEN_COST: u32 = 200;

/// A tool exposed to the agent this turn.
#[derive(Debug, Clone)]
pub struct ToolCandidate {
    /// Tool name, e.g. `bash` or `web_search`.
    pub name: String,
    /// Declared token cost; `None` falls back to the default.
    pub declared_cost: Option<u32>,
}

/// A skill prompt available this turn.
#[derive(Debug, Clone)]
pub struct SkillCandidate {
    /// Skill name.
    pub name: String,
    /// Length of the skill prompt, in characters.
    pub prompt_chars: usize,
}

/// A workspace context file available this turn.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    /// Workspace-relative path.
    pub path: String,
    /// Length of the file content, in characters.
    pub content_chars: usize,
}

/// The full inventory the agent runtime supplies each turn.
#[derive(Debug, Clone, Default)]
pub struct TurnInventory {
    pub tools: Vec<ToolCandidate>,
    pub skills: Vec<SkillCandidate>,
    pub files: Vec<FileCandidate>,
}

/// Fixed keyword table mapping tool names to categories. First match
/// wins; unmatched names land in `other`.
const TOOL_CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("messaging", &["send", "reply", "message"]),
    ("memory", &["memory", "recall"]),
    ("web", &["web", "search", "fetch"]),
    ("fs", &["file", "read", "write", "edit"]),
    ("exec", &["exec", "bash", "shell", "run"]),
];

/// Infer a tool's category from its name.
#[must_use]
pub fn tool_category(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    for (category, keywords) in TOOL_CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return category;
        }
    }
    "other"
}

/// Chars-to-tokens estimate: chars / 4, rounded up.
#[must_use]
pub fn estimate_tokens(chars: usize) -> u32 {
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

/// Map the turn inventory into uniform arms.
///
/// Deterministic: the same inventory always yields the same ids and
/// costs. An empty inventory yields an empty list, never an error.
#[must_use]
pub fn build_candidates(inventory: &TurnInventory) -> Vec<Arm> {
    let mut arms =
        Vec::with_capacity(inventory.tools.len() + inventory.skills.len() + inventory.files.len());

    for tool in &inventory.tools {
        let category = tool_category(&tool.name);
        arms.push(Arm {
            id: ArmId::new(ArmKind::Tool, category, &tool.name),
            kind: ArmKind::Tool,
            category: category.to_string(),
            label: tool.name.clone(),
            token_cost: tool.declared_cost.unwrap_or(DEFAULT_TOOL_TOKEN_COST),
            metadata: HashMap::new(),
        });
    }

    for skill in &inventory.skills {
        arms.push(Arm {
            id: ArmId::new(ArmKind::Skill, &skill.name, "main"),
            kind: ArmKind::Skill,
            category: skill.name.clone(),
            label: skill.name.clone(),
            token_cost: estimate_tokens(skill.prompt_chars),
            metadata: HashMap::new(),
        });
    }

    for file in &inventory.files {
        arms.push(Arm {
            id: ArmId::new(ArmKind::File, "workspace", &file.path),
            kind: ArmKind::File,
            category: "workspace".to_string(),
            label: file.path.clone(),
            token_cost: estimate_tokens(file.content_chars),
            metadata: HashMap::new(),
        });
    }

    arms
}
