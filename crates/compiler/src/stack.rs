use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use skillforge_matrix::SkillAssignment;
use std::collections::BTreeMap;
use std::path::Path;

/// One agent to compile and the skills assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<SkillAssignment>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, skills: Vec<SkillAssignment>) -> Self {
        Self {
            name: name.into(),
            skills,
        }
    }
}

/// A named set of agents, as stored in `stack.yaml`:
///
/// ```yaml
/// name: fullstack
/// agents:
///   web-developer: [react, { id: zustand, preloaded: true }]
///   api-developer: [hono]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub agents: BTreeMap<String, Vec<SkillAssignment>>,
}

impl Stack {
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path).map_err(CompileError::io(path))?;
        Self::from_yaml_str(&text).map_err(|message| CompileError::AgentConfig {
            agent: "stack".to_string(),
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, String> {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }

    /// Agents in name order.
    pub fn agents(&self) -> Vec<AgentConfig> {
        self.agents
            .iter()
            .map(|(name, skills)| AgentConfig::new(name, skills.clone()))
            .collect()
    }
}
