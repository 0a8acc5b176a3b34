use crate::error::MatrixError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parsed `skills-matrix.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Format version.
    #[serde(default)]
    pub version: String,
    /// Category definitions keyed by category key.
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,
    /// Relationship rules between skills.
    #[serde(default)]
    pub relationships: Relationships,
    /// Alias to skill ID.
    #[serde(default)]
    pub skill_aliases: BTreeMap<String, String>,
}

/// A category entry in the matrix config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Name shown in listings; defaults to the key.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// At most one skill of this category may be selected.
    #[serde(default)]
    pub exclusive: bool,
    /// A complete stack must include one skill of this category.
    #[serde(default)]
    pub required: bool,
    /// Sort key.
    #[serde(default)]
    pub order: i32,
    /// Parent category.
    #[serde(default)]
    pub parent: Option<String>,
}

/// All relationship rules declared in the matrix config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationships {
    /// Every pair of skills in a group conflicts.
    #[serde(default)]
    pub conflicts: Vec<GroupRule>,
    /// Every pair of skills in a group discourages the other.
    #[serde(default)]
    pub discourages: Vec<GroupRule>,
    /// `when` recommends each of `suggest`.
    #[serde(default)]
    pub recommends: Vec<RecommendRule>,
    /// `skill` requires `needs`.
    #[serde(default)]
    pub requires: Vec<RequireRule>,
}

/// A symmetric rule over a group of skills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRule {
    /// Skills (IDs or aliases) in the group.
    pub skills: Vec<String>,
    /// Reason shown to users.
    #[serde(default)]
    pub reason: String,
}

/// A recommendation rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendRule {
    /// Skill that triggers the recommendation.
    pub when: String,
    /// Recommended skills.
    pub suggest: Vec<String>,
    /// Reason shown to users.
    #[serde(default)]
    pub reason: String,
}

/// A requirement rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequireRule {
    /// Skill carrying the requirement.
    pub skill: String,
    /// Required skills.
    pub needs: Vec<String>,
    /// Any one of `needs` suffices.
    #[serde(default)]
    pub needs_any: bool,
    /// Reason shown to users.
    #[serde(default)]
    pub reason: String,
}

impl MatrixConfig {
    /// Parses a matrix config from YAML text without validating it.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Reads, parses, and validates a matrix config file.
    pub fn load(path: &Path) -> Result<Self, MatrixError> {
        let text = fs::read_to_string(path).map_err(|source| MatrixError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text).map_err(|e| MatrixError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let issues = config.validate();
        if !issues.is_empty() {
            return Err(MatrixError::Invalid {
                path: path.to_path_buf(),
                issues,
            });
        }
        Ok(config)
    }

    /// Structural checks; returns every issue found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (key, category) in &self.categories {
            if key.trim().is_empty() {
                issues.push("category with empty key".to_string());
            }
            if let Some(parent) = &category.parent {
                if parent == key {
                    issues.push(format!("category '{key}' is its own parent"));
                }
            }
        }

        for (i, rule) in self.relationships.conflicts.iter().enumerate() {
            if rule.skills.len() < 2 {
                issues.push(format!("conflicts[{i}] needs at least two skills"));
            }
        }
        for (i, rule) in self.relationships.discourages.iter().enumerate() {
            if rule.skills.len() < 2 {
                issues.push(format!("discourages[{i}] needs at least two skills"));
            }
        }
        for (i, rule) in self.relationships.recommends.iter().enumerate() {
            if rule.when.trim().is_empty() {
                issues.push(format!("recommends[{i}] has an empty 'when'"));
            }
            if rule.suggest.is_empty() {
                issues.push(format!("recommends[{i}] suggests nothing"));
            }
        }
        for (i, rule) in self.relationships.requires.iter().enumerate() {
            if rule.skill.trim().is_empty() {
                issues.push(format!("requires[{i}] has an empty 'skill'"));
            }
            if rule.needs.is_empty() {
                issues.push(format!("requires[{i}] needs nothing"));
            }
            if rule.needs.iter().any(|n| n == &rule.skill) {
                issues.push(format!("requires[{i}]: '{}' requires itself", rule.skill));
            }
        }

        for (alias, target) in &self.skill_aliases {
            if alias.trim().is_empty() || target.trim().is_empty() {
                issues.push(format!("skill_aliases: empty entry '{alias}' -> '{target}'"));
            }
        }

        issues
    }
}
