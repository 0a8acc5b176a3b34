//! Reads skill content trees into [`ExtractedSkill`] records.
//!
//! A skill is a directory holding `SKILL.md` (frontmatter `name`, `description`)
//! and an optional `metadata.yaml` with classification and display data.

use crate::error::MatrixError;
use crate::frontmatter::split_frontmatter;
use crate::types::{Skill, SkillId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const SKILL_FILE: &str = "SKILL.md";
const METADATA_FILE: &str = "metadata.yaml";
const MAX_DEPTH: usize = 8;
const DEFAULT_CATEGORY: &str = "uncategorized";

/// Classification and display data from `metadata.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Top-level category.
    #[serde(default)]
    pub category: Option<String>,
    /// Subcategory (exclusivity key).
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Short alias.
    #[serde(default, alias = "cli_name")]
    pub display_name: Option<String>,
    /// Content version.
    #[serde(default)]
    pub version: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author attribution.
    #[serde(default)]
    pub author: Option<String>,
    /// Usage guidance for compiled agents.
    #[serde(default)]
    pub usage: Option<String>,
    /// Skill content belongs to the consuming project.
    #[serde(default)]
    pub local: bool,
}

#[derive(Debug, Default, Deserialize)]
struct SkillFrontmatter {
    name: Option<String>,
    description: Option<String>,
}

/// A skill read from disk, before it is merged into a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSkill {
    /// Skill ID (frontmatter `name`, or the directory name).
    pub id: SkillId,
    /// Directory holding `SKILL.md`.
    pub path: PathBuf,
    /// Frontmatter description.
    pub description: String,
    /// Parsed `metadata.yaml`, defaulted when absent.
    pub metadata: SkillMetadata,
}

impl ExtractedSkill {
    /// Last path segment of the skill directory.
    pub fn dir_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.id.as_str())
    }

    /// Converts into a matrix skill with no relationships.
    pub fn into_skill(self) -> Skill {
        let category = self
            .metadata
            .category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let mut skill = Skill::new(self.id, category);
        skill.subcategory = self.metadata.subcategory;
        skill.display_name = self.metadata.display_name;
        skill.description = self.description;
        skill.usage = self.metadata.usage;
        skill.version = self.metadata.version;
        skill.author = self.metadata.author;
        skill.tags = self.metadata.tags;
        skill.local = self.metadata.local;
        skill.path = Some(self.path);
        skill
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Parses the skill in `dir`. Returns `Ok(None)` when `dir` has no `SKILL.md`.
pub fn parse_skill_dir(dir: &Path) -> Result<Option<ExtractedSkill>, MatrixError> {
    let skill_path = dir.join(SKILL_FILE);
    if !skill_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&skill_path).map_err(|source| MatrixError::Read {
        path: skill_path.clone(),
        source,
    })?;

    let frontmatter = match split_frontmatter(&content).0 {
        Some(yaml) => serde_yaml::from_str::<SkillFrontmatter>(yaml).map_err(|e| {
            MatrixError::Parse {
                path: skill_path.clone(),
                message: format!("invalid frontmatter: {e}"),
            }
        })?,
        None => SkillFrontmatter::default(),
    };

    let metadata_path = dir.join(METADATA_FILE);
    let metadata = if metadata_path.is_file() {
        let text = fs::read_to_string(&metadata_path).map_err(|source| MatrixError::Read {
            path: metadata_path.clone(),
            source,
        })?;
        serde_yaml::from_str::<SkillMetadata>(&text).map_err(|e| MatrixError::Parse {
            path: metadata_path.clone(),
            message: e.to_string(),
        })?
    } else {
        SkillMetadata::default()
    };

    let id = frontmatter
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .ok_or_else(|| MatrixError::Parse {
            path: skill_path.clone(),
            message: "skill has no name and no directory name".to_string(),
        })?;

    Ok(Some(ExtractedSkill {
        id,
        path: dir.to_path_buf(),
        description: frontmatter.description.unwrap_or_default(),
        metadata,
    }))
}

/// Walks `root` for skill directories and returns them ordered by ID.
///
/// Hidden directories are skipped. Skills that fail to parse are logged and
/// skipped; when two directories declare the same ID the first one walked wins.
pub fn extract_skills(root: &Path) -> Result<Vec<ExtractedSkill>, MatrixError> {
    if !root.is_dir() {
        return Err(MatrixError::SkillsDirMissing(root.to_path_buf()));
    }

    let mut found: BTreeMap<SkillId, ExtractedSkill> = BTreeMap::new();
    let walker = WalkDir::new(root)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok());

    for entry in walker {
        if !entry.file_type().is_file() || entry.file_name() != SKILL_FILE {
            continue;
        }
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        match parse_skill_dir(dir) {
            Ok(Some(skill)) => {
                if let Some(existing) = found.get(&skill.id) {
                    tracing::warn!(
                        target: "skillforge::matrix",
                        skill = %skill.id,
                        kept = %existing.path.display(),
                        skipped = %skill.path.display(),
                        "duplicate skill id"
                    );
                    continue;
                }
                found.insert(skill.id.clone(), skill);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    target: "skillforge::matrix",
                    error = %e,
                    "skipping unreadable skill"
                );
            }
        }
    }

    Ok(found.into_values().collect())
}
