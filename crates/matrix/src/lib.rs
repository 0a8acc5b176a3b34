//! Skill relationship matrix for skillforge.
//!
//! This crate provides:
//! - The data model for skills, categories, and relationship edges.
//! - `MatrixBuilder`, which merges a matrix config, skill content, and overlays
//!   into an immutable [`Matrix`].
//! - The selection resolver: pure queries answering whether a skill can be
//!   selected next to the current selection, and a full-selection audit.
//!
//! # Examples
//!
//! ```
//! use skillforge_matrix::{
//!     is_disabled, validate_selection, MatrixBuilder, ResolverOptions, Skill, SkillRelation,
//! };
//!
//! let mut react = Skill::new("react", "framework");
//! react.conflicts_with.push(SkillRelation::new("vue", "Pick one UI framework"));
//! let vue = Skill::new("vue", "framework");
//!
//! let built = MatrixBuilder::new().skill(react).skill(vue).build();
//! let matrix = built.matrix;
//!
//! let selected = vec!["vue".to_string()];
//! assert!(is_disabled("react", &selected, &matrix, ResolverOptions::default()));
//! assert!(!is_disabled("react", &selected, &matrix, ResolverOptions { expert_mode: true }));
//!
//! let report = validate_selection(&["react".to_string(), "vue".to_string()], &matrix);
//! assert!(!report.valid);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Matrix construction and overlay merging.
pub mod builder;
/// On-disk matrix configuration (`skills-matrix.yaml`).
pub mod config;
/// Error types for matrix loading.
pub mod error;
/// Skill extraction from content trees.
pub mod extract;
/// YAML frontmatter splitting.
pub mod frontmatter;
/// Pure selection queries and validation.
pub mod resolver;
/// Core data model.
pub mod types;

pub use builder::{load_matrix, BuiltMatrix, MatrixBuilder};
pub use config::{
    CategoryConfig, GroupRule, MatrixConfig, RecommendRule, Relationships, RequireRule,
};
pub use error::MatrixError;
pub use extract::{extract_skills, parse_skill_dir, ExtractedSkill, SkillMetadata};
pub use resolver::{
    available_skills, disable_reason, discourage_reason, is_category_all_disabled, is_disabled,
    is_discouraged, is_recommended, recommend_reason, resolve_alias, skills_by_category,
    validate_selection, CategoryAvailability, IssueKind, ResolverOptions, SelectionIssue,
    SelectionReport, SkillOption,
};
pub use types::{
    CategoryDefinition, InstallMode, Matrix, RequirementGroup, Skill, SkillAssignment, SkillId,
    SkillRelation, SkillSourceEntry, SourceType,
};

/// Result type for matrix operations.
pub type Result<T> = std::result::Result<T, MatrixError>;
