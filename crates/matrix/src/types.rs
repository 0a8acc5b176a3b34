use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Globally unique skill identifier.
pub type SkillId = String;

/// A directed relationship to another skill with the author's stated reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRelation {
    /// Target skill.
    pub skill_id: SkillId,
    /// Human-readable justification shown to users.
    #[serde(default)]
    pub reason: String,
}

impl SkillRelation {
    /// Creates a relation to `skill_id`.
    pub fn new(skill_id: impl Into<SkillId>, reason: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            reason: reason.into(),
        }
    }
}

/// One requirement group. Groups on a skill are ANDed together.
///
/// Within a group, `needs_any` selects OR semantics (at least one listed skill)
/// instead of the default AND semantics (every listed skill).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementGroup {
    /// Skills named by this group.
    pub skill_ids: Vec<SkillId>,
    /// OR semantics when true, AND semantics when false.
    #[serde(default)]
    pub needs_any: bool,
    /// Human-readable justification shown to users.
    #[serde(default)]
    pub reason: String,
}

impl RequirementGroup {
    /// Returns true when `selections` satisfy this group.
    ///
    /// An empty group is always satisfied.
    pub fn is_satisfied_by(&self, selections: &[SkillId]) -> bool {
        if self.skill_ids.is_empty() {
            return true;
        }
        let selected = |id: &SkillId| selections.iter().any(|s| s == id);
        if self.needs_any {
            self.skill_ids.iter().any(selected)
        } else {
            self.skill_ids.iter().all(selected)
        }
    }

    /// Skills from this group that are not in `selections`.
    pub fn missing_from<'a>(&'a self, selections: &[SkillId]) -> Vec<&'a str> {
        self.skill_ids
            .iter()
            .filter(|id| !selections.contains(id))
            .map(String::as_str)
            .collect()
    }
}

/// Category of a skill source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// The primary marketplace.
    Public,
    /// Content living inside the consuming project.
    Local,
    /// Content provided by an installed plugin.
    Plugin,
    /// An extra source configured by the project.
    Private,
}

impl SourceType {
    /// Returns a stable label for this source type.
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Public => "public",
            SourceType::Local => "local",
            SourceType::Plugin => "plugin",
            SourceType::Private => "private",
        }
    }
}

/// How an installed skill was installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Installed as part of a plugin.
    Plugin,
    /// Copied into the project.
    Local,
}

/// One place a skill is available from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSourceEntry {
    /// Display name of the source (marketplace name, extra source name, ...).
    pub name: String,
    /// Source category.
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Source string this entry was fetched from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Version of the skill in this source, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Whether this source is the one currently installed.
    #[serde(default)]
    pub installed: bool,
    /// How the installed copy was installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_mode: Option<InstallMode>,
}

impl SkillSourceEntry {
    /// Creates an uninstalled entry.
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            source_type,
            url: None,
            version: None,
            installed: false,
            install_mode: None,
        }
    }

    /// Sets the source URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A named, versioned content unit with relationship rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Globally unique identifier.
    pub id: SkillId,
    /// Short alias shown in listings (e.g. `react`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Top-level classification.
    pub category: String,
    /// Finer classification; when present it is the key used for exclusivity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// Usage guidance rendered into compiled agents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    /// Content version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Author attribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Content lives in the consuming project rather than a marketplace.
    #[serde(default)]
    pub local: bool,
    /// At most one skill of this skill's category may be selected.
    #[serde(default)]
    pub category_exclusive: bool,
    /// Location of the skill content (directory with `SKILL.md` or a single file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Skills this one cannot be selected together with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<SkillRelation>,
    /// Requirement groups (ANDed).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequirementGroup>,
    /// Skills that pair well with this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommends: Vec<SkillRelation>,
    /// Skills that work poorly with this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discourages: Vec<SkillRelation>,
    /// Every source the skill is available from. Empty until tagged.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_sources: Vec<SkillSourceEntry>,
    /// The source used to materialize the skill. Absent until tagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_source: Option<SkillSourceEntry>,
}

impl Skill {
    /// Creates a skill with no relationships.
    pub fn new(id: impl Into<SkillId>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            category: category.into(),
            subcategory: None,
            description: String::new(),
            usage: None,
            version: None,
            author: None,
            tags: Vec::new(),
            local: false,
            category_exclusive: false,
            path: None,
            conflicts_with: Vec::new(),
            requires: Vec::new(),
            recommends: Vec::new(),
            discourages: Vec::new(),
            available_sources: Vec::new(),
            active_source: None,
        }
    }

    /// Key into the matrix category table: the subcategory when present, else the category.
    pub fn category_key(&self) -> &str {
        self.subcategory.as_deref().unwrap_or(&self.category)
    }

    /// Whether the skill is classified under `category` at either level.
    pub fn in_category(&self, category: &str) -> bool {
        self.category == category || self.subcategory.as_deref() == Some(category)
    }

    /// The declared conflict with `other`, if this skill declares one.
    pub fn conflict_with(&self, other: &str) -> Option<&SkillRelation> {
        self.conflicts_with.iter().find(|r| r.skill_id == other)
    }

    /// The declared recommendation of `other`, if any.
    pub fn recommendation_of(&self, other: &str) -> Option<&SkillRelation> {
        self.recommends.iter().find(|r| r.skill_id == other)
    }

    /// The declared discouragement of `other`, if any.
    pub fn discouragement_of(&self, other: &str) -> Option<&SkillRelation> {
        self.discourages.iter().find(|r| r.skill_id == other)
    }
}

/// Category or subcategory definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// Category key.
    pub id: String,
    /// Name shown in listings.
    pub display_name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// At most one skill of this category may be selected.
    #[serde(default)]
    pub exclusive: bool,
    /// A complete stack must include a skill from this category.
    #[serde(default)]
    pub required: bool,
    /// Sort key.
    #[serde(default)]
    pub order: i32,
    /// Parent category for subcategories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Unit stored inside an agent or stack configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAssignment")]
pub struct SkillAssignment {
    /// Skill identifier (or alias before resolution).
    pub id: SkillId,
    /// Embed the skill in compiled output instead of referencing it lazily.
    #[serde(default)]
    pub preloaded: bool,
    /// Overrides the skill's `local` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<bool>,
    /// Overrides the content location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SkillAssignment {
    /// A lazily referenced skill.
    pub fn dynamic(id: impl Into<SkillId>) -> Self {
        Self {
            id: id.into(),
            preloaded: false,
            local: None,
            path: None,
        }
    }

    /// A skill embedded in compiled output.
    pub fn preloaded(id: impl Into<SkillId>) -> Self {
        Self {
            preloaded: true,
            ..Self::dynamic(id)
        }
    }
}

/// Assignments may be written as a bare ID or as a mapping.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAssignment {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        preloaded: bool,
        #[serde(default)]
        local: Option<bool>,
        #[serde(default)]
        path: Option<String>,
    },
}

impl From<RawAssignment> for SkillAssignment {
    fn from(raw: RawAssignment) -> Self {
        match raw {
            RawAssignment::Id(id) => SkillAssignment::dynamic(id),
            RawAssignment::Full {
                id,
                preloaded,
                local,
                path,
            } => SkillAssignment {
                id,
                preloaded,
                local,
                path,
            },
        }
    }
}

/// The merged graph of all known skills, categories, and aliases.
///
/// Built once by [`crate::MatrixBuilder`]. The only mutation path is
/// [`Matrix::map_skills`], which consumes the matrix and returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub(crate) version: String,
    pub(crate) skills: BTreeMap<SkillId, Skill>,
    pub(crate) categories: BTreeMap<String, CategoryDefinition>,
    pub(crate) display_name_to_id: BTreeMap<String, SkillId>,
    pub(crate) display_names: BTreeMap<SkillId, String>,
}

impl Matrix {
    /// Matrix format version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All skills, keyed and ordered by ID.
    pub fn skills(&self) -> &BTreeMap<SkillId, Skill> {
        &self.skills
    }

    /// Looks up a skill by ID.
    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.get(id)
    }

    /// Category definitions keyed by category key.
    pub fn categories(&self) -> &BTreeMap<String, CategoryDefinition> {
        &self.categories
    }

    /// Alias to skill ID (many-to-one).
    pub fn display_name_to_id(&self) -> &BTreeMap<String, SkillId> {
        &self.display_name_to_id
    }

    /// Skill ID to its canonical alias.
    pub fn display_names(&self) -> &BTreeMap<SkillId, String> {
        &self.display_names
    }

    /// Canonical alias for a skill, falling back to the ID.
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.display_names.get(id).map(String::as_str).unwrap_or(id)
    }

    /// Consumes the matrix, applies `f` to every skill in ID order, and returns the result.
    pub fn map_skills(mut self, mut f: impl FnMut(&mut Skill)) -> Self {
        for skill in self.skills.values_mut() {
            f(skill);
        }
        self
    }
}
