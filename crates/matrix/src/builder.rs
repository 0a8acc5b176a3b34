//! Builds an immutable [`Matrix`] from a config, skill content, and overlays.
//!
//! Construction never fails on dangling references: an edge that names an
//! unknown skill is recorded as a build warning and dropped.

use crate::config::{MatrixConfig, Relationships};
use crate::error::MatrixError;
use crate::extract::{extract_skills, ExtractedSkill};
use crate::types::{CategoryDefinition, Matrix, RequirementGroup, Skill, SkillId, SkillRelation};
use std::collections::BTreeMap;
use std::path::Path;

/// A built matrix plus the warnings produced while building it.
#[derive(Debug, Clone)]
pub struct BuiltMatrix {
    /// The matrix.
    pub matrix: Matrix,
    /// Dangling references and other non-fatal problems, in discovery order.
    pub warnings: Vec<String>,
}

/// Accumulates categories, skills, aliases, and relationships.
#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    version: String,
    categories: BTreeMap<String, CategoryDefinition>,
    skills: BTreeMap<SkillId, Skill>,
    aliases: BTreeMap<String, String>,
    relationships: Relationships,
    warnings: Vec<String>,
}

impl MatrixBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds categories, aliases, and relationships from a matrix config.
    pub fn from_config(config: &MatrixConfig) -> Self {
        let mut builder = Self {
            version: config.version.clone(),
            relationships: config.relationships.clone(),
            aliases: config.skill_aliases.clone(),
            ..Self::default()
        };
        for (key, category) in &config.categories {
            builder.categories.insert(
                key.clone(),
                CategoryDefinition {
                    id: key.clone(),
                    display_name: category.display_name.clone().unwrap_or_else(|| key.clone()),
                    description: category.description.clone(),
                    exclusive: category.exclusive,
                    required: category.required,
                    order: category.order,
                    parent: category.parent.clone(),
                },
            );
        }
        builder
    }

    /// Adds or replaces a category definition.
    pub fn category(mut self, definition: CategoryDefinition) -> Self {
        self.categories.insert(definition.id.clone(), definition);
        self
    }

    /// Adds or replaces a skill.
    pub fn skill(mut self, skill: Skill) -> Self {
        self.skills.insert(skill.id.clone(), skill);
        self
    }

    /// Adds extracted skills.
    pub fn extracted_skills(self, skills: impl IntoIterator<Item = ExtractedSkill>) -> Self {
        skills
            .into_iter()
            .fold(self, |builder, s| builder.skill(s.into_skill()))
    }

    /// Adds an alias.
    pub fn alias(mut self, alias: impl Into<String>, id: impl Into<SkillId>) -> Self {
        self.aliases.insert(alias.into(), id.into());
        self
    }

    /// Appends relationship rules.
    pub fn relationships(mut self, rules: Relationships) -> Self {
        self.relationships.conflicts.extend(rules.conflicts);
        self.relationships.discourages.extend(rules.discourages);
        self.relationships.recommends.extend(rules.recommends);
        self.relationships.requires.extend(rules.requires);
        self
    }

    /// Merges an already built matrix on top of this builder.
    ///
    /// Overlay skills replace skills with the same ID; categories and aliases
    /// are unioned with the overlay winning on key collisions.
    pub fn overlay(mut self, other: &Matrix) -> Self {
        for (id, skill) in &other.skills {
            if self.skills.contains_key(id) {
                tracing::debug!(target: "skillforge::matrix", skill = %id, "overlay replaces skill");
            }
            self.skills.insert(id.clone(), skill.clone());
        }
        for (key, category) in &other.categories {
            self.categories.insert(key.clone(), category.clone());
        }
        for (alias, id) in &other.display_name_to_id {
            self.aliases.insert(alias.clone(), id.clone());
        }
        if self.version.is_empty() {
            self.version = other.version.clone();
        }
        self
    }

    /// Resolves aliases, applies relationships, and freezes the matrix.
    pub fn build(mut self) -> BuiltMatrix {
        let aliases = self.build_aliases();
        let resolve = |name: &str| -> SkillId {
            aliases
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string())
        };

        self.apply_relationships(&resolve);
        self.normalize_skill_edges(&resolve);
        self.apply_category_flags();

        let display_names = self.build_display_names(&aliases);

        for warning in &self.warnings {
            tracing::warn!(target: "skillforge::matrix", "{warning}");
        }

        BuiltMatrix {
            matrix: Matrix {
                version: self.version,
                skills: self.skills,
                categories: self.categories,
                display_name_to_id: aliases,
                display_names,
            },
            warnings: self.warnings,
        }
    }

    /// Alias table: config aliases plus skill display names.
    ///
    /// Aliases that shadow a skill ID, or that point at an unknown skill, are
    /// dropped so alias resolution is idempotent.
    fn build_aliases(&mut self) -> BTreeMap<String, SkillId> {
        let mut candidates: Vec<(String, String)> = self
            .aliases
            .iter()
            .map(|(a, id)| (a.clone(), id.clone()))
            .collect();
        for skill in self.skills.values() {
            if let Some(name) = &skill.display_name {
                candidates.push((name.clone(), skill.id.clone()));
            }
        }

        let mut table = BTreeMap::new();
        for (alias, target) in candidates {
            if alias == target {
                continue;
            }
            if self.skills.contains_key(&alias) {
                self.warnings
                    .push(format!("alias '{alias}' shadows a skill id; ignored"));
                continue;
            }
            if !self.skills.contains_key(&target) {
                self.warnings
                    .push(format!("alias '{alias}' points at unknown skill '{target}'"));
                continue;
            }
            if let Some(previous) = table.insert(alias.clone(), target.clone()) {
                if previous != target {
                    self.warnings.push(format!(
                        "alias '{alias}' redefined from '{previous}' to '{target}'"
                    ));
                }
            }
        }
        table
    }

    fn known(&mut self, id: &str, context: &str) -> bool {
        if self.skills.contains_key(id) {
            true
        } else {
            self.warnings
                .push(format!("{context} references unknown skill '{id}'"));
            false
        }
    }

    fn apply_relationships(&mut self, resolve: &impl Fn(&str) -> SkillId) {
        let rules = std::mem::take(&mut self.relationships);

        for rule in &rules.conflicts {
            let members = self.resolve_group(&rule.skills, resolve, "conflict rule");
            for a in &members {
                for b in members.iter().filter(|b| *b != a) {
                    if let Some(skill) = self.skills.get_mut(a) {
                        push_relation(
                            &mut skill.conflicts_with,
                            SkillRelation::new(b.clone(), rule.reason.clone()),
                        );
                    }
                }
            }
        }

        for rule in &rules.discourages {
            let members = self.resolve_group(&rule.skills, resolve, "discourage rule");
            for a in &members {
                for b in members.iter().filter(|b| *b != a) {
                    if let Some(skill) = self.skills.get_mut(a) {
                        push_relation(
                            &mut skill.discourages,
                            SkillRelation::new(b.clone(), rule.reason.clone()),
                        );
                    }
                }
            }
        }

        for rule in &rules.recommends {
            let when = resolve(&rule.when);
            if !self.known(&when, "recommend rule") {
                continue;
            }
            let targets = self.resolve_group(&rule.suggest, resolve, "recommend rule");
            let Some(skill) = self.skills.get_mut(&when) else {
                continue;
            };
            for target in targets.into_iter().filter(|t| *t != when) {
                push_relation(
                    &mut skill.recommends,
                    SkillRelation::new(target, rule.reason.clone()),
                );
            }
        }

        for rule in &rules.requires {
            let skill = resolve(&rule.skill);
            if !self.known(&skill, "require rule") {
                continue;
            }
            let needs = self.resolve_group(&rule.needs, resolve, "require rule");
            if needs.is_empty() {
                continue;
            }
            if let Some(entry) = self.skills.get_mut(&skill) {
                entry.requires.push(RequirementGroup {
                    skill_ids: needs,
                    needs_any: rule.needs_any,
                    reason: rule.reason.clone(),
                });
            }
        }
    }

    fn resolve_group(
        &mut self,
        names: &[String],
        resolve: &impl Fn(&str) -> SkillId,
        context: &str,
    ) -> Vec<SkillId> {
        let mut out: Vec<SkillId> = Vec::new();
        for name in names {
            let id = resolve(name);
            if self.known(&id, context) && !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    /// Resolves aliases inside edges declared directly on skills and warns
    /// about targets that do not exist. Dangling targets are kept; the
    /// resolver treats them as "no skill found".
    fn normalize_skill_edges(&mut self, resolve: &impl Fn(&str) -> SkillId) {
        let known: Vec<SkillId> = self.skills.keys().cloned().collect();
        let mut dangling = Vec::new();

        for skill in self.skills.values_mut() {
            let relations = skill
                .conflicts_with
                .iter_mut()
                .chain(skill.recommends.iter_mut())
                .chain(skill.discourages.iter_mut());
            for relation in relations {
                relation.skill_id = resolve(&relation.skill_id);
                if !known.contains(&relation.skill_id) {
                    dangling.push((skill.id.clone(), relation.skill_id.clone()));
                }
            }
            for group in &mut skill.requires {
                for id in &mut group.skill_ids {
                    *id = resolve(id);
                    if !known.contains(id) {
                        dangling.push((skill.id.clone(), id.clone()));
                    }
                }
            }
        }

        for (from, to) in dangling {
            self.warnings
                .push(format!("skill '{from}' references unknown skill '{to}'"));
        }
    }

    fn apply_category_flags(&mut self) {
        let mut unknown = Vec::new();
        for skill in self.skills.values_mut() {
            match self.categories.get(skill.category_key()) {
                Some(definition) => {
                    skill.category_exclusive |= definition.exclusive;
                }
                None if !self.categories.is_empty() => {
                    unknown.push((skill.id.clone(), skill.category_key().to_string()));
                }
                None => {}
            }
        }
        for (id, category) in unknown {
            self.warnings
                .push(format!("skill '{id}' uses undefined category '{category}'"));
        }
    }

    /// One canonical alias per skill: its declared display name, else the
    /// first alias in sorted order.
    fn build_display_names(&self, aliases: &BTreeMap<String, SkillId>) -> BTreeMap<SkillId, String> {
        let mut names = BTreeMap::new();
        for skill in self.skills.values() {
            if let Some(name) = &skill.display_name {
                if aliases.get(name) == Some(&skill.id) {
                    names.insert(skill.id.clone(), name.clone());
                }
            }
        }
        for (alias, id) in aliases {
            names.entry(id.clone()).or_insert_with(|| alias.clone());
        }
        names
    }
}

fn push_relation(list: &mut Vec<SkillRelation>, relation: SkillRelation) {
    if !list.iter().any(|r| r.skill_id == relation.skill_id) {
        list.push(relation);
    }
}

/// Loads `skills-matrix.yaml` and merges it with skills extracted from `skills_dirs`.
///
/// Later directories override earlier ones for skills with the same ID.
pub fn load_matrix(config_path: &Path, skills_dirs: &[&Path]) -> Result<BuiltMatrix, MatrixError> {
    let config = MatrixConfig::load(config_path)?;
    let mut builder = MatrixBuilder::from_config(&config);
    for dir in skills_dirs {
        builder = builder.extracted_skills(extract_skills(dir)?);
    }
    Ok(builder.build())
}
