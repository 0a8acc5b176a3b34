//! Pure queries over a [`Matrix`] and a current selection.
//!
//! Nothing here performs I/O or fails. Unknown skill IDs behave as "no skill
//! found": boolean queries answer `false`, list queries come back empty.

use crate::types::{Matrix, RequirementGroup, Skill, SkillId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolver switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Bypass conflict checks. Requirements are still enforced.
    #[serde(default)]
    pub expert_mode: bool,
}

/// Classification of a selection problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Two selected skills conflict.
    Conflict,
    /// A selected skill's requirement group is unsatisfied.
    MissingRequirement,
    /// More than one selected skill in an exclusive category.
    CategoryExclusive,
    /// A selected skill recommends something that is not selected.
    MissingRecommendation,
}

/// One problem found by [`validate_selection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionIssue {
    /// Problem class.
    pub kind: IssueKind,
    /// Human-readable description naming the skills involved.
    pub message: String,
    /// Skills involved, in the order they are named in `message`.
    pub skills: Vec<SkillId>,
}

/// Result of auditing a full selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionReport {
    /// `true` when `errors` is empty.
    pub valid: bool,
    /// Blocking problems.
    pub errors: Vec<SelectionIssue>,
    /// Advisory problems.
    pub warnings: Vec<SelectionIssue>,
}

/// A skill as presented to a selection UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillOption {
    /// Skill ID.
    pub id: SkillId,
    /// Canonical alias, or the ID.
    pub display_name: String,
    /// Skill description.
    pub description: String,
    /// Already in the selection.
    pub selected: bool,
    /// Cannot be added; see `disabled_reason`.
    pub disabled: bool,
    /// Why the skill is disabled.
    pub disabled_reason: Option<String>,
    /// A discourage edge links it with the selection.
    pub discouraged: bool,
    /// A recommend edge links it with the selection.
    pub recommended: bool,
}

/// Whether every skill in a category is currently blocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAvailability {
    /// Every skill in the category is disabled.
    pub disabled: bool,
    /// Reason reported for the first disabled skill.
    pub reason: Option<String>,
}

/// Maps an alias to its skill ID; anything else is returned unchanged.
pub fn resolve_alias<'a>(id_or_alias: &'a str, matrix: &'a Matrix) -> &'a str {
    matrix
        .display_name_to_id
        .get(id_or_alias)
        .map(String::as_str)
        .unwrap_or(id_or_alias)
}

fn resolve_all<'a>(selections: &'a [SkillId], matrix: &'a Matrix) -> Vec<&'a str> {
    selections.iter().map(|s| resolve_alias(s, matrix)).collect()
}

/// Either direction of a conflict edge between `a` and `b`, with its reason.
fn conflict_between<'a>(a: &str, b: &str, matrix: &'a Matrix) -> Option<&'a str> {
    if a == b {
        return None;
    }
    matrix
        .skill(a)
        .and_then(|s| s.conflict_with(b))
        .or_else(|| matrix.skill(b).and_then(|s| s.conflict_with(a)))
        .map(|r| r.reason.as_str())
}

fn first_conflict<'a>(
    skill: &str,
    selected: &[&'a str],
    matrix: &'a Matrix,
) -> Option<(&'a str, &'a str)> {
    selected
        .iter()
        .find_map(|other| conflict_between(skill, other, matrix).map(|reason| (*other, reason)))
}

fn owned(selected: &[&str]) -> Vec<SkillId> {
    selected.iter().map(|s| s.to_string()).collect()
}

/// Every requirement group of `skill` the selection leaves unsatisfied,
/// each paired with its message.
fn unmet_requirements<'a>(
    skill: &'a Skill,
    selected: &[SkillId],
    matrix: &Matrix,
) -> Vec<(&'a RequirementGroup, String)> {
    skill
        .requires
        .iter()
        .filter(|group| !group.is_satisfied_by(selected))
        .map(|group| (group, describe_requirement(group, selected, matrix)))
        .collect()
}

fn describe_requirement(group: &RequirementGroup, selected: &[SkillId], matrix: &Matrix) -> String {
    let names: Vec<&str> = if group.needs_any {
        group.skill_ids.iter().map(|id| matrix.label(id)).collect()
    } else {
        group
            .missing_from(selected)
            .into_iter()
            .map(|id| matrix.label(id))
            .collect()
    };
    let head = if group.needs_any && names.len() > 1 {
        format!("Requires one of {}", names.join(", "))
    } else {
        format!("Requires {}", names.join(", "))
    };
    if group.reason.is_empty() {
        head
    } else {
        format!("{head}: {}", group.reason)
    }
}

/// Whether `skill_id` cannot be added to `selections`.
///
/// A skill is disabled when it conflicts, in either direction, with a
/// selected skill (skipped in expert mode), or when any of its requirement
/// groups is unsatisfied (never skipped).
pub fn is_disabled(
    skill_id: &str,
    selections: &[SkillId],
    matrix: &Matrix,
    options: ResolverOptions,
) -> bool {
    disable_reason(skill_id, selections, matrix, options).is_some()
}

/// The explanation behind [`is_disabled`], naming the blocking skill(s) and
/// the declared reason.
pub fn disable_reason(
    skill_id: &str,
    selections: &[SkillId],
    matrix: &Matrix,
    options: ResolverOptions,
) -> Option<String> {
    let id = resolve_alias(skill_id, matrix);
    let skill = matrix.skill(id)?;
    let selected = resolve_all(selections, matrix);

    if !options.expert_mode {
        if let Some((other, reason)) = first_conflict(id, &selected, matrix) {
            let label = matrix.label(other);
            return Some(if reason.is_empty() {
                format!("Conflicts with {label}")
            } else {
                format!("Conflicts with {label}: {reason}")
            });
        }
    }

    let unmet = unmet_requirements(skill, &owned(&selected), matrix);
    if unmet.is_empty() {
        return None;
    }
    let messages: Vec<String> = unmet.into_iter().map(|(_, message)| message).collect();
    Some(messages.join("; "))
}

/// Reason `skill_id` is discouraged next to `selections`, in either direction.
pub fn discourage_reason(skill_id: &str, selections: &[SkillId], matrix: &Matrix) -> Option<String> {
    let id = resolve_alias(skill_id, matrix);
    matrix.skill(id)?;
    resolve_all(selections, matrix)
        .into_iter()
        .filter(|other| *other != id)
        .find_map(|other| {
            let relation = matrix
                .skill(id)
                .and_then(|s| s.discouragement_of(other))
                .or_else(|| matrix.skill(other).and_then(|s| s.discouragement_of(id)))?;
            Some(describe("Discouraged with", matrix.label(other), &relation.reason))
        })
}

/// Reason `skill_id` is recommended by (or recommends) a selected skill.
pub fn recommend_reason(skill_id: &str, selections: &[SkillId], matrix: &Matrix) -> Option<String> {
    let id = resolve_alias(skill_id, matrix);
    matrix.skill(id)?;
    resolve_all(selections, matrix)
        .into_iter()
        .filter(|other| *other != id)
        .find_map(|other| {
            let relation = matrix
                .skill(other)
                .and_then(|s| s.recommendation_of(id))
                .or_else(|| matrix.skill(id).and_then(|s| s.recommendation_of(other)))?;
            Some(describe("Recommended with", matrix.label(other), &relation.reason))
        })
}

fn describe(prefix: &str, label: &str, reason: &str) -> String {
    if reason.is_empty() {
        format!("{prefix} {label}")
    } else {
        format!("{prefix} {label}: {reason}")
    }
}

/// Advisory: a discourage edge links `skill_id` with a selected skill.
pub fn is_discouraged(skill_id: &str, selections: &[SkillId], matrix: &Matrix) -> bool {
    discourage_reason(skill_id, selections, matrix).is_some()
}

/// Advisory: a recommend edge links `skill_id` with a selected skill.
pub fn is_recommended(skill_id: &str, selections: &[SkillId], matrix: &Matrix) -> bool {
    recommend_reason(skill_id, selections, matrix).is_some()
}

/// Audits a complete selection and reports every violated rule at once.
///
/// Conflicts are checked over unordered pairs, so a conflict is found no
/// matter which of the two skills declares it or where each sits in the list.
/// Unknown IDs are logged and ignored.
pub fn validate_selection(selections: &[SkillId], matrix: &Matrix) -> SelectionReport {
    let mut report = SelectionReport {
        valid: true,
        ..Default::default()
    };

    let mut selected: Vec<&str> = Vec::with_capacity(selections.len());
    for raw in selections {
        let id = resolve_alias(raw, matrix);
        if matrix.skill(id).is_none() {
            tracing::warn!(target: "skillforge::matrix", skill = %raw, "unknown skill in selection");
            continue;
        }
        if !selected.contains(&id) {
            selected.push(id);
        }
    }
    let selected_owned = owned(&selected);

    for (i, a) in selected.iter().enumerate() {
        for b in &selected[i + 1..] {
            if let Some(reason) = conflict_between(a, b, matrix) {
                report.errors.push(SelectionIssue {
                    kind: IssueKind::Conflict,
                    message: describe(
                        &format!("{} conflicts with", matrix.label(a)),
                        matrix.label(b),
                        reason,
                    ),
                    skills: vec![a.to_string(), b.to_string()],
                });
            }
        }
    }

    for id in &selected {
        let Some(skill) = matrix.skill(id) else {
            continue;
        };
        for (group, message) in unmet_requirements(skill, &selected_owned, matrix) {
            let mut skills = vec![id.to_string()];
            skills.extend(group.skill_ids.iter().cloned());
            report.errors.push(SelectionIssue {
                kind: IssueKind::MissingRequirement,
                message: format!("{}: {message}", matrix.label(id)),
                skills,
            });
        }
    }

    let mut exclusive: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for id in &selected {
        if let Some(skill) = matrix.skill(id).filter(|s| s.category_exclusive) {
            exclusive.entry(skill.category_key()).or_default().push(*id);
        }
    }
    for (category, members) in exclusive.into_iter().filter(|(_, m)| m.len() > 1) {
        let labels: Vec<&str> = members.iter().map(|id| matrix.label(id)).collect();
        let category_label = matrix
            .categories
            .get(category)
            .map(|c| c.display_name.as_str())
            .unwrap_or(category);
        report.errors.push(SelectionIssue {
            kind: IssueKind::CategoryExclusive,
            message: format!(
                "Only one {category_label} skill may be selected: {}",
                labels.join(", ")
            ),
            skills: owned(&members),
        });
    }

    for id in &selected {
        let Some(skill) = matrix.skill(id) else {
            continue;
        };
        for relation in &skill.recommends {
            let target = relation.skill_id.as_str();
            if selected.contains(&target) || matrix.skill(target).is_none() {
                continue;
            }
            if selected
                .iter()
                .any(|s| conflict_between(target, s, matrix).is_some())
            {
                continue;
            }
            let mut message = format!("{} recommends {}", matrix.label(id), matrix.label(target));
            if !relation.reason.is_empty() {
                message.push_str(&format!(" ({})", relation.reason));
            }
            report.warnings.push(SelectionIssue {
                kind: IssueKind::MissingRecommendation,
                message,
                skills: vec![id.to_string(), target.to_string()],
            });
        }
    }

    report.valid = report.errors.is_empty();
    report
}

/// Skills whose category or subcategory is `category`, ordered by ID.
pub fn skills_by_category<'a>(category: &str, matrix: &'a Matrix) -> Vec<&'a Skill> {
    matrix
        .skills
        .values()
        .filter(|s| s.in_category(category))
        .collect()
}

/// Presentation rows for every skill in `category`.
pub fn available_skills(
    category: &str,
    selections: &[SkillId],
    matrix: &Matrix,
    options: ResolverOptions,
) -> Vec<SkillOption> {
    let selected = resolve_all(selections, matrix);
    skills_by_category(category, matrix)
        .into_iter()
        .map(|skill| {
            let is_selected = selected.contains(&skill.id.as_str());
            let reason = if is_selected {
                None
            } else {
                disable_reason(&skill.id, selections, matrix, options)
            };
            SkillOption {
                id: skill.id.clone(),
                display_name: matrix.label(&skill.id).to_string(),
                description: skill.description.clone(),
                selected: is_selected,
                disabled: reason.is_some(),
                disabled_reason: reason,
                discouraged: is_discouraged(&skill.id, selections, matrix),
                recommended: is_recommended(&skill.id, selections, matrix),
            }
        })
        .collect()
}

/// Whether nothing in `category` can currently be selected.
///
/// An empty category is never reported as disabled. When every skill is
/// blocked, the reason of the first one (by ID) is reported.
pub fn is_category_all_disabled(
    category: &str,
    selections: &[SkillId],
    matrix: &Matrix,
    options: ResolverOptions,
) -> CategoryAvailability {
    let skills = skills_by_category(category, matrix);
    if skills.is_empty() {
        return CategoryAvailability::default();
    }
    let mut first_reason = None;
    for skill in skills {
        match disable_reason(&skill.id, selections, matrix, options) {
            None => return CategoryAvailability::default(),
            Some(reason) => {
                first_reason.get_or_insert(reason);
            }
        }
    }
    CategoryAvailability {
        disabled: true,
        reason: first_reason,
    }
}
