use super::{load_content_matrix, print_json, Session};
use crate::cli::{OutputFormat, SourceArgs};
use anyhow::{bail, Result};
use serde::Serialize;
use skillforge_matrix::{
    available_skills, is_category_all_disabled, resolve_alias, validate_selection,
    CategoryAvailability, ResolverOptions, SelectionReport, SkillId, SkillOption,
};
use tokio::runtime::Runtime;

#[derive(Serialize)]
struct ValidateOutput {
    report: SelectionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<CategoryOutput>,
}

#[derive(Serialize)]
struct CategoryOutput {
    id: String,
    availability: CategoryAvailability,
    options: Vec<SkillOption>,
}

/// Handle the `validate` command.
pub(crate) fn handle_validate_command(
    skills: Vec<String>,
    category: Option<String>,
    expert: bool,
    format: OutputFormat,
    source: SourceArgs,
) -> Result<()> {
    let session = Session::open(&source)?;
    let rt = Runtime::new()?;
    let root = rt.block_on(session.content_root())?;
    let matrix = load_content_matrix(&root)?;

    let selections: Vec<SkillId> = skills
        .iter()
        .map(|s| resolve_alias(s, &matrix).to_string())
        .collect();
    let report = validate_selection(&selections, &matrix);

    let options = ResolverOptions {
        expert_mode: expert || skillforge_state::env_expert_mode(),
    };
    let category = category.map(|id| CategoryOutput {
        availability: is_category_all_disabled(&id, &selections, &matrix, options),
        options: available_skills(&id, &selections, &matrix, options),
        id,
    });

    let valid = report.valid;
    let output = ValidateOutput { report, category };
    match format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Text => print_text(&output),
    }

    if !valid {
        bail!("selection has {} error(s)", output.report.errors.len());
    }
    Ok(())
}

fn print_text(output: &ValidateOutput) {
    let report = &output.report;
    if report.valid {
        println!("Selection is valid.");
    }
    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for issue in &report.errors {
            println!("  [{:?}] {}", issue.kind, issue.message);
        }
    }
    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for issue in &report.warnings {
            println!("  [{:?}] {}", issue.kind, issue.message);
        }
    }

    if let Some(category) = &output.category {
        println!("\nCategory {}:", category.id);
        if category.availability.disabled {
            println!(
                "  all options blocked: {}",
                category.availability.reason.as_deref().unwrap_or("unknown reason")
            );
        }
        for option in &category.options {
            let mut flags = Vec::new();
            if option.selected {
                flags.push("selected".to_string());
            }
            if option.recommended {
                flags.push("recommended".to_string());
            }
            if option.discouraged {
                flags.push("discouraged".to_string());
            }
            if let Some(reason) = &option.disabled_reason {
                flags.push(format!("disabled: {reason}"));
            }
            let suffix = if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            };
            println!("  {}{}", option.display_name, suffix);
        }
    }
}
