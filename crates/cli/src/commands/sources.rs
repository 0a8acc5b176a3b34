use super::{load_content_matrix, print_json, Session};
use crate::cli::{OutputFormat, SourceArgs};
use anyhow::Result;
use serde::Serialize;
use skillforge_matrix::SkillSourceEntry;
use skillforge_sources::{
    fetch_marketplace, load_skills_from_all_sources, FsPluginRegistry, TaggingContext,
};
use tokio::runtime::Runtime;

#[derive(Serialize)]
struct SkillSources<'a> {
    id: &'a str,
    active: Option<&'a SkillSourceEntry>,
    available: &'a [SkillSourceEntry],
}

/// Handle the `sources` command.
pub(crate) fn handle_sources_command(format: OutputFormat, source: SourceArgs) -> Result<()> {
    let session = Session::open(&source)?;
    let settings = &session.settings;
    let rt = Runtime::new()?;

    let root = rt.block_on(session.content_root())?;
    let matrix = load_content_matrix(&root)?;

    let marketplace_name = match rt.block_on(fetch_marketplace(
        &session.fetcher,
        &settings.marketplace,
        false,
    )) {
        Ok(loaded) => loaded.marketplace.name,
        Err(error) => {
            tracing::warn!(
                target: "skillforge::cli",
                marketplace = %settings.marketplace,
                %error,
                "marketplace unavailable; naming public entries after the source"
            );
            settings.marketplace.clone()
        }
    };

    let ctx = TaggingContext {
        fetcher: &session.fetcher,
        registry: &FsPluginRegistry,
        project_dir: &settings.project_dir,
        marketplace_name,
        marketplace_url: Some(settings.marketplace.clone()),
        extra_sources: &settings.extra_sources,
    };
    let tagged = rt.block_on(load_skills_from_all_sources(matrix, &ctx));

    let rows: Vec<SkillSources<'_>> = tagged
        .matrix
        .skills()
        .values()
        .map(|skill| SkillSources {
            id: &skill.id,
            active: skill.active_source.as_ref(),
            available: &skill.available_sources,
        })
        .collect();

    if format == OutputFormat::Json {
        return print_json(&rows);
    }
    for row in &rows {
        let active = row
            .active
            .map(|e| format!("{} ({})", e.name, e.source_type.label()))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<32} {}", row.id, active);
        for entry in row.available {
            let installed = if entry.installed { " installed" } else { "" };
            let version = entry
                .version
                .as_deref()
                .map(|v| format!(" v{v}"))
                .unwrap_or_default();
            println!(
                "    {} [{}]{}{}",
                entry.name,
                entry.source_type.label(),
                version,
                installed
            );
        }
    }
    for skipped in &tagged.skipped {
        eprintln!("skipped source {} ({}): {}", skipped.name, skipped.url, skipped.error);
    }
    Ok(())
}
