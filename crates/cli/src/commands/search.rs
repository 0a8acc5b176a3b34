use super::{print_json, Session};
use crate::cli::{OutputFormat, SourceArgs};
use anyhow::Result;
use skillforge_sources::search_extra_sources;
use tokio::runtime::Runtime;

/// Handle the `search` command.
pub(crate) fn handle_search_command(alias: String, format: OutputFormat, source: SourceArgs) -> Result<()> {
    let session = Session::open(&source)?;
    let extra = &session.settings.extra_sources;
    if extra.is_empty() {
        println!("No extra sources configured. Add `sources:` to .skillforge/config.yaml.");
        return Ok(());
    }

    let rt = Runtime::new()?;
    let found = rt.block_on(search_extra_sources(&session.fetcher, &alias, extra));

    if format == OutputFormat::Json {
        return print_json(&found);
    }
    if found.is_empty() {
        println!("No skills matching '{}' in {} extra source(s).", alias, extra.len());
        return Ok(());
    }
    for candidate in &found {
        println!(
            "{} [{}] {}",
            candidate.skill_id, candidate.source_name, candidate.description
        );
    }
    Ok(())
}
