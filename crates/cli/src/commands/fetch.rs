use super::{with_hint, Session};
use crate::cli::SourceArgs;
use anyhow::Result;
use skillforge_sources::{fetch_marketplace, FetchError, FetchOptions};
use tokio::runtime::Runtime;

/// Handle the `fetch` command.
pub(crate) fn handle_fetch_command(
    target: Option<String>,
    refresh: bool,
    subdir: Option<String>,
    source: SourceArgs,
) -> Result<()> {
    let session = Session::open(&source)?;
    let target = target.unwrap_or_else(|| session.settings.source.source.clone());
    let options = FetchOptions {
        force_refresh: refresh,
        subdir,
    };

    let rt = Runtime::new()?;
    let fetched = rt
        .block_on(session.fetcher.fetch(&target, &options))
        .map_err(with_hint)?;
    println!(
        "{} -> {}{}",
        fetched.source,
        fetched.path.display(),
        if fetched.from_cache { " (cached)" } else { "" }
    );

    // Reads the manifest from the tree fetched above.
    match rt.block_on(fetch_marketplace(&session.fetcher, &target, false)) {
        Ok(loaded) => {
            println!(
                "marketplace {}: {} plugin(s)",
                loaded.marketplace.name,
                loaded.marketplace.plugins.len()
            );
            for warning in &loaded.warnings {
                println!("  warning: {warning}");
            }
        }
        Err(FetchError::MarketplaceMissing { .. }) => {}
        Err(err) => return Err(with_hint(err)),
    }
    Ok(())
}
