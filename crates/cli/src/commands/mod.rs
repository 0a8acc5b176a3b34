//! CLI command handlers for the skillforge application.

mod compile;
mod fetch;
mod search;
mod sources;
mod validate;

pub(crate) use compile::handle_compile_command;
pub(crate) use fetch::handle_fetch_command;
pub(crate) use search::handle_search_command;
pub(crate) use sources::handle_sources_command;
pub(crate) use validate::handle_validate_command;

use crate::cli::SourceArgs;
use anyhow::{Context, Result};
use skillforge_matrix::{load_matrix, Matrix};
use skillforge_sources::{FetchError, FetchOptions, SourceCache, SourceFetcher};
use skillforge_state::{load_settings, Settings};
use std::path::{Path, PathBuf};

/// Matrix config file at the root of a skills source.
pub(crate) const MATRIX_FILE: &str = "skills-matrix.yaml";

/// Settings plus a fetcher wired to the configured cache and credentials.
pub(crate) struct Session {
    pub settings: Settings,
    pub fetcher: SourceFetcher,
}

impl Session {
    pub fn open(args: &SourceArgs) -> Result<Self> {
        let settings = load_settings(&args.project, args.source.as_deref())
            .with_context(|| format!("failed to load settings for {}", args.project.display()))?;
        let fetcher = SourceFetcher::new(SourceCache::new(&settings.cache_root))
            .with_auth_token(settings.auth_token.clone());
        Ok(Self { settings, fetcher })
    }

    /// Fetches the primary source and returns its content root.
    pub async fn content_root(&self) -> Result<PathBuf> {
        let source = &self.settings.source;
        tracing::info!(
            target: "skillforge::cli",
            source = %source.source,
            origin = %source.origin,
            "using primary source"
        );
        let fetched = self
            .fetcher
            .fetch(&source.source, &FetchOptions::default())
            .await
            .map_err(with_hint)?;
        Ok(fetched.path)
    }
}

/// Converts a fetch error into an error carrying its remediation hint.
pub(crate) fn with_hint(err: FetchError) -> anyhow::Error {
    match err.remediation() {
        Some(hint) => anyhow::anyhow!("{err}\nhint: {hint}"),
        None => anyhow::Error::new(err),
    }
}

/// Loads `skills-matrix.yaml` and the `skills/` tree under `root`.
pub(crate) fn load_content_matrix(root: &Path) -> Result<Matrix> {
    let skills_dir = root.join("skills");
    let built = load_matrix(&root.join(MATRIX_FILE), &[skills_dir.as_path()])?;
    for warning in &built.warnings {
        tracing::warn!(target: "skillforge::matrix", "{}", warning);
    }
    Ok(built.matrix)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
