//! Global and project configuration files and the layered source lookup.

use crate::env::{self, DEFAULT_SOURCE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory inside a project holding its skillforge config.
pub const PROJECT_DIR: &str = ".skillforge";
/// Config file name, both globally and per project.
pub const CONFIG_FILE: &str = "config.yaml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid config {}: {}", path.display(), issues.join("; "))]
    Invalid { path: PathBuf, issues: Vec<String> },

    #[error("cannot locate configuration directory: {0}")]
    Location(String),
}

/// A named extra source of private skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSource {
    pub name: String,
    pub url: String,
}

/// Contents of a `config.yaml`. The same shape is used globally and per project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillforgeConfig {
    /// Primary skill source.
    #[serde(default)]
    pub source: Option<String>,
    /// Marketplace source, when it differs from `source`.
    #[serde(default)]
    pub marketplace: Option<String>,
    /// Extra sources, tagged as private.
    #[serde(default)]
    pub sources: Vec<ExtraSource>,
    /// Name of an env var holding the auth token.
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

impl SkillforgeConfig {
    /// Structural checks; returns every issue found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.source.as_deref().is_some_and(|s| s.trim().is_empty()) {
            issues.push("source is empty".to_string());
        }
        let mut seen = Vec::new();
        for (i, extra) in self.sources.iter().enumerate() {
            if extra.name.trim().is_empty() {
                issues.push(format!("sources[{i}] has an empty name"));
            } else if seen.contains(&extra.name) {
                issues.push(format!("sources[{i}] duplicates name '{}'", extra.name));
            } else {
                seen.push(extra.name.clone());
            }
            if extra.url.trim().is_empty() {
                issues.push(format!("sources[{i}] has an empty url"));
            }
        }
        issues
    }

    /// Loads and validates `path`. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        let config: Self = serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let issues = config.validate();
        if !issues.is_empty() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                issues,
            });
        }
        tracing::debug!(target: "skillforge::config", path = %path.display(), "loaded config");
        Ok(Some(config))
    }
}

/// `<project>/.skillforge/config.yaml`
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_DIR).join(CONFIG_FILE)
}

/// Layer a resolved setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Flag,
    Env,
    Project,
    Global,
    Default,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceOrigin::Flag => "--source flag",
            SourceOrigin::Env => "SKILLFORGE_SOURCE",
            SourceOrigin::Project => "project config",
            SourceOrigin::Global => "global config",
            SourceOrigin::Default => "default",
        };
        f.write_str(label)
    }
}

/// The primary source and where it was configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    pub source: String,
    pub origin: SourceOrigin,
}

/// Picks the primary source: flag, env, project, global, default.
pub fn resolve_source_from(
    flag: Option<&str>,
    env_value: Option<&str>,
    project: Option<&SkillforgeConfig>,
    global: Option<&SkillforgeConfig>,
) -> ResolvedSource {
    let layered = [
        (flag, SourceOrigin::Flag),
        (env_value, SourceOrigin::Env),
        (project.and_then(|c| c.source.as_deref()), SourceOrigin::Project),
        (global.and_then(|c| c.source.as_deref()), SourceOrigin::Global),
    ];
    layered
        .into_iter()
        .find_map(|(value, origin)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| ResolvedSource {
                    source: v.to_string(),
                    origin,
                })
        })
        .unwrap_or_else(|| ResolvedSource {
            source: DEFAULT_SOURCE.to_string(),
            origin: SourceOrigin::Default,
        })
}

/// Everything a command needs to know about where skills come from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: ResolvedSource,
    /// Marketplace source; falls back to the primary source.
    pub marketplace: String,
    /// Extra sources from the project config, in file order.
    pub extra_sources: Vec<ExtraSource>,
    pub auth_token: Option<String>,
    pub cache_root: PathBuf,
    pub project_dir: PathBuf,
}

/// Reads environment, global config and project config for `project_dir`.
pub fn load_settings(project_dir: &Path, flag: Option<&str>) -> Result<Settings, ConfigError> {
    let global_path =
        env::global_config_path().map_err(|e| ConfigError::Location(e.to_string()))?;
    let global = SkillforgeConfig::load(&global_path)?;
    let project = SkillforgeConfig::load(&project_config_path(project_dir))?;

    let env_value = env::env_source();
    let source = resolve_source_from(flag, env_value.as_deref(), project.as_ref(), global.as_ref());

    let marketplace = project
        .as_ref()
        .and_then(|c| c.marketplace.clone())
        .or_else(|| global.as_ref().and_then(|c| c.marketplace.clone()))
        .unwrap_or_else(|| source.source.clone());

    let token_env = project
        .as_ref()
        .and_then(|c| c.auth_token_env.clone())
        .or_else(|| global.as_ref().and_then(|c| c.auth_token_env.clone()));

    let extra_sources = project.map(|c| c.sources).unwrap_or_default();
    let cache_root = env::cache_root().map_err(|e| ConfigError::Location(e.to_string()))?;

    tracing::debug!(
        target: "skillforge::config",
        source = %source.source,
        origin = %source.origin,
        extra = extra_sources.len(),
        "resolved settings"
    );

    Ok(Settings {
        source,
        marketplace,
        extra_sources,
        auth_token: env::auth_token(token_env.as_deref()),
        cache_root,
        project_dir: project_dir.to_path_buf(),
    })
}
