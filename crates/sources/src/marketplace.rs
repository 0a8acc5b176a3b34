//! Loading `.claude-plugin/marketplace.json` from a fetched source.

use crate::error::FetchError;
use crate::fetcher::{FetchOptions, SourceFetcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const MARKETPLACE_DIR: &str = ".claude-plugin";
pub const MARKETPLACE_FILE: &str = "marketplace.json";
pub const MAX_MANIFEST_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_JSON_DEPTH: usize = 10;
pub const MAX_PLUGINS: usize = 10_000;
pub const MAX_PLUGIN_NAME_LEN: usize = 100;

/// A person or organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Where a plugin's content lives: a source string or a structured object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginSource {
    Path(String),
    Object(serde_json::Map<String, serde_json::Value>),
}

/// One plugin listed in a marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplacePlugin {
    pub name: String,
    pub source: PluginSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Contact>,
}

/// Parsed marketplace manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marketplace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Contact>,
    pub plugins: Vec<MarketplacePlugin>,
}

/// A marketplace together with where it was read from.
#[derive(Debug, Clone)]
pub struct LoadedMarketplace {
    pub marketplace: Marketplace,
    /// Root of the fetched source (parent of `.claude-plugin`).
    pub root: PathBuf,
    pub from_cache: bool,
    /// Suspicious plugin names, one message each.
    pub warnings: Vec<String>,
}

/// Maximum nesting of objects and arrays, ignoring brackets inside strings.
pub fn json_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => {
                depth += 1;
                max = max.max(depth);
            }
            '}' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

fn is_safe_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '/' | '-'))
}

/// Warnings for implausible plugin names. Never fails.
pub fn plugin_name_warnings(marketplace: &Marketplace) -> Vec<String> {
    let mut warnings = Vec::new();
    for plugin in &marketplace.plugins {
        if plugin.name.chars().count() > MAX_PLUGIN_NAME_LEN {
            warnings.push(format!(
                "plugin name is longer than {MAX_PLUGIN_NAME_LEN} characters: {}...",
                plugin.name.chars().take(32).collect::<String>()
            ));
        } else if plugin.name.is_empty() || !is_safe_name(&plugin.name) {
            warnings.push(format!("plugin name has unexpected characters: {:?}", plugin.name));
        }
    }
    warnings
}

/// Warnings for plugin versions that are not semantic versions. Never fails.
pub fn plugin_version_warnings(marketplace: &Marketplace) -> Vec<String> {
    marketplace
        .plugins
        .iter()
        .filter_map(|plugin| {
            let version = plugin.version.as_deref()?;
            semver::Version::parse(version.trim_start_matches('v'))
                .err()
                .map(|e| format!("plugin '{}' has invalid version {version:?}: {e}", plugin.name))
        })
        .collect()
}

/// Parses manifest text after enforcing the depth and plugin-count caps.
pub fn parse_marketplace(text: &str, path: &Path) -> Result<Marketplace, FetchError> {
    if json_depth(text) > MAX_JSON_DEPTH {
        return Err(FetchError::ManifestTooDeep {
            path: path.to_path_buf(),
            limit: MAX_JSON_DEPTH,
        });
    }
    let marketplace: Marketplace =
        serde_json::from_str(text).map_err(|e| FetchError::InvalidManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    if marketplace.name.trim().is_empty() {
        return Err(FetchError::InvalidManifest {
            path: path.to_path_buf(),
            message: "marketplace name is empty".to_string(),
        });
    }
    if marketplace.plugins.len() > MAX_PLUGINS {
        return Err(FetchError::TooManyPlugins {
            count: marketplace.plugins.len(),
            limit: MAX_PLUGINS,
        });
    }
    Ok(marketplace)
}

/// Reads at most [`MAX_MANIFEST_BYTES`] from `path`.
pub fn read_manifest(path: &Path) -> Result<String, FetchError> {
    let file = fs::File::open(path).map_err(|e| FetchError::io(path, e))?;
    let size = file.metadata().map_err(|e| FetchError::io(path, e))?.len();
    if size > MAX_MANIFEST_BYTES {
        return Err(FetchError::ManifestTooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_MANIFEST_BYTES,
        });
    }
    let mut text = String::new();
    file.take(MAX_MANIFEST_BYTES + 1)
        .read_to_string(&mut text)
        .map_err(|e| FetchError::io(path, e))?;
    if text.len() as u64 > MAX_MANIFEST_BYTES {
        return Err(FetchError::ManifestTooLarge {
            path: path.to_path_buf(),
            size: text.len() as u64,
            limit: MAX_MANIFEST_BYTES,
        });
    }
    Ok(text)
}

/// Fetches `source` and loads its marketplace manifest.
pub async fn fetch_marketplace(
    fetcher: &SourceFetcher,
    source: &str,
    force_refresh: bool,
) -> Result<LoadedMarketplace, FetchError> {
    let fetched = fetcher
        .fetch(
            source,
            &FetchOptions {
                force_refresh,
                subdir: Some(MARKETPLACE_DIR.to_string()),
            },
        )
        .await?;
    let manifest = fetched.path.join(MARKETPLACE_FILE);
    if !manifest.is_file() {
        return Err(FetchError::MarketplaceMissing { path: manifest });
    }

    let text = read_manifest(&manifest)?;
    let marketplace = parse_marketplace(&text, &manifest)?;
    let mut warnings = plugin_name_warnings(&marketplace);
    warnings.extend(plugin_version_warnings(&marketplace));
    for warning in &warnings {
        tracing::warn!(target: "skillforge::sources", source, "{warning}");
    }
    tracing::debug!(
        target: "skillforge::sources",
        source,
        marketplace = %marketplace.name,
        plugins = marketplace.plugins.len(),
        "loaded marketplace"
    );

    let root = fetched
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fetched.path.clone());
    Ok(LoadedMarketplace {
        marketplace,
        root,
        from_cache: fetched.from_cache,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_ignores_brackets_in_strings() {
        assert_eq!(json_depth(r#"{"a": "[[[{{{", "b": [1, {"c": []}]}"#), 4);
        assert_eq!(json_depth(r#"{"a": "\"[["}"#), 1);
        assert_eq!(json_depth("42"), 0);
    }

    #[test]
    fn parses_string_and_object_sources() {
        let text = r#"{
            "name": "acme",
            "owner": {"name": "Acme"},
            "plugins": [
                {"name": "web", "source": "./plugins/web"},
                {"name": "api", "source": {"source": "github", "repo": "acme/api"}}
            ]
        }"#;
        let m = parse_marketplace(text, Path::new("m.json")).unwrap();
        assert_eq!(m.plugins.len(), 2);
        assert!(matches!(m.plugins[0].source, PluginSource::Path(_)));
        assert!(matches!(m.plugins[1].source, PluginSource::Object(_)));
        assert!(plugin_name_warnings(&m).is_empty());
        assert!(plugin_version_warnings(&m).is_empty());
    }

    #[test]
    fn non_semver_versions_warn() {
        let text = r#"{"name": "acme", "plugins": [
            {"name": "web", "source": "./web", "version": "v1.2.0"},
            {"name": "api", "source": "./api", "version": "latest"}
        ]}"#;
        let m = parse_marketplace(text, Path::new("m.json")).unwrap();
        let warnings = plugin_version_warnings(&m);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'api'"));
    }

    #[test]
    fn too_deep_is_rejected_before_parsing() {
        let text = format!("{{\"name\":\"x\",\"plugins\":[],\"deep\":{}{}}}", "[".repeat(12), "]".repeat(12));
        let err = parse_marketplace(&text, Path::new("m.json")).unwrap_err();
        assert!(matches!(err, FetchError::ManifestTooDeep { limit: 10, .. }));
    }

    #[test]
    fn odd_names_warn_but_parse() {
        let long = "x".repeat(101);
        let text = format!(
            r#"{{"name":"m","plugins":[{{"name":"{long}","source":"./a"}},{{"name":"bad name;rm","source":"./b"}}]}}"#
        );
        let m = parse_marketplace(&text, Path::new("m.json")).unwrap();
        let warnings = plugin_name_warnings(&m);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("longer than 100"));
        assert!(warnings[1].contains("bad name;rm"));
    }

    #[test]
    fn missing_fields_are_invalid() {
        let err = parse_marketplace(r#"{"plugins": []}"#, Path::new("m.json")).unwrap_err();
        assert!(matches!(err, FetchError::InvalidManifest { .. }));
    }

    #[test]
    fn oversize_manifest_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(MARKETPLACE_FILE);
        let file = fs::File::create(&path).unwrap();
        file.set_len(MAX_MANIFEST_BYTES + 1).unwrap();
        let err = read_manifest(&path).unwrap_err();
        assert!(matches!(err, FetchError::ManifestTooLarge { .. }));
    }
}
