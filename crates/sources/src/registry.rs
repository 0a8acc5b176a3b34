use serde::Deserialize;
use skillforge_matrix::{extract_skills, SkillId};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Discovers which skills a project has installed through plugins.
pub trait PluginRegistry: Send + Sync {
    /// Installed skill IDs, sorted and de-duplicated. Read-only.
    fn installed_skill_ids(&self, project_dir: &Path) -> Vec<SkillId>;
}

#[derive(Debug, Deserialize)]
struct PluginManifest {
    name: String,
}

/// Reads `<project>/.claude/plugins/*/.claude-plugin/plugin.json` and the
/// `skills/` tree beneath each plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPluginRegistry;

impl PluginRegistry for FsPluginRegistry {
    fn installed_skill_ids(&self, project_dir: &Path) -> Vec<SkillId> {
        let plugins_dir = project_dir.join(".claude").join("plugins");
        let Ok(entries) = fs::read_dir(&plugins_dir) else {
            return Vec::new();
        };

        let mut ids = BTreeSet::new();
        for entry in entries.flatten() {
            let plugin_dir = entry.path();
            let manifest_path = plugin_dir.join(".claude-plugin").join("plugin.json");
            let Ok(text) = fs::read_to_string(&manifest_path) else {
                continue;
            };
            let manifest: PluginManifest = match serde_json::from_str(&text) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(
                        target: "skillforge::sources",
                        path = %manifest_path.display(),
                        error = %e,
                        "skipping plugin with invalid manifest"
                    );
                    continue;
                }
            };
            let skills_dir = plugin_dir.join("skills");
            if !skills_dir.is_dir() {
                continue;
            }
            match extract_skills(&skills_dir) {
                Ok(skills) => {
                    tracing::debug!(
                        target: "skillforge::sources",
                        plugin = %manifest.name,
                        skills = skills.len(),
                        "installed plugin"
                    );
                    ids.extend(skills.into_iter().map(|s| s.id));
                }
                Err(e) => tracing::warn!(
                    target: "skillforge::sources",
                    plugin = %manifest.name,
                    error = %e,
                    "failed to read plugin skills"
                ),
            }
        }
        ids.into_iter().collect()
    }
}
