//! Annotates every skill with the sources it is available from.
//!
//! Tagging runs in five ordered phases over an accumulator keyed by skill ID,
//! then produces a new [`Matrix`]; the input matrix is consumed, never shared.
//!
//! 1. every skill gets a public entry for the primary marketplace
//! 2. `local` skills get an installed local entry
//! 3. skills installed through project plugins mark their public entry installed
//! 4. each extra source adds a private entry to the skills it contains
//! 5. the active source is the first installed entry, else the first entry

use crate::fetcher::{FetchOptions, SourceFetcher};
use crate::registry::PluginRegistry;
use futures::future::join_all;
use skillforge_matrix::{
    extract_skills, ExtractedSkill, InstallMode, Matrix, SkillId, SkillSourceEntry, SourceType,
};
use skillforge_state::ExtraSource;
use std::collections::BTreeMap;
use std::path::Path;

/// Inputs for [`load_skills_from_all_sources`].
pub struct TaggingContext<'a> {
    pub fetcher: &'a SourceFetcher,
    pub registry: &'a dyn PluginRegistry,
    pub project_dir: &'a Path,
    /// Name recorded on public entries.
    pub marketplace_name: String,
    /// Source string recorded on public entries.
    pub marketplace_url: Option<String>,
    /// Extra sources in configuration order.
    pub extra_sources: &'a [ExtraSource],
}

/// An extra source that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub name: String,
    pub url: String,
    pub error: String,
}

/// Tagging output.
#[derive(Debug, Clone)]
pub struct TaggedMatrix {
    pub matrix: Matrix,
    pub skipped: Vec<SkippedSource>,
}

#[derive(Debug, Default)]
struct SourceTags {
    entries: BTreeMap<SkillId, Vec<SkillSourceEntry>>,
}

impl SourceTags {
    fn seeded(matrix: &Matrix) -> Self {
        let entries = matrix
            .skills()
            .iter()
            .map(|(id, skill)| (id.clone(), skill.available_sources.clone()))
            .collect();
        Self { entries }
    }

    fn push(&mut self, id: &str, entry: SkillSourceEntry) {
        let list = self.entries.entry(id.to_string()).or_default();
        let exists = list
            .iter()
            .any(|e| e.name == entry.name && e.source_type == entry.source_type);
        if !exists {
            list.push(entry);
        }
    }

    fn tag_public(&mut self, matrix: &Matrix, name: &str, url: Option<&str>) {
        for id in matrix.skills().keys() {
            let mut entry = SkillSourceEntry::new(name, SourceType::Public);
            entry.url = url.map(str::to_string);
            self.push(id, entry);
        }
    }

    fn tag_local(&mut self, matrix: &Matrix) {
        for (id, skill) in matrix.skills().iter().filter(|(_, s)| s.local) {
            let mut entry = SkillSourceEntry::new("local", SourceType::Local);
            entry.url = skill.path.as_ref().map(|p| p.display().to_string());
            entry.version = skill.version.clone();
            entry.installed = true;
            entry.install_mode = Some(InstallMode::Local);
            self.push(id, entry);
        }
    }

    fn mark_installed(&mut self, matrix: &Matrix, installed: &[SkillId], name: &str, url: Option<&str>) {
        for id in installed.iter().filter(|id| matrix.skill(id).is_some()) {
            let list = self.entries.entry(id.clone()).or_default();
            match list.iter_mut().find(|e| e.source_type == SourceType::Public) {
                Some(public) => {
                    public.installed = true;
                    public.install_mode = Some(InstallMode::Plugin);
                }
                None => {
                    let mut entry = SkillSourceEntry::new(name, SourceType::Public);
                    entry.url = url.map(str::to_string);
                    entry.installed = true;
                    entry.install_mode = Some(InstallMode::Plugin);
                    list.push(entry);
                }
            }
        }
    }

    fn tag_private(&mut self, matrix: &Matrix, source: &ExtraSource, skills: &[ExtractedSkill]) -> usize {
        let mut tagged = 0;
        for found in skills.iter().filter(|s| matrix.skill(&s.id).is_some()) {
            let mut entry = SkillSourceEntry::new(&source.name, SourceType::Private).with_url(&source.url);
            entry.version = found.metadata.version.clone();
            self.push(&found.id, entry);
            tagged += 1;
        }
        tagged
    }

    fn finish(mut self, matrix: Matrix) -> Matrix {
        matrix.map_skills(|skill| {
            let sources = self.entries.remove(&skill.id).unwrap_or_default();
            skill.active_source = sources
                .iter()
                .find(|e| e.installed)
                .or_else(|| sources.first())
                .cloned();
            skill.available_sources = sources;
        })
    }
}

/// Fetches every extra source concurrently (cache-aware, never forced) and
/// extracts its skills. Results come back in configuration order.
pub(crate) async fn fetch_extra_skills(
    fetcher: &SourceFetcher,
    sources: &[ExtraSource],
) -> Vec<Result<Vec<ExtractedSkill>, String>> {
    let fetches = sources.iter().map(|source| async move {
        let fetched = fetcher
            .fetch(&source.url, &FetchOptions::default())
            .await
            .map_err(|e| e.to_string())?;
        extract_skills(&fetched.path).map_err(|e| e.to_string())
    });
    join_all(fetches).await
}

/// Runs the five tagging phases and returns the tagged matrix.
///
/// A failing extra source is logged and skipped; it never aborts tagging of
/// the others.
pub async fn load_skills_from_all_sources(matrix: Matrix, ctx: &TaggingContext<'_>) -> TaggedMatrix {
    let url = ctx.marketplace_url.as_deref();
    let mut tags = SourceTags::seeded(&matrix);

    tags.tag_public(&matrix, &ctx.marketplace_name, url);
    tags.tag_local(&matrix);

    let installed = ctx.registry.installed_skill_ids(ctx.project_dir);
    tracing::debug!(target: "skillforge::tagger", installed = installed.len(), "plugin-installed skills");
    tags.mark_installed(&matrix, &installed, &ctx.marketplace_name, url);

    let mut skipped = Vec::new();
    let results = fetch_extra_skills(ctx.fetcher, ctx.extra_sources).await;
    for (source, result) in ctx.extra_sources.iter().zip(results) {
        match result {
            Ok(skills) => {
                let tagged = tags.tag_private(&matrix, source, &skills);
                tracing::debug!(
                    target: "skillforge::tagger",
                    source = %source.name,
                    found = skills.len(),
                    tagged,
                    "tagged extra source"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: "skillforge::tagger",
                    source = %source.name,
                    url = %source.url,
                    %error,
                    "skipping extra source '{}'",
                    source.name
                );
                skipped.push(SkippedSource {
                    name: source.name.clone(),
                    url: source.url.clone(),
                    error,
                });
            }
        }
    }

    TaggedMatrix {
        matrix: tags.finish(matrix),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SourceCache;
    use skillforge_matrix::{MatrixBuilder, Skill};

    struct FixedRegistry(Vec<SkillId>);

    impl PluginRegistry for FixedRegistry {
        fn installed_skill_ids(&self, _project_dir: &Path) -> Vec<SkillId> {
            self.0.clone()
        }
    }

    fn matrix() -> Matrix {
        let mut local = Skill::new("team-style", "local");
        local.local = true;
        MatrixBuilder::new()
            .skill(Skill::new("react", "framework"))
            .skill(Skill::new("vue", "framework"))
            .skill(local)
            .build()
            .matrix
    }

    #[tokio::test]
    async fn phases_without_extra_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = SourceFetcher::new(SourceCache::new(tmp.path()));
        let registry = FixedRegistry(vec!["vue".into(), "unknown".into()]);
        let ctx = TaggingContext {
            fetcher: &fetcher,
            registry: &registry,
            project_dir: tmp.path(),
            marketplace_name: "skillforge".into(),
            marketplace_url: Some("github:skillforge/skills".into()),
            extra_sources: &[],
        };

        let tagged = load_skills_from_all_sources(matrix(), &ctx).await;
        assert!(tagged.skipped.is_empty());
        let m = tagged.matrix;

        let react = m.skill("react").unwrap();
        assert_eq!(react.available_sources.len(), 1);
        assert!(!react.available_sources[0].installed);
        assert_eq!(react.active_source.as_ref().unwrap().name, "skillforge");

        let vue = m.skill("vue").unwrap();
        let active = vue.active_source.as_ref().unwrap();
        assert!(active.installed);
        assert_eq!(active.install_mode, Some(InstallMode::Plugin));

        let local = m.skill("team-style").unwrap();
        assert_eq!(local.available_sources.len(), 2);
        assert_eq!(local.active_source.as_ref().unwrap().source_type, SourceType::Local);
        assert!(m.skill("unknown").is_none());
    }

    #[tokio::test]
    async fn tagging_twice_adds_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = SourceFetcher::new(SourceCache::new(tmp.path()));
        let registry = FixedRegistry(Vec::new());
        let ctx = TaggingContext {
            fetcher: &fetcher,
            registry: &registry,
            project_dir: tmp.path(),
            marketplace_name: "skillforge".into(),
            marketplace_url: None,
            extra_sources: &[],
        };
        let once = load_skills_from_all_sources(matrix(), &ctx).await.matrix;
        let twice = load_skills_from_all_sources(once.clone(), &ctx).await.matrix;
        assert_eq!(once, twice);
    }
}
