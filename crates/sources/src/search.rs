use crate::fetcher::SourceFetcher;
use crate::tagger::fetch_extra_skills;
use serde::Serialize;
use skillforge_matrix::SkillId;
use skillforge_state::ExtraSource;

/// A skill in an extra source whose directory name matches an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCandidate {
    pub skill_id: SkillId,
    pub source_name: String,
    pub source_url: String,
    pub alias: String,
    pub description: String,
}

/// Case-insensitive match of `alias` against the last path segment of every
/// skill directory in every extra source. Sources that fail are logged and skipped.
pub async fn search_extra_sources(
    fetcher: &SourceFetcher,
    alias: &str,
    sources: &[ExtraSource],
) -> Vec<SearchCandidate> {
    let needle = alias.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    let results = fetch_extra_skills(fetcher, sources).await;
    for (source, result) in sources.iter().zip(results) {
        let skills = match result {
            Ok(skills) => skills,
            Err(error) => {
                tracing::warn!(
                    target: "skillforge::sources",
                    source = %source.name,
                    %error,
                    "search skipped extra source '{}'",
                    source.name
                );
                continue;
            }
        };
        candidates.extend(
            skills
                .into_iter()
                .filter(|s| s.dir_name().to_lowercase() == needle)
                .map(|s| SearchCandidate {
                    skill_id: s.id.clone(),
                    source_name: source.name.clone(),
                    source_url: source.url.clone(),
                    alias: alias.trim().to_string(),
                    description: s.description,
                }),
        );
    }
    candidates
}
