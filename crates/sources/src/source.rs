//! Classifies source strings as local paths or remote archives.

use crate::error::FetchError;
use std::path::{Component, Path, PathBuf};

const DEFAULT_REF: &str = "main";

/// Hosted git providers with a tarball archive endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
    GitLab,
    Bitbucket,
}

/// Base URLs for each provider; overridable so tests can use a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHosts {
    pub github: String,
    pub gitlab: String,
    pub bitbucket: String,
}

impl Default for ProviderHosts {
    fn default() -> Self {
        Self {
            github: "https://github.com".to_string(),
            gitlab: "https://gitlab.com".to_string(),
            bitbucket: "https://bitbucket.org".to_string(),
        }
    }
}

impl ProviderHosts {
    /// Points every provider at one base URL.
    pub fn all(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            github: base.clone(),
            gitlab: base.clone(),
            bitbucket: base,
        }
    }
}

/// A remote source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSource {
    /// `provider:org/repo[/sub/dir][#ref]`
    Repo {
        provider: Provider,
        org: String,
        repo: String,
        subdir: Option<String>,
        reference: String,
    },
    /// A direct `http(s)://` tarball URL.
    Url(String),
}

impl RemoteSource {
    /// URL of the gzip tarball for this source.
    pub fn tarball_url(&self, hosts: &ProviderHosts) -> String {
        match self {
            RemoteSource::Url(url) => url.clone(),
            RemoteSource::Repo {
                provider,
                org,
                repo,
                reference,
                ..
            } => match provider {
                Provider::GitHub => format!(
                    "{}/{org}/{repo}/archive/{reference}.tar.gz",
                    hosts.github.trim_end_matches('/')
                ),
                Provider::GitLab => format!(
                    "{}/{org}/{repo}/-/archive/{reference}/{repo}-{reference}.tar.gz",
                    hosts.gitlab.trim_end_matches('/')
                ),
                Provider::Bitbucket => format!(
                    "{}/{org}/{repo}/get/{reference}.tar.gz",
                    hosts.bitbucket.trim_end_matches('/')
                ),
            },
        }
    }

    /// Subdirectory inside the archive named by the source string.
    pub fn subdir(&self) -> Option<&str> {
        match self {
            RemoteSource::Repo { subdir, .. } => subdir.as_deref(),
            RemoteSource::Url(_) => None,
        }
    }
}

/// A parsed source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Local(PathBuf),
    Remote(RemoteSource),
}

const PROVIDERS: [(&str, Provider); 4] = [
    ("github:", Provider::GitHub),
    ("gh:", Provider::GitHub),
    ("gitlab:", Provider::GitLab),
    ("bitbucket:", Provider::Bitbucket),
];

/// Whether `source` names a remote location.
pub fn is_remote(source: &str) -> bool {
    let s = source.trim();
    s.starts_with("https://")
        || s.starts_with("http://")
        || PROVIDERS.iter().any(|(prefix, _)| s.starts_with(prefix))
}

/// Rejects `..` and absolute components in a relative path fragment.
pub(crate) fn check_relative(fragment: &str, source: &str) -> Result<(), FetchError> {
    let safe = Path::new(fragment)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(())
    } else {
        Err(FetchError::PathTraversal(source.to_string()))
    }
}

fn parse_repo(provider: Provider, rest: &str, source: &str) -> Result<RemoteSource, FetchError> {
    let (path, reference) = match rest.split_once('#') {
        Some((path, r)) if !r.trim().is_empty() => (path, r.trim()),
        Some((path, _)) => (path, DEFAULT_REF),
        None => (rest, DEFAULT_REF),
    };
    let mut parts = path.trim_matches('/').splitn(3, '/');
    let org = parts.next().unwrap_or_default();
    let repo = parts.next().unwrap_or_default();
    if org.is_empty() || repo.is_empty() {
        return Err(FetchError::Other {
            url: source.to_string(),
            message: "expected provider:org/repo".to_string(),
        });
    }
    let subdir = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    for fragment in [Some(org), Some(repo), subdir.as_deref(), Some(reference)]
        .into_iter()
        .flatten()
    {
        check_relative(fragment, source)?;
    }
    Ok(RemoteSource::Repo {
        provider,
        org: org.to_string(),
        repo: repo.to_string(),
        subdir,
        reference: reference.to_string(),
    })
}

/// Parses a source string.
///
/// Strings beginning with `/` or `.` are local paths. Strings with a remote
/// prefix are remote. Anything else is local, unless it contains `..` or `~`,
/// which is treated as path traversal.
pub fn parse_source(source: &str) -> Result<SourceSpec, FetchError> {
    let s = source.trim();
    if s.is_empty() {
        return Err(FetchError::LocalNotFound(PathBuf::new()));
    }
    if s.starts_with('/') || s.starts_with('.') {
        return Ok(SourceSpec::Local(PathBuf::from(s)));
    }
    if s.starts_with("https://") || s.starts_with("http://") {
        return Ok(SourceSpec::Remote(RemoteSource::Url(s.to_string())));
    }
    for (prefix, provider) in PROVIDERS {
        if let Some(rest) = s.strip_prefix(prefix) {
            return parse_repo(provider, rest, s).map(SourceSpec::Remote);
        }
    }
    if s.contains("..") || s.contains('~') {
        return Err(FetchError::PathTraversal(s.to_string()));
    }
    Ok(SourceSpec::Local(PathBuf::from(s)))
}
