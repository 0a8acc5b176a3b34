//! Fetches local or remote sources into the cache.

use crate::cache::SourceCache;
use crate::error::FetchError;
use crate::source::{check_relative, parse_source, ProviderHosts, RemoteSource, SourceSpec};
use flate2::read::GzDecoder;
use reqwest::header::{AUTHORIZATION, ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = concat!("skillforge/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Options for [`SourceFetcher::fetch`].
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Discard cached content and the transport cache, then download again.
    pub force_refresh: bool,
    /// Subdirectory of the fetched tree to return.
    pub subdir: Option<String>,
}

/// Where a fetched source lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub path: PathBuf,
    pub from_cache: bool,
    pub source: String,
}

/// Downloads remote sources into a [`SourceCache`] and resolves local ones.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    cache: SourceCache,
    client: reqwest::Client,
    hosts: ProviderHosts,
    auth_token: Option<String>,
}

impl SourceFetcher {
    pub fn new(cache: SourceCache) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            cache,
            client,
            hosts: ProviderHosts::default(),
            auth_token: None,
        }
    }

    /// Overrides provider base URLs.
    pub fn with_hosts(mut self, hosts: ProviderHosts) -> Self {
        self.hosts = hosts;
        self
    }

    /// Sends `Authorization: Bearer <token>` on remote requests.
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Resolves `source` to a directory on disk.
    ///
    /// Local sources are never cached. A remote source already in the cache
    /// is returned without touching the network unless `force_refresh` is set.
    pub async fn fetch(&self, source: &str, options: &FetchOptions) -> Result<FetchResult, FetchError> {
        if let Some(subdir) = &options.subdir {
            check_relative(subdir, source)?;
        }
        let source = source.trim();

        let remote = match parse_source(source)? {
            SourceSpec::Local(path) => return resolve_local(source, &path, options),
            SourceSpec::Remote(remote) => remote,
        };

        let dir = self.cache.cache_dir_for(source);
        let result = |from_cache| FetchResult {
            path: join_subdirs(&dir, remote.subdir(), options.subdir.as_deref()),
            from_cache,
            source: source.to_string(),
        };

        if options.force_refresh {
            tracing::debug!(target: "skillforge::sources", source, "forced refresh");
            self.cache.clear_transport(source)?;
            self.cache.remove(source)?;
        } else if dir.is_dir() {
            tracing::debug!(target: "skillforge::sources", source, "cache hit");
            return Ok(result(true));
        }

        tracing::debug!(target: "skillforge::sources", source, "cache miss");
        let bytes = self.download(source, &remote).await?;
        let target = dir.clone();
        tokio::task::spawn_blocking(move || extract_tarball(&bytes, &target))
            .await
            .map_err(|e| FetchError::Other {
                url: source.to_string(),
                message: format!("extraction task failed: {e}"),
            })??;

        Ok(result(false))
    }

    async fn download(&self, source: &str, remote: &RemoteSource) -> Result<Vec<u8>, FetchError> {
        let url = remote.tarball_url(&self.hosts);
        let cached = self.cache.cached_tarball(source);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.auth_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some((_, etag)) = &cached {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        let response = request.send().await.map_err(|e| FetchError::Network {
            url: source.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            if let Some((bytes, _)) = cached {
                tracing::debug!(target: "skillforge::sources", source, "tarball not modified");
                return Ok(bytes);
            }
        }
        if !status.is_success() {
            return Err(translate_status(source, status));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network {
                url: source.to_string(),
                message: e.to_string(),
            })?
            .to_vec();

        if let Some(etag) = etag {
            if let Err(e) = self.cache.store_tarball(source, &bytes, &etag) {
                tracing::warn!(target: "skillforge::sources", source, error = %e, "failed to store tarball cache");
            }
        }
        Ok(bytes)
    }
}

fn translate_status(source: &str, status: StatusCode) -> FetchError {
    let url = source.to_string();
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound { url },
        StatusCode::UNAUTHORIZED => FetchError::Unauthorized { url },
        StatusCode::FORBIDDEN => FetchError::Forbidden { url },
        other => FetchError::Other {
            url,
            message: format!("HTTP {other}"),
        },
    }
}

fn resolve_local(source: &str, path: &Path, options: &FetchOptions) -> Result<FetchResult, FetchError> {
    let absolute = std::path::absolute(path).map_err(|e| FetchError::io(path, e))?;
    if !absolute.is_dir() {
        return Err(FetchError::LocalNotFound(absolute));
    }
    Ok(FetchResult {
        path: join_subdirs(&absolute, None, options.subdir.as_deref()),
        from_cache: false,
        source: source.to_string(),
    })
}

fn join_subdirs(base: &Path, first: Option<&str>, second: Option<&str>) -> PathBuf {
    [first, second]
        .into_iter()
        .flatten()
        .fold(base.to_path_buf(), |acc, sub| acc.join(sub))
}

/// Extracts a gzip tarball into `dest`, dropping the archive's top-level
/// directory. The tree is staged next to `dest` and renamed into place.
///
/// Entries with absolute or `..` components and non-regular files are skipped.
pub fn extract_tarball(bytes: &[u8], dest: &Path) -> Result<(), FetchError> {
    let parent = dest.parent().unwrap_or(dest);
    fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = parent.join(format!(".{name}.partial"));
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| FetchError::io(&staging, e))?;
    }
    fs::create_dir_all(&staging).map_err(|e| FetchError::io(&staging, e))?;

    let invalid = |message: String| FetchError::Other {
        url: dest.display().to_string(),
        message,
    };

    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| invalid(format!("invalid tarball: {e}")))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| invalid(format!("invalid tarball entry: {e}")))?;
        let kind = entry.header().entry_type();
        if !(kind.is_file() || kind.is_dir()) {
            continue;
        }
        let path = entry
            .path()
            .map_err(|e| invalid(format!("invalid entry path: {e}")))?
            .into_owned();
        let mut components = path.components();
        components.next();
        let stripped = components.as_path();
        if stripped.as_os_str().is_empty()
            || !stripped
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            continue;
        }
        let target = staging.join(stripped);
        if kind.is_dir() {
            fs::create_dir_all(&target).map_err(|e| FetchError::io(&target, e))?;
            continue;
        }
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).map_err(|e| FetchError::io(dir, e))?;
        }
        entry
            .unpack(&target)
            .map_err(|e| FetchError::io(&target, e))?;
    }

    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| FetchError::io(dest, e))?;
    }
    fs::rename(&staging, dest).map_err(|e| FetchError::io(dest, e))
}
