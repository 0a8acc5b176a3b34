//! Content-addressed cache directories for fetched sources.
//!
//! Layout under the cache root:
//! - `sources/<key>/` extracted source tree
//! - `tarballs/<key>.tar.gz` and `tarballs/<key>.etag` transport cache

use crate::error::FetchError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const HASH_LEN: usize = 16;
const PREFIX_LEN: usize = 32;
const SOURCES_DIR: &str = "sources";
const TARBALLS_DIR: &str = "tarballs";

fn sanitize_prefix(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for c in source.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    let trimmed: String = out.trim_matches('-').chars().take(PREFIX_LEN).collect();
    trimmed.trim_end_matches('-').to_string()
}

/// Stable cache key: `<sanitized-prefix>-<hash>`, or the bare hash when the
/// prefix sanitizes to nothing.
pub fn cache_key_for(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    let hash = &hex[..HASH_LEN];
    let prefix = sanitize_prefix(source);
    if prefix.is_empty() {
        hash.to_string()
    } else {
        format!("{prefix}-{hash}")
    }
}

/// Filesystem cache rooted at an explicit directory.
#[derive(Debug, Clone)]
pub struct SourceCache {
    root: PathBuf,
}

impl SourceCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extracted tree for `source`.
    pub fn cache_dir_for(&self, source: &str) -> PathBuf {
        self.root.join(SOURCES_DIR).join(cache_key_for(source))
    }

    /// Cached tarball for `source`.
    pub fn tarball_path_for(&self, source: &str) -> PathBuf {
        self.root
            .join(TARBALLS_DIR)
            .join(format!("{}.tar.gz", cache_key_for(source)))
    }

    /// ETag recorded alongside the cached tarball.
    pub fn etag_path_for(&self, source: &str) -> PathBuf {
        self.root
            .join(TARBALLS_DIR)
            .join(format!("{}.etag", cache_key_for(source)))
    }

    pub fn is_cached(&self, source: &str) -> bool {
        self.cache_dir_for(source).is_dir()
    }

    /// Cached tarball bytes and ETag, when both exist.
    pub fn cached_tarball(&self, source: &str) -> Option<(Vec<u8>, String)> {
        let etag = fs::read_to_string(self.etag_path_for(source)).ok()?;
        let bytes = fs::read(self.tarball_path_for(source)).ok()?;
        let etag = etag.trim().to_string();
        (!etag.is_empty()).then_some((bytes, etag))
    }

    /// Stores the transport cache entry for `source`.
    pub fn store_tarball(&self, source: &str, bytes: &[u8], etag: &str) -> Result<(), FetchError> {
        let tarball = self.tarball_path_for(source);
        if let Some(parent) = tarball.parent() {
            fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
        }
        fs::write(&tarball, bytes).map_err(|e| FetchError::io(&tarball, e))?;
        let etag_path = self.etag_path_for(source);
        fs::write(&etag_path, etag).map_err(|e| FetchError::io(&etag_path, e))
    }

    /// Removes the tarball and ETag for `source`.
    pub fn clear_transport(&self, source: &str) -> Result<(), FetchError> {
        for path in [self.tarball_path_for(source), self.etag_path_for(source)] {
            remove_if_exists(&path)?;
        }
        Ok(())
    }

    /// Removes the extracted tree for `source`.
    pub fn remove(&self, source: &str) -> Result<(), FetchError> {
        remove_if_exists(&self.cache_dir_for(source))
    }
}

fn remove_if_exists(path: &Path) -> Result<(), FetchError> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FetchError::io(path, e)),
    }
}
