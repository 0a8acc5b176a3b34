use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching a source or loading a marketplace manifest.
///
/// Remote failures are translated into a fixed set of categories, each with
/// a [`remediation`](FetchError::remediation) hint for the user.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("source not found: {url}")]
    NotFound { url: String },

    #[error("authentication failed for {url}")]
    Unauthorized { url: String },

    #[error("access forbidden for {url}")]
    Forbidden { url: String },

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("failed to fetch {url}: {message}")]
    Other { url: String, message: String },

    #[error("local source not found: {}", .0.display())]
    LocalNotFound(PathBuf),

    #[error("refusing path traversal in source '{0}'")]
    PathTraversal(String),

    #[error("marketplace manifest not found at {}", path.display())]
    MarketplaceMissing { path: PathBuf },

    #[error("marketplace manifest {} is {size} bytes (limit {limit})", path.display())]
    ManifestTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("marketplace manifest {} nests deeper than {limit} levels", path.display())]
    ManifestTooDeep { path: PathBuf, limit: usize },

    #[error("marketplace lists {count} plugins (limit {limit})")]
    TooManyPlugins { count: usize, limit: usize },

    #[error("invalid marketplace manifest {}: {message}", path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Actionable guidance for the user, when there is any.
    pub fn remediation(&self) -> Option<&'static str> {
        Some(match self {
            FetchError::NotFound { .. } => {
                "Check the repository name and ref. Private repositories report not-found without a token; set SKILLFORGE_AUTH_TOKEN or GITHUB_TOKEN."
            }
            FetchError::Unauthorized { .. } => {
                "The auth token was rejected. Verify SKILLFORGE_AUTH_TOKEN or GITHUB_TOKEN is valid and not expired."
            }
            FetchError::Forbidden { .. } => {
                "The token lacks access to this repository, or the host rate-limited the request. Check token scopes or retry later."
            }
            FetchError::Network { .. } => {
                "Check your network connection and proxy settings, then retry."
            }
            FetchError::LocalNotFound(_) => {
                "Local sources must point at an existing directory. Use an absolute path or one starting with './'."
            }
            FetchError::PathTraversal(_) => {
                "Relative sources must start with './'. Remote sources need a prefix such as github:, gitlab:, bitbucket: or https://."
            }
            FetchError::MarketplaceMissing { .. } => {
                "A marketplace source must contain .claude-plugin/marketplace.json at its root."
            }
            _ => return None,
        })
    }

    /// True for remote failures that only affect one source.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            FetchError::NotFound { .. }
                | FetchError::Unauthorized { .. }
                | FetchError::Forbidden { .. }
                | FetchError::Network { .. }
                | FetchError::Other { .. }
        )
    }
}
