use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading matrix configuration or skill content.
///
/// Selection problems are never errors; see [`crate::SelectionReport`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MatrixError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A file was read but could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A file parsed but failed structural validation.
    #[error("invalid matrix config {}: {}", path.display(), issues.join("; "))]
    Invalid {
        /// Offending file.
        path: PathBuf,
        /// Every issue found, in file order.
        issues: Vec<String>,
    },

    /// A skill content directory does not exist.
    #[error("skills directory not found: {}", .0.display())]
    SkillsDirMissing(PathBuf),
}
