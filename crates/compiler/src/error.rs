use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling agents, skills, and commands.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    #[error("agent '{agent}' not found under {}", root.display())]
    AgentNotFound { agent: String, root: PathBuf },

    #[error("agent '{agent}': invalid {}: {message}", path.display())]
    AgentConfig {
        agent: String,
        path: PathBuf,
        message: String,
    },

    #[error("agent '{agent}': cannot read {}: {source}", path.display())]
    Fragment {
        agent: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("skill '{id}' not found: looked for '{id}/SKILL.md' or '{id}.md' in {}", searched.display())]
    SkillNotFound { id: String, searched: PathBuf },

    #[error("invalid {kind} name '{name}': must be a single path component")]
    InvalidName { kind: &'static str, name: String },

    #[error("template '{name}': {message}")]
    Template { name: String, message: String },

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Rejects names that would escape their output directory.
pub(crate) fn check_name(kind: &'static str, name: &str) -> Result<(), CompileError> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
        || trimmed != name;
    if bad {
        return Err(CompileError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}
