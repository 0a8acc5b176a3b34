use crate::validator::{OutputValidator, SectionValidator};
use skillforge_matrix::Matrix;
use std::path::{Path, PathBuf};

/// Inputs shared by every compile step.
///
/// `source_dir` is a content root holding `agents/`, `skills/`, `commands/`
/// and an optional `CLAUDE.md`. Output always goes under `output_dir`.
#[derive(Clone, Copy)]
pub struct CompileContext<'a> {
    pub matrix: &'a Matrix,
    pub source_dir: &'a Path,
    pub output_dir: &'a Path,
    pub validator: &'a dyn OutputValidator,
}

impl<'a> CompileContext<'a> {
    pub fn new(matrix: &'a Matrix, source_dir: &'a Path, output_dir: &'a Path) -> Self {
        Self {
            matrix,
            source_dir,
            output_dir,
            validator: &SectionValidator,
        }
    }

    pub fn with_validator(self, validator: &'a dyn OutputValidator) -> Self {
        Self { validator, ..self }
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.source_dir.join("agents")
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.source_dir.join("skills")
    }

    pub fn commands_dir(&self) -> PathBuf {
        self.source_dir.join("commands")
    }
}

impl std::fmt::Debug for CompileContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileContext")
            .field("source_dir", &self.source_dir)
            .field("output_dir", &self.output_dir)
            .field("skills", &self.matrix.skills().len())
            .finish_non_exhaustive()
    }
}
