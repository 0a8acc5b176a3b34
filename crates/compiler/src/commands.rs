//! Command files and the root instruction document.

use crate::context::CompileContext;
use crate::error::CompileError;
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Root instruction document name, both in the source and in the output.
pub const ROOT_DOC: &str = "CLAUDE.md";

/// Copies `commands/**` verbatim into `output_dir/commands/`.
///
/// Returns the copied paths relative to `commands/`, sorted. A missing or
/// empty commands directory is a no-op.
pub fn compile_commands(ctx: &CompileContext<'_>) -> Result<Vec<String>, CompileError> {
    let src = ctx.commands_dir();
    if !src.is_dir() {
        return Ok(Vec::new());
    }

    let out = ctx.output_dir.join("commands");
    let mut copied = Vec::new();
    for entry in WalkDir::new(&src).sort_by_file_name() {
        let entry = entry.map_err(|e| CompileError::Io {
            path: src.clone(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&src) else {
            continue;
        };
        let dest = out.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(CompileError::io(parent))?;
        }
        fs::copy(entry.path(), &dest).map_err(CompileError::io(entry.path()))?;
        copied.push(rel.to_string_lossy().replace('\\', "/"));
    }
    if !copied.is_empty() {
        tracing::debug!(target: "skillforge::compile", count = copied.len(), "copied commands");
    }
    Ok(copied)
}

/// Writes the source `CLAUDE.md` to `output_dir/CLAUDE.md`.
///
/// Returns `None` without writing when the source is absent or blank.
pub fn compile_root_doc(ctx: &CompileContext<'_>) -> Result<Option<PathBuf>, CompileError> {
    let src = ctx.source_dir.join(ROOT_DOC);
    if !src.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&src).map_err(CompileError::io(&src))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    fs::create_dir_all(ctx.output_dir).map_err(|source| CompileError::OutputDir {
        path: ctx.output_dir.to_path_buf(),
        source,
    })?;
    let dest = ctx.output_dir.join(ROOT_DOC);
    let mut body = text.replace("\r\n", "\n");
    if !body.ends_with('\n') {
        body.push('\n');
    }
    fs::write(&dest, body).map_err(CompileError::io(&dest))?;
    Ok(Some(dest))
}
