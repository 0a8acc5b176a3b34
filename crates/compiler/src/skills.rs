//! Skill compilation: copies each referenced skill once into `skills/<id>/`.

use crate::context::CompileContext;
use crate::error::{check_name, CompileError};
use crate::stack::AgentConfig;
use skillforge_matrix::{resolve_alias, SkillAssignment, SkillId};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const SKILL_FILE: &str = "SKILL.md";
const REFERENCE_FILE: &str = "reference.md";
const SUPPORT_DIRS: [&str; 2] = ["examples", "scripts"];
const MAX_SEARCH_DEPTH: usize = 8;

/// Where a skill's content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillLocation {
    /// A directory with `SKILL.md` and optional support files.
    Folder(PathBuf),
    /// A single `<id>.md` file.
    File(PathBuf),
}

impl SkillLocation {
    fn probe(path: &Path) -> Option<Self> {
        if path.join(SKILL_FILE).is_file() {
            Some(Self::Folder(path.to_path_buf()))
        } else if path.is_file() {
            Some(Self::File(path.to_path_buf()))
        } else {
            None
        }
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Locates a skill's content.
///
/// Order: the assignment's explicit path (relative to the source root), the
/// path recorded in the matrix, then a search of the skills tree for a
/// `<id>/SKILL.md` directory or a `<id>.md` file.
pub fn locate_skill(
    id: &str,
    assignment: &SkillAssignment,
    ctx: &CompileContext<'_>,
) -> Result<SkillLocation, CompileError> {
    if let Some(rel) = assignment.path.as_deref() {
        let rel = Path::new(rel);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(CompileError::InvalidName {
                kind: "skill path",
                name: rel.display().to_string(),
            });
        }
        if let Some(found) = SkillLocation::probe(&ctx.source_dir.join(rel)) {
            return Ok(found);
        }
    }

    if let Some(path) = ctx.matrix.skill(id).and_then(|s| s.path.as_deref()) {
        if path.join(SKILL_FILE).is_file() {
            return Ok(SkillLocation::Folder(path.to_path_buf()));
        }
    }

    let skills_dir = ctx.skills_dir();
    let single = format!("{id}.md");
    WalkDir::new(&skills_dir)
        .max_depth(MAX_SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .find_map(|e| {
            let name = e.file_name();
            if e.file_type().is_dir() && name == id && e.path().join(SKILL_FILE).is_file() {
                Some(SkillLocation::Folder(e.into_path()))
            } else if e.file_type().is_file() && name == single.as_str() {
                Some(SkillLocation::File(e.into_path()))
            } else {
                None
            }
        })
        .ok_or_else(|| CompileError::SkillNotFound {
            id: id.to_string(),
            searched: skills_dir,
        })
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

/// Copies `from` to `to`, normalising Markdown line endings.
fn copy_file(from: &Path, to: &Path) -> Result<(), CompileError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(CompileError::io(parent))?;
    }
    if is_markdown(from) {
        let text = fs::read_to_string(from).map_err(CompileError::io(from))?;
        fs::write(to, normalize_line_endings(&text)).map_err(CompileError::io(to))
    } else {
        fs::copy(from, to).map(|_| ()).map_err(CompileError::io(from))
    }
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), CompileError> {
    let walker = WalkDir::new(from)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = entry.map_err(|e| CompileError::Io {
            path: from.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(from) else {
            continue;
        };
        copy_file(entry.path(), &to.join(rel))?;
    }
    Ok(())
}

fn write_skill(id: &str, location: &SkillLocation, out: &Path) -> Result<(), CompileError> {
    if out.exists() {
        fs::remove_dir_all(out).map_err(CompileError::io(out))?;
    }
    match location {
        SkillLocation::File(path) => copy_file(path, &out.join(SKILL_FILE))?,
        SkillLocation::Folder(dir) => {
            copy_file(&dir.join(SKILL_FILE), &out.join(SKILL_FILE))?;
            let reference = dir.join(REFERENCE_FILE);
            if reference.is_file() {
                copy_file(&reference, &out.join(REFERENCE_FILE))?;
            }
            for sub in SUPPORT_DIRS {
                let src = dir.join(sub);
                if src.is_dir() {
                    copy_tree(&src, &out.join(sub))?;
                }
            }
        }
    }
    tracing::debug!(target: "skillforge::compile", skill = %id, out = %out.display(), "compiled skill");
    Ok(())
}

/// Writes every skill referenced by any agent to `output_dir/skills/<id>/`.
///
/// Aliases are resolved first and each skill is written once no matter how
/// many agents share it; the first assignment seen decides its location. A
/// skill whose content cannot be found fails the whole call.
pub fn compile_all_skills(
    agents: &[AgentConfig],
    ctx: &CompileContext<'_>,
) -> Result<Vec<SkillId>, CompileError> {
    let mut unique: BTreeMap<SkillId, &SkillAssignment> = BTreeMap::new();
    for assignment in agents.iter().flat_map(|a| &a.skills) {
        let id = resolve_alias(&assignment.id, ctx.matrix);
        unique.entry(id.to_string()).or_insert(assignment);
    }

    let out_root = ctx.output_dir.join("skills");
    if !unique.is_empty() {
        fs::create_dir_all(&out_root).map_err(|source| CompileError::OutputDir {
            path: out_root.clone(),
            source,
        })?;
    }

    for (id, assignment) in &unique {
        check_name("skill", id)?;
        let location = locate_skill(id, assignment, ctx)?;
        write_skill(id, &location, &out_root.join(id))?;
    }
    Ok(unique.into_keys().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillforge_matrix::{MatrixBuilder, Skill};
    use skillforge_test_utils::{read_tree, write_file, TestFixture};

    #[test]
    fn shared_skills_are_written_once_with_support_files() {
        let fx = TestFixture::new().unwrap();
        fx.create_skill("react", "framework", "React").unwrap();
        fx.write_skill_file("framework/react/reference.md", "ref\r\nline\r\n").unwrap();
        fx.write_skill_file("framework/react/examples/basic.md", "ex\r\n").unwrap();
        fx.write_skill_file("framework/react/scripts/check.sh", "echo hi\r\n").unwrap();
        fx.write_skill_file("framework/react/notes.txt", "not copied").unwrap();
        fx.write_skill_file("state/zustand.md", "---\nname: zustand\n---\r\nBody\r\n").unwrap();

        let matrix = MatrixBuilder::new()
            .skill(Skill::new("react", "framework"))
            .build()
            .matrix;
        let out = tempfile::tempdir().unwrap();
        let ctx = CompileContext::new(&matrix, &fx.content, out.path());
        let agents = [
            AgentConfig::new("a", vec![SkillAssignment::dynamic("react")]),
            AgentConfig::new(
                "b",
                vec![SkillAssignment::preloaded("react"), SkillAssignment::dynamic("zustand")],
            ),
        ];

        let ids = compile_all_skills(&agents, &ctx).unwrap();
        assert_eq!(ids, ["react", "zustand"]);

        let tree = read_tree(&out.path().join("skills")).unwrap();
        let files: Vec<_> = tree.keys().map(String::as_str).collect();
        assert_eq!(
            files,
            [
                "react/SKILL.md",
                "react/examples/basic.md",
                "react/reference.md",
                "react/scripts/check.sh",
                "zustand/SKILL.md",
            ]
        );
        assert_eq!(tree["react/reference.md"], b"ref\nline\n");
        assert_eq!(tree["react/scripts/check.sh"], b"echo hi\r\n");
        assert_eq!(tree["zustand/SKILL.md"], b"---\nname: zustand\n---\nBody\n");
    }

    #[test]
    fn missing_skill_is_a_named_error() {
        let fx = TestFixture::new().unwrap();
        let matrix = MatrixBuilder::new().build().matrix;
        let out = tempfile::tempdir().unwrap();
        let ctx = CompileContext::new(&matrix, &fx.content, out.path());
        let agents = [AgentConfig::new("a", vec![SkillAssignment::dynamic("ghost")])];

        let err = compile_all_skills(&agents, &ctx).unwrap_err();
        assert!(matches!(err, CompileError::SkillNotFound { ref id, .. } if id == "ghost"));
        assert!(err.to_string().contains("ghost.md"));
    }

    #[test]
    fn explicit_paths_must_stay_inside_the_source() {
        let fx = TestFixture::new().unwrap();
        write_file(fx.tempdir.path(), "outside/SKILL.md", "---\nname: sneaky\n---\n").unwrap();
        let matrix = MatrixBuilder::new().build().matrix;
        let out = tempfile::tempdir().unwrap();
        let ctx = CompileContext::new(&matrix, &fx.content, out.path());
        let mut assignment = SkillAssignment::dynamic("sneaky");
        assignment.path = Some("../outside".into());

        let err = locate_skill("sneaky", &assignment, &ctx).unwrap_err();
        assert!(matches!(err, CompileError::InvalidName { .. }));
    }

    #[test]
    fn no_agents_writes_nothing() {
        let fx = TestFixture::new().unwrap();
        let matrix = MatrixBuilder::new().build().matrix;
        let out = tempfile::tempdir().unwrap();
        let ctx = CompileContext::new(&matrix, &fx.content, out.path());
        assert!(compile_all_skills(&[], &ctx).unwrap().is_empty());
        assert!(!out.path().join("skills").exists());
    }
}
