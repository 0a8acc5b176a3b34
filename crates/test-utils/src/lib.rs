//! Shared test utilities for skillforge crates.
//!
//! Filesystem fixtures (skill content trees, agent fragments, project
//! configuration), gzip tarball builders for mocked remote sources, and guards
//! for tests that touch process environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = skillforge_test_utils::set_env_var("SKILLFORGE_SOURCE", Some("./skills"));
/// // SKILLFORGE_SOURCE is "./skills" until _guard drops
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// Temporary workspace with a content tree, a consuming project, and a cache root.
///
/// Layout under the tempdir:
/// - `content/skills/` skill directories
/// - `content/agents/` agent fragment directories
/// - `project/` a consuming project
/// - `cache/` an isolated cache root
pub struct TestFixture {
    pub tempdir: tempfile::TempDir,
    /// Root of the skill/agent content tree (what a source points at).
    pub content: PathBuf,
    /// `content/skills`
    pub skills: PathBuf,
    /// `content/agents`
    pub agents: PathBuf,
    /// A consuming project directory.
    pub project: PathBuf,
    /// Cache root for fetcher tests.
    pub cache: PathBuf,
}

impl TestFixture {
    /// Creates the directory layout. Does NOT set any env var.
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let content = tempdir.path().join("content");
        let skills = content.join("skills");
        let agents = content.join("agents");
        let project = tempdir.path().join("project");
        let cache = tempdir.path().join("cache");
        for dir in [&skills, &agents, &project, &cache] {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            tempdir,
            content,
            skills,
            agents,
            project,
            cache,
        })
    }

    /// Path suitable for `HOME`.
    pub fn home_path(&self) -> &Path {
        self.tempdir.path()
    }

    /// Sets `HOME` to the tempdir until the guard drops.
    pub fn home_guard(&self) -> EnvVarGuard {
        set_env_var("HOME", Some(&self.home_path().to_string_lossy()))
    }

    /// Writes `skills/<category>/<id>/SKILL.md` with frontmatter, plus a
    /// `metadata.yaml` naming the category.
    pub fn create_skill(&self, id: &str, category: &str, description: &str) -> std::io::Result<PathBuf> {
        let dir = self.skills.join(category).join(id);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {id}\ndescription: {description}\n---\n# {id}\n\nUse {id}.\n"),
        )?;
        fs::write(dir.join("metadata.yaml"), format!("category: {category}\n"))?;
        Ok(dir)
    }

    /// Writes an arbitrary file under the skills tree.
    pub fn write_skill_file(&self, rel: &str, content: &str) -> std::io::Result<PathBuf> {
        write_file(&self.skills, rel, content)
    }

    /// Writes `agents/<name>/` with `agent.yaml`, `intro.md` and `workflow.md`.
    pub fn create_agent(&self, name: &str, description: &str) -> std::io::Result<PathBuf> {
        let dir = self.agents.join(name);
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("agent.yaml"),
            format!(
                "id: {name}\ntitle: {name} agent\ndescription: {description}\ntools: [Read, Write]\nmodel: opus\npermission_mode: default\n"
            ),
        )?;
        fs::write(dir.join("intro.md"), format!("You are the {name} agent.\n"))?;
        fs::write(dir.join("workflow.md"), "1. Read the task.\n2. Do it.\n")?;
        Ok(dir)
    }

    /// Writes an arbitrary file under the agents tree.
    pub fn write_agent_file(&self, rel: &str, content: &str) -> std::io::Result<PathBuf> {
        write_file(&self.agents, rel, content)
    }

    /// Writes `content/skills-matrix.yaml`.
    pub fn write_matrix(&self, yaml: &str) -> std::io::Result<PathBuf> {
        write_file(&self.content, "skills-matrix.yaml", yaml)
    }

    /// Writes `project/.skillforge/config.yaml`.
    pub fn write_project_config(&self, yaml: &str) -> std::io::Result<PathBuf> {
        write_file(&self.project, ".skillforge/config.yaml", yaml)
    }

    /// Writes a plugin installed in the project, with one skill per ID.
    pub fn install_plugin(&self, plugin: &str, skill_ids: &[&str]) -> std::io::Result<PathBuf> {
        let root = self.project.join(".claude/plugins").join(plugin);
        write_file(
            &root,
            ".claude-plugin/plugin.json",
            &format!("{{\"name\": \"{plugin}\", \"version\": \"1.0.0\"}}"),
        )?;
        for id in skill_ids {
            write_file(
                &root,
                &format!("skills/{id}/SKILL.md"),
                &format!("---\nname: {id}\ndescription: installed {id}\n---\n"),
            )?;
        }
        Ok(root)
    }
}

/// Writes `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

/// Builds a `.tar.gz` whose entries sit under a single top-level directory,
/// the way hosted archive endpoints lay out repository snapshots.
pub fn tarball(top: &str, files: &[(&str, &str)]) -> std::io::Result<Vec<u8>> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (rel, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_cksum();
        builder.append_data(&mut header, format!("{top}/{rel}"), content.as_bytes())?;
    }
    let encoder = builder.into_inner()?;
    encoder.finish()
}

/// Every regular file under `root`, keyed by `/`-separated relative path.
pub fn read_tree(root: &Path) -> std::io::Result<BTreeMap<String, Vec<u8>>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else {
                let rel = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                out.insert(rel, fs::read(&path)?);
            }
        }
        Ok(())
    }
    let mut out = BTreeMap::new();
    if root.exists() {
        walk(root, root, &mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    #[test]
    fn test_set_env_var_sets_and_restores() {
        let _g = env_guard();
        const KEY: &str = "SKILLFORGE_TEST_UTILS_TEST_VAR";
        std::env::remove_var(KEY);

        {
            let _guard = set_env_var(KEY, Some("test_value"));
            assert_eq!(std::env::var(KEY).ok(), Some("test_value".to_string()));
        }
        assert!(std::env::var(KEY).is_err());
    }

    #[test]
    fn test_set_env_var_removes_when_none() {
        let _g = env_guard();
        const KEY: &str = "SKILLFORGE_TEST_REMOVE_VAR";
        std::env::set_var(KEY, "exists");

        {
            let _guard = set_env_var(KEY, None);
            assert!(std::env::var(KEY).is_err());
        }
        assert_eq!(std::env::var(KEY).ok(), Some("exists".to_string()));
        std::env::remove_var(KEY);
    }

    #[test]
    fn test_fixture_layout() {
        let fixture = TestFixture::new().expect("fixture creation");
        assert!(fixture.skills.is_dir());
        assert!(fixture.agents.is_dir());
        assert!(fixture.project.is_dir());

        let dir = fixture.create_skill("react", "framework", "React").unwrap();
        let meta: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(dir.join("metadata.yaml")).unwrap()).unwrap();
        assert_eq!(meta["category"], "framework");

        let agent = fixture.create_agent("web-developer", "Builds UIs").unwrap();
        assert!(agent.join("intro.md").is_file());
        assert!(agent.join("workflow.md").is_file());

        let plugin = fixture.install_plugin("web", &["react"]).unwrap();
        assert!(plugin.join("skills/react/SKILL.md").is_file());
    }

    #[test]
    fn test_tarball_has_top_level_prefix() {
        let bytes = tarball("skills-main", &[("a/SKILL.md", "hello")]).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(bytes.as_slice()));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["skills-main/a/SKILL.md"]);
    }

    #[test]
    fn test_read_tree_uses_relative_keys() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "x/y.md", "1").unwrap();
        let tree = read_tree(tmp.path()).unwrap();
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["x/y.md"]);
    }
}
