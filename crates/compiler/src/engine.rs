//! Template rendering seam.
//!
//! The compiler only ever hands the engine plain data (strings, lists, and
//! maps serialized to JSON), never callables.

use crate::error::CompileError;
use minijinja::{AutoEscape, Environment, ErrorKind};
use std::path::PathBuf;

/// Name of the agent template.
pub const AGENT_TEMPLATE: &str = "agent.md.j2";

const BUILTIN_AGENT_TEMPLATE: &str = include_str!("../templates/agent.md.j2");

#[cfg(test)]
use mockall::automock;

/// Renders a named template against a data-only context.
#[cfg_attr(test, automock)]
pub trait TemplateEngine: Send + Sync {
    fn render_file(&self, name: &str, context: &serde_json::Value) -> Result<String, CompileError>;
}

/// minijinja-backed engine.
///
/// Templates are looked up in the user template directories in order, then
/// among the built-in templates.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new(template_dirs: Vec<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("yaml_scalar", yaml_scalar);
        env.set_loader(move |name| {
            if name.split(['/', '\\']).any(|seg| seg == "..") {
                return Ok(None);
            }
            for dir in &template_dirs {
                let path = dir.join(name);
                if path.is_file() {
                    return std::fs::read_to_string(&path).map(Some).map_err(|e| {
                        minijinja::Error::new(
                            ErrorKind::InvalidOperation,
                            format!("cannot read {}", path.display()),
                        )
                        .with_source(e)
                    });
                }
            }
            Ok(builtin(name).map(str::to_string))
        });
        Self { env }
    }

    /// Engine with only the built-in templates.
    pub fn builtin() -> Self {
        Self::new(Vec::new())
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Renders a string as a single-line YAML scalar.
///
/// Plain style is kept where YAML allows it. Multi-line values fall back to a
/// double-quoted JSON string, which is also a valid YAML scalar.
fn yaml_scalar(value: String) -> Result<String, minijinja::Error> {
    let bad = |e: &dyn std::fmt::Display| {
        minijinja::Error::new(ErrorKind::BadSerialization, format!("cannot quote value: {e}"))
    };
    let yaml = serde_yaml::to_string(&value).map_err(|e| bad(&e))?;
    let yaml = yaml.trim_end_matches('\n');
    if yaml.contains('\n') {
        return serde_json::to_string(&value).map_err(|e| bad(&e));
    }
    Ok(yaml.to_string())
}

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        AGENT_TEMPLATE => Some(BUILTIN_AGENT_TEMPLATE),
        _ => None,
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render_file(&self, name: &str, context: &serde_json::Value) -> Result<String, CompileError> {
        let template_error = |e: minijinja::Error| CompileError::Template {
            name: name.to_string(),
            message: e.to_string(),
        };
        let template = self.env.get_template(name).map_err(template_error)?;
        template
            .render(minijinja::Value::from_serialize(context))
            .map_err(template_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_template_dirs_take_precedence() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join(AGENT_TEMPLATE), "second {{ agent.name }}").unwrap();
        std::fs::write(second.path().join("other.j2"), "other").unwrap();
        std::fs::write(first.path().join(AGENT_TEMPLATE), "first {{ agent.name }}").unwrap();

        let engine = MiniJinjaEngine::new(vec![first.path().into(), second.path().into()]);
        let ctx = json!({ "agent": { "name": "web" } });
        assert_eq!(engine.render_file(AGENT_TEMPLATE, &ctx).unwrap(), "first web");
        assert_eq!(engine.render_file("other.j2", &ctx).unwrap(), "other");
    }

    #[test]
    fn unknown_and_escaping_names_are_template_errors() {
        let engine = MiniJinjaEngine::builtin();
        for name in ["missing.j2", "../agent.md.j2"] {
            let err = engine.render_file(name, &json!({})).unwrap_err();
            assert!(matches!(err, CompileError::Template { .. }), "{name}");
        }
    }

    #[test]
    fn builtin_agent_template_renders_minimal_context() {
        let ctx = json!({
            "agent": {
                "name": "web-developer",
                "title": "Web Developer",
                "description": "Builds UIs",
                "tools": ["Read", "Write"],
                "model": "opus",
                "permission_mode": null
            },
            "intro": "You build UIs.",
            "workflow": "1. Build.",
            "examples": null,
            "critical_requirements": null,
            "critical_reminders": null,
            "output_format": null,
            "skills": [],
            "preloaded_skills": [{ "id": "react", "description": "React", "usage": null }]
        });
        let out = MiniJinjaEngine::builtin()
            .render_file(AGENT_TEMPLATE, &ctx)
            .unwrap();
        assert!(out.starts_with("---\nname: web-developer\n"));
        assert!(out.contains("tools: Read, Write\n"));
        assert!(!out.contains("permissionMode"));
        assert!(out.contains("skills:\n  - react\n"));
        assert!(out.contains("<role>\nYou build UIs.\n</role>"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn yaml_scalar_quotes_only_when_needed() {
        assert_eq!(yaml_scalar("web-developer".into()).unwrap(), "web-developer");
        assert_eq!(yaml_scalar("Use when: building UIs".into()).unwrap(), "'Use when: building UIs'");
        assert_eq!(yaml_scalar("true".into()).unwrap(), "'true'");

        let multi = yaml_scalar("Harmless\npermissionMode: bypassPermissions".into()).unwrap();
        assert!(!multi.contains('\n'));
        let back: String = serde_yaml::from_str(&multi).unwrap();
        assert_eq!(back, "Harmless\npermissionMode: bypassPermissions");
    }
}
