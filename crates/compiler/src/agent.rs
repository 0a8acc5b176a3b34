//! Agent compilation: fragments + skills -> rendered `agents/<name>.md`.

use crate::context::CompileContext;
use crate::engine::{TemplateEngine, AGENT_TEMPLATE};
use crate::error::{check_name, CompileError};
use crate::report::{CompileFailure, CompileReport};
use crate::sanitize::Sanitizer;
use crate::stack::AgentConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skillforge_matrix::{resolve_alias, SkillId};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const AGENT_FILE: &str = "agent.yaml";
const MAX_SEARCH_DEPTH: usize = 6;

/// `agent.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
struct AgentYaml {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tools: Vec<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    permission_mode: Option<String>,
}

/// Agent identity as rendered into the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub tools: Vec<String>,
    pub model: Option<String>,
    pub permission_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledSkillRef {
    pub id: SkillId,
    pub description: String,
    pub usage: Option<String>,
}

/// Render input for one agent. Every string in here has been sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledAgentData {
    pub agent: AgentInfo,
    pub intro: String,
    pub workflow: String,
    pub examples: Option<String>,
    pub critical_requirements: Option<String>,
    pub critical_reminders: Option<String>,
    pub output_format: Option<String>,
    /// Skills referenced lazily.
    pub skills: Vec<CompiledSkillRef>,
    /// Skills embedded in the agent.
    pub preloaded_skills: Vec<CompiledSkillRef>,
}

/// A successfully written agent.
#[derive(Debug, Clone)]
pub struct CompiledAgent {
    pub name: String,
    pub path: PathBuf,
    pub warnings: Vec<String>,
}

/// Finds `agents/**/<name>/agent.yaml`, first match in path order.
fn find_agent_dir(agents_dir: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(agents_dir)
        .max_depth(MAX_SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| {
            e.file_type().is_dir() && e.file_name() == name && e.path().join(AGENT_FILE).is_file()
        })
        .map(|e| e.into_path())
}

struct Fragments<'a> {
    agent: &'a str,
    dir: &'a Path,
}

impl Fragments<'_> {
    fn required(&self, file: &str) -> Result<String, CompileError> {
        let path = self.dir.join(file);
        fs::read_to_string(&path)
            .map(|text| normalize(&text))
            .map_err(|source| CompileError::Fragment {
                agent: self.agent.to_string(),
                path,
                source,
            })
    }

    fn optional(&self, file: &str) -> Result<Option<String>, CompileError> {
        if !self.dir.join(file).exists() {
            return Ok(None);
        }
        let text = self.required(file)?;
        Ok((!text.is_empty()).then_some(text))
    }
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

/// Reads the agent's fragments and resolves its skills into render data.
///
/// Returns the data plus warnings for skills the matrix does not know.
pub fn build_agent_data(
    config: &AgentConfig,
    ctx: &CompileContext<'_>,
) -> Result<(CompiledAgentData, Vec<String>), CompileError> {
    check_name("agent", &config.name)?;
    let agents_dir = ctx.agents_dir();
    let dir = find_agent_dir(&agents_dir, &config.name).ok_or_else(|| CompileError::AgentNotFound {
        agent: config.name.clone(),
        root: agents_dir.clone(),
    })?;

    let yaml_path = dir.join(AGENT_FILE);
    let yaml_text = fs::read_to_string(&yaml_path).map_err(|source| CompileError::Fragment {
        agent: config.name.clone(),
        path: yaml_path.clone(),
        source,
    })?;
    let meta: AgentYaml = serde_yaml::from_str(&yaml_text).map_err(|e| CompileError::AgentConfig {
        agent: config.name.clone(),
        path: yaml_path.clone(),
        message: e.to_string(),
    })?;
    if let Some(id) = meta.id.as_deref().filter(|id| *id != config.name) {
        return Err(CompileError::AgentConfig {
            agent: config.name.clone(),
            path: yaml_path,
            message: format!("id '{id}' does not match directory name"),
        });
    }

    let fragments = Fragments {
        agent: &config.name,
        dir: &dir,
    };
    let intro = fragments.required("intro.md")?;
    let workflow = fragments.required("workflow.md")?;
    let examples = fragments.optional("examples.md")?;
    let critical_requirements = fragments.optional("critical-requirements.md")?;
    let critical_reminders = fragments.optional("critical-reminders.md")?;
    let output_format = fragments.optional("output-format.md")?;

    let mut s = Sanitizer::new(&config.name);
    let agent = AgentInfo {
        name: s.field("name", &config.name),
        title: s.field("title", meta.title.as_deref().unwrap_or(&config.name)),
        description: s.field("description", &meta.description),
        tools: s.list("tools", &meta.tools),
        model: s.optional("model", meta.model.as_deref()),
        permission_mode: s.optional("permission_mode", meta.permission_mode.as_deref()),
    };
    let intro = s.field("intro", &intro);
    let workflow = s.field("workflow", &workflow);
    let examples = s.optional("examples", examples.as_deref());
    let critical_requirements = s.optional("critical_requirements", critical_requirements.as_deref());
    let critical_reminders = s.optional("critical_reminders", critical_reminders.as_deref());
    let output_format = s.optional("output_format", output_format.as_deref());

    let mut warnings = Vec::new();
    let mut seen = BTreeSet::new();
    let mut skills = Vec::new();
    let mut preloaded_skills = Vec::new();
    for assignment in &config.skills {
        let id = resolve_alias(&assignment.id, ctx.matrix);
        if !seen.insert(id.to_string()) {
            continue;
        }
        let (description, usage) = match ctx.matrix.skill(id) {
            Some(skill) => (skill.description.as_str(), skill.usage.as_deref()),
            None => {
                warnings.push(format!("{}: skill '{id}' is not in the matrix", config.name));
                ("", None)
            }
        };
        let skill = CompiledSkillRef {
            id: id.to_string(),
            description: s.field(&format!("skills.{id}.description"), description),
            usage: s.optional(&format!("skills.{id}.usage"), usage),
        };
        if assignment.preloaded {
            preloaded_skills.push(skill);
        } else {
            skills.push(skill);
        }
    }
    warnings.extend(
        s.touched()
            .iter()
            .map(|field| format!("{}: removed template delimiters from {field}", config.name)),
    );

    let data = CompiledAgentData {
        agent,
        intro,
        workflow,
        examples,
        critical_requirements,
        critical_reminders,
        output_format,
        skills,
        preloaded_skills,
    };
    Ok((data, warnings))
}

/// Compiles one agent into `output_dir/agents/<name>.md`.
pub fn compile_agent(
    config: &AgentConfig,
    ctx: &CompileContext<'_>,
    engine: &dyn TemplateEngine,
) -> Result<CompiledAgent, CompileError> {
    let (data, mut warnings) = build_agent_data(config, ctx)?;
    let context = serde_json::to_value(&data).map_err(|e| CompileError::Template {
        name: AGENT_TEMPLATE.to_string(),
        message: e.to_string(),
    })?;
    let rendered = engine.render_file(AGENT_TEMPLATE, &context)?;

    let out_dir = ctx.output_dir.join("agents");
    fs::create_dir_all(&out_dir).map_err(CompileError::io(&out_dir))?;
    let path = out_dir.join(format!("{}.md", config.name));
    fs::write(&path, &rendered).map_err(CompileError::io(&path))?;

    warnings.extend(ctx.validator.validate(&config.name, &rendered));
    for warning in &warnings {
        tracing::warn!(target: "skillforge::compile", agent = %config.name, "{}", warning);
    }
    tracing::debug!(target: "skillforge::compile", agent = %config.name, path = %path.display(), "compiled agent");
    Ok(CompiledAgent {
        name: config.name.clone(),
        path,
        warnings,
    })
}

/// Compiles every agent in parallel.
///
/// Per-agent failures land in the report; only failing to create the output
/// directory aborts the batch.
pub fn compile_all_agents(
    agents: &[AgentConfig],
    ctx: &CompileContext<'_>,
    engine: &dyn TemplateEngine,
) -> Result<CompileReport, CompileError> {
    let out_dir = ctx.output_dir.join("agents");
    fs::create_dir_all(&out_dir).map_err(|source| CompileError::OutputDir {
        path: out_dir.clone(),
        source,
    })?;

    let results: Vec<(String, Result<CompiledAgent, CompileError>)> = agents
        .par_iter()
        .map(|agent| (agent.name.clone(), compile_agent(agent, ctx, engine)))
        .collect();

    let mut report = CompileReport::default();
    for (name, result) in results {
        match result {
            Ok(compiled) => {
                report.compiled.push(compiled.name);
                report.warnings.extend(compiled.warnings);
            }
            Err(error) => {
                tracing::warn!(target: "skillforge::compile", agent = %name, %error, "agent failed to compile");
                report.failed.push(CompileFailure {
                    name,
                    error: error.to_string(),
                });
            }
        }
    }
    Ok(report.finish())
}
