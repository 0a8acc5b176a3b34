//! Compilation pipeline for skillforge.
//!
//! Turns agent fragments and resolved skills into an output tree:
//!
//! ```text
//! <output>/agents/<agent>.md
//! <output>/skills/<id>/SKILL.md
//! <output>/commands/**
//! <output>/CLAUDE.md
//! ```
//!
//! Every author-controlled string is stripped of template delimiters before
//! it reaches the template engine, and compiling the same inputs twice gives
//! byte-identical output.

#![deny(unsafe_code)]

pub mod agent;
pub mod commands;
pub mod context;
pub mod engine;
pub mod error;
pub mod report;
pub mod sanitize;
pub mod skills;
pub mod stack;
pub mod validator;

pub use agent::{
    build_agent_data, compile_agent, compile_all_agents, AgentInfo, CompiledAgent,
    CompiledAgentData, CompiledSkillRef,
};
pub use commands::{compile_commands, compile_root_doc, ROOT_DOC};
pub use context::CompileContext;
pub use engine::{MiniJinjaEngine, TemplateEngine, AGENT_TEMPLATE};
pub use error::CompileError;
pub use report::{CompileFailure, CompileReport};
pub use sanitize::{strip_template_delimiters, Sanitizer, TEMPLATE_DELIMITERS};
pub use skills::{compile_all_skills, locate_skill, SkillLocation};
pub use stack::{AgentConfig, Stack};
pub use validator::{OutputValidator, SectionValidator, CONVENTIONAL_SECTIONS};

use skillforge_matrix::SkillId;
use std::path::PathBuf;

/// Result type for compile operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Everything one full compile produced.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub report: CompileReport,
    pub skills: Vec<SkillId>,
    pub commands: Vec<String>,
    pub root_doc: Option<PathBuf>,
}

/// Compiles agents, then skills, commands, and the root document.
///
/// Agent failures are collected in the report. Skill, command, and root
/// document errors abort.
pub fn compile_stack(
    agents: &[AgentConfig],
    ctx: &CompileContext<'_>,
    engine: &dyn TemplateEngine,
) -> Result<CompileOutput> {
    let report = compile_all_agents(agents, ctx, engine)?;
    let skills = compile_all_skills(agents, ctx)?;
    let commands = compile_commands(ctx)?;
    let root_doc = compile_root_doc(ctx)?;
    tracing::debug!(
        target: "skillforge::compile",
        agents = report.compiled.len(),
        failed = report.failed.len(),
        skills = skills.len(),
        commands = commands.len(),
        "compile finished"
    );
    Ok(CompileOutput {
        report,
        skills,
        commands,
        root_doc,
    })
}
