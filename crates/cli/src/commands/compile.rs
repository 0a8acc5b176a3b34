use super::{load_content_matrix, Session};
use crate::cli::SourceArgs;
use anyhow::{bail, Context, Result};
use skillforge_compiler::{compile_stack, CompileContext, MiniJinjaEngine, Stack};
use std::path::PathBuf;
use tokio::runtime::Runtime;

/// Handle the `compile` command.
pub(crate) fn handle_compile_command(
    stack: PathBuf,
    output: PathBuf,
    template_dirs: Vec<PathBuf>,
    source: SourceArgs,
) -> Result<()> {
    let stack = Stack::load(&stack)?;
    let agents = stack.agents();
    if agents.is_empty() {
        println!("Stack has no agents; nothing to compile.");
        return Ok(());
    }

    let session = Session::open(&source)?;
    let rt = Runtime::new()?;
    let root = rt.block_on(session.content_root())?;
    let matrix = load_content_matrix(&root)?;

    let engine = MiniJinjaEngine::new(template_dirs);
    let ctx = CompileContext::new(&matrix, &root, &output);
    let result = compile_stack(&agents, &ctx, &engine)
        .with_context(|| format!("failed to compile into {}", output.display()))?;

    let report = &result.report;
    tracing::info!(
        target: "skillforge::cli",
        stack = stack.name.as_deref().unwrap_or("unnamed"),
        output = %output.display(),
        "{}",
        report.summary()
    );
    println!("{}", report.summary());
    println!(
        "Wrote {} skill(s), {} command(s){}",
        result.skills.len(),
        result.commands.len(),
        if result.root_doc.is_some() { ", CLAUDE.md" } else { "" }
    );
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
    for failure in &report.failed {
        eprintln!("  failed: {}: {}", failure.name, failure.error);
    }
    if !report.is_success() {
        bail!("{} agent(s) failed to compile", report.failed.len());
    }
    Ok(())
}
