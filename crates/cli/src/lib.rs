//! The `skillforge` command line.
//!
//! Wires configuration, sources, the matrix resolver, and the compiler to a
//! handful of subcommands.

#![deny(unsafe_code)]

pub mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

/// The main entry point for the `skillforge` application.
pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate {
            skills,
            category,
            expert,
            format,
            source,
        } => commands::handle_validate_command(skills, category, expert, format, source),
        Commands::Fetch {
            target,
            refresh,
            subdir,
            source,
        } => commands::handle_fetch_command(target, refresh, subdir, source),
        Commands::Sources { format, source } => commands::handle_sources_command(format, source),
        Commands::Search {
            alias,
            format,
            source,
        } => commands::handle_search_command(alias, format, source),
        Commands::Compile {
            stack,
            output,
            template_dirs,
            source,
        } => commands::handle_compile_command(stack, output, template_dirs, source),
    }
}
