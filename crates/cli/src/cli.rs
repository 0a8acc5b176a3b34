use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Source selection shared by every command.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Primary skills source (overrides SKILLFORGE_SOURCE and config files).
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,
    /// Project directory holding `.skillforge/config.yaml`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,
}

/// Command-line interface for the `skillforge` application.
#[derive(Debug, Parser)]
#[command(
    name = "skillforge",
    version,
    about = "Resolve, fetch, and compile composable agent skills"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available `skillforge` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Checks a skill selection against the matrix and lists every problem.
    Validate {
        /// Skill IDs or aliases to check.
        #[arg(required = true)]
        skills: Vec<String>,
        /// Also list the options of this category given the selection.
        #[arg(long, value_name = "CATEGORY")]
        category: Option<String>,
        /// Ignore conflicts when listing category options (also SKILLFORGE_EXPERT=1).
        #[arg(long, default_value_t = false)]
        expert: bool,
        /// Output format: text or json.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Fetches a source into the cache and prints where it landed.
    Fetch {
        /// Source to fetch; defaults to the configured primary source.
        #[arg(value_name = "SOURCE")]
        target: Option<String>,
        /// Discard the cached copy and download again.
        #[arg(long, default_value_t = false)]
        refresh: bool,
        /// Return this subdirectory of the fetched tree.
        #[arg(long, value_name = "PATH")]
        subdir: Option<String>,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Shows which sources provide each skill and which one is active.
    Sources {
        /// Output format: text or json.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Searches the configured extra sources for skills matching an alias.
    Search {
        /// Directory name to look for, case-insensitive.
        alias: String,
        /// Output format: text or json.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Compiles a stack of agents and their skills into an output directory.
    Compile {
        /// Stack file listing agents and their skills.
        #[arg(long, value_name = "FILE")]
        stack: PathBuf,
        /// Output directory.
        #[arg(long, short, value_name = "DIR")]
        output: PathBuf,
        /// Template directories searched before the built-in templates (repeatable).
        #[arg(long = "template-dir", value_name = "DIR")]
        template_dirs: Vec<PathBuf>,
        #[command(flatten)]
        source: SourceArgs,
    },
}
