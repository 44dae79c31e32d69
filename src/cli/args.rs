//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Conveyor asset-build orchestrator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Task names to run, in order (see task list in the readme)
    #[arg(value_name = "TASK", default_value = "default")]
    pub tasks: Vec<String>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: conveyor.toml)
    #[arg(short = 'C', long, default_value = "conveyor.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Minify scripts and styles regardless of task
    #[arg(short, long)]
    pub production: bool,

    /// Emit source maps for concatenated script bundles
    #[arg(short, long)]
    pub sourcemaps: bool,

    /// Serve views from a template cache inlined into the index page
    #[arg(short, long)]
    pub usecache: bool,

    /// Allow `clean` to delete a build root outside the project root
    #[arg(short, long)]
    pub force: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
