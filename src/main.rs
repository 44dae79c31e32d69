//! Conveyor - a declarative asset-build orchestrator.

#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod fileset;
mod lint;
mod logger;
mod pipeline;
mod serve;
mod task;
mod utils;
mod vendor;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};

use config::Config;

fn main() -> Result<()> {
    // Global Ctrl+C handler, before any blocking operations.
    core::setup_shutdown_handler()?;

    let cli = cli::Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Config::load(&cli.config)?;
    let plan = cli::plan(&cli);

    let graph = task::build_graph(&config, &plan.options, cli.force)?;

    let mut failed = false;
    for name in &plan.tasks {
        if let Err(e) = task::run_task(&graph, name, &config, &plan.options) {
            crate::log!("error"; "{e}");
            if cli::exits_nonzero_on_failure(name) {
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
