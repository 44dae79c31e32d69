//! Command-line interface module.

mod args;

pub use args::Cli;

use crate::config::BuildOptions;

/// Tasks to run and the options they are baked with.
pub struct InvocationPlan {
    pub tasks: Vec<String>,
    pub options: BuildOptions,
}

/// Derive the invocation plan from parsed arguments.
///
/// Some task names imply option flags: `build` builds for production,
/// `sourcemaps` turns on source maps. Explicit flags are additive.
pub fn plan(cli: &Cli) -> InvocationPlan {
    let mut options = BuildOptions {
        production: cli.production,
        source_maps: cli.sourcemaps,
        use_template_cache: cli.usecache,
    };

    for task in &cli.tasks {
        match task.as_str() {
            "build" => options.production = true,
            "sourcemaps" => options.source_maps = true,
            _ => {}
        }
    }

    InvocationPlan {
        tasks: cli.tasks.clone(),
        options,
    }
}

/// Whether a failed task should fail the process.
///
/// Long-running interactive tasks always exit zero on interrupt; batch
/// tasks report failure so CI can gate on them.
pub fn exits_nonzero_on_failure(task: &str) -> bool {
    !matches!(task, "default" | "sourcemaps" | "watch" | "serve")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("conveyor").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_args_runs_default_task() {
        let cli = parse(&[]);
        let plan = plan(&cli);
        assert_eq!(plan.tasks, vec!["default"]);
        assert!(!plan.options.production);
        assert!(!plan.options.source_maps);
    }

    #[test]
    fn test_build_task_implies_production() {
        let cli = parse(&["build"]);
        let plan = plan(&cli);
        assert!(plan.options.production);
    }

    #[test]
    fn test_sourcemaps_task_implies_source_maps() {
        let cli = parse(&["sourcemaps"]);
        let plan = plan(&cli);
        assert!(plan.options.source_maps);
        assert!(!plan.options.production);
    }

    #[test]
    fn test_explicit_flags_are_additive() {
        let cli = parse(&["--production", "--usecache", "assets"]);
        let plan = plan(&cli);
        assert!(plan.options.production);
        assert!(plan.options.use_template_cache);
        assert_eq!(plan.tasks, vec!["assets"]);
    }

    #[test]
    fn test_multiple_tasks_kept_in_order() {
        let cli = parse(&["clean", "build"]);
        let plan = plan(&cli);
        assert_eq!(plan.tasks, vec!["clean", "build"]);
        assert!(plan.options.production);
    }

    #[test]
    fn test_exit_code_policy() {
        assert!(exits_nonzero_on_failure("build"));
        assert!(exits_nonzero_on_failure("lint"));
        assert!(exits_nonzero_on_failure("clean"));
        assert!(!exits_nonzero_on_failure("default"));
        assert!(!exits_nonzero_on_failure("serve"));
        assert!(!exits_nonzero_on_failure("watch"));
    }
}
