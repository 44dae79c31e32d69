//! Asset pipelines.
//!
//! A pipeline is a fixed ordered sequence of transformation steps over a
//! [`FileSet`]. Conditional steps are declared as [`StepDef::When`] and
//! resolved against the immutable [`BuildOptions`] while the pipeline is
//! built, so the runtime shape is static and inspectable.
//!
//! Failure isolation: every fallible step short-circuits the remaining
//! steps of its own pipeline and reports; sibling pipelines and
//! already-written output are never affected.

mod changed;
mod definitions;
mod error;
mod sourcemap;
pub mod transform;

pub use definitions::build_pipeline;
pub use error::PipelineError;

use std::path::PathBuf;

use crate::config::{BuildOptions, Config};
use crate::fileset::FileSet;
use crate::log;
use crate::vendor::VendorManifest;

/// A transformation step: file set in, file set out, optionally erroring.
///
/// Concrete libraries (minifier, CSS compiler, markup renderer) sit behind
/// this seam so any of them can be substituted.
pub trait Transform: Send + Sync {
    /// Step name, used in error reports.
    fn name(&self) -> &'static str;

    fn apply(&self, files: FileSet, ctx: &StepContext<'_>) -> Result<FileSet, PipelineError>;
}

/// Read-only context handed to every step.
pub struct StepContext<'a> {
    pub config: &'a Config,
    pub options: &'a BuildOptions,
}

/// Step declaration, resolved at pipeline-build time.
pub enum StepDef {
    Always(Box<dyn Transform>),
    When(bool, Box<dyn Transform>),
}

impl StepDef {
    /// Evaluate the predicate now; inactive steps drop out of the
    /// concrete sequence.
    fn resolve(self) -> Option<Box<dyn Transform>> {
        match self {
            Self::Always(step) => Some(step),
            Self::When(true, step) => Some(step),
            Self::When(false, _) => None,
        }
    }
}

/// Where a pipeline's input files come from.
pub enum Source {
    /// Ordered globs relative to a base directory.
    Globs {
        globs: crate::config::PathSpec,
        base: PathBuf,
    },
    /// A vendor manifest (existence enforced on load).
    Manifest(VendorManifest),
}

/// A named, fully-resolved pipeline.
pub struct Pipeline {
    pub name: String,
    source: Source,
    steps: Vec<Box<dyn Transform>>,
    dest_dir: PathBuf,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, source: Source, dest_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            source,
            steps: Vec::new(),
            dest_dir,
        }
    }

    /// Resolve step declarations into the concrete ordered sequence.
    pub fn with_steps(mut self, defs: Vec<StepDef>) -> Self {
        self.steps = defs.into_iter().filter_map(StepDef::resolve).collect();
        self
    }

    /// Step names in execution order (shape is static after build).
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the pipeline: load sources, fold steps, write destination.
    ///
    /// The first failing step aborts the rest; nothing is written in
    /// that case because the destination write is the final step.
    pub fn run(&self, config: &Config, options: &BuildOptions) -> Result<(), PipelineError> {
        let mut files = match &self.source {
            Source::Globs { globs, base } => {
                FileSet::from_globs(globs, base, &config.build.hidden_prefix)?
            }
            Source::Manifest(manifest) => FileSet::from_manifest(manifest)?,
        };

        if files.is_empty() {
            log!(&self.name; "no input files, nothing to do");
            return Ok(());
        }

        let ctx = StepContext { config, options };
        for step in &self.steps {
            files = step.apply(files, &ctx)?;
        }

        files.write_to(&self.dest_dir)?;
        log!(&self.name; "wrote {} file{}", files.len(), if files.len() == 1 { "" } else { "s" });
        Ok(())
    }
}
