//! Pipeline error taxonomy.
//!
//! Pipeline errors are local: they abort the owning pipeline's remaining
//! steps and are reported with enough context (source path, step name) to
//! locate the offending file. They never abort sibling pipelines or the
//! watch loop.

use std::path::PathBuf;

use thiserror::Error;

use crate::vendor::ManifestError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source asset failed syntax validation.
    #[error("syntax error in `{path}`: {message}")]
    Syntax { path: PathBuf, message: String },

    /// A manifest-listed file is absent. Fatal for the owning task
    /// before any output is written.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// An external transformation step failed.
    #[error("step `{step}` failed on `{path}`: {message}")]
    Transform {
        step: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("IO error on `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern `{0}`")]
    Pattern(String, #[source] glob::PatternError),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn transform(
        step: &'static str,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transform {
            step,
            path: path.into(),
            message: message.into(),
        }
    }
}
