//! Script normalization pass.
//!
//! Re-parses each script and regenerates it with a stable code shape
//! before any mangling minifier runs, the way dependency-injection
//! annotators rewrite modules ahead of minification. Runs per file so
//! concat provenance stays exact.

use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::fileset::FileSet;
use crate::pipeline::{PipelineError, StepContext, Transform};

pub struct Annotate;

impl Transform for Annotate {
    fn name(&self) -> &'static str {
        "annotate"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        for entry in &mut files.entries {
            let is_js = entry
                .relative
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("js"));
            if !is_js {
                continue;
            }

            let text = entry.text(self.name())?;
            let normalized = normalize(text).map_err(|msg| {
                PipelineError::transform(self.name(), &entry.source, msg)
            })?;
            entry.set_text(normalized);
        }
        Ok(files)
    }
}

fn normalize(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(format!("{err:?}"));
    }
    Ok(Codegen::new().build(&ret.program).code)
}
