//! Stylesheet compilation via lightningcss.
//!
//! Parses each stylesheet (catching syntax errors with the offending
//! path) and reprints it, lowering modern syntax such as nesting.
//! Output entries are renamed to `.css`.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

use crate::fileset::FileSet;
use crate::pipeline::{PipelineError, StepContext, Transform};

pub struct CompileCss;

impl Transform for CompileCss {
    fn name(&self) -> &'static str {
        "css"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        for entry in &mut files.entries {
            let text = entry.text(self.name())?;
            let compiled = compile(text).map_err(|message| PipelineError::Syntax {
                path: entry.source.clone(),
                message,
            })?;
            entry.set_text(compiled);
            entry.relative = entry.relative.with_extension("css");
        }
        Ok(files)
    }
}

fn compile(source: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions::default())
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}
