//! Script validation and JS/CSS minification.
//!
//! Uses oxc for JavaScript and lightningcss for CSS.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::fileset::FileSet;
use crate::pipeline::{PipelineError, StepContext, Transform};

/// Parse JavaScript source, returning the first diagnostic on failure.
pub fn check_js(source: &str) -> Result<(), String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    match ret.errors.first() {
        None => Ok(()),
        Some(err) => Err(format!("{err:?}")),
    }
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(format!("{err:?}"));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}

fn has_ext(entry: &crate::fileset::FileEntry, ext: &str) -> bool {
    entry
        .relative
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

// ============================================================================
// Steps
// ============================================================================

/// Syntax-check every script in the set; the first broken file aborts
/// the pipeline with a `Syntax` error naming the file.
pub struct ValidateJs;

impl Transform for ValidateJs {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn apply(&self, files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        for entry in &files.entries {
            if !has_ext(entry, "js") {
                continue;
            }
            let text = entry.text(self.name())?;
            if let Err(message) = check_js(text) {
                return Err(PipelineError::Syntax {
                    path: entry.source.clone(),
                    message,
                });
            }
        }
        Ok(files)
    }
}

/// Minify every `.js` entry in place; other entries pass through.
pub struct MinifyJs;

impl Transform for MinifyJs {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        for entry in &mut files.entries {
            if !has_ext(entry, "js") {
                continue;
            }
            let text = entry.text(self.name())?;
            let minified = minify_js(text)
                .map_err(|msg| PipelineError::transform(self.name(), &entry.source, msg))?;
            entry.set_text(minified);
        }
        Ok(files)
    }
}

/// Minify every `.css` entry in place; other entries pass through.
pub struct MinifyCss;

impl Transform for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        for entry in &mut files.entries {
            if !has_ext(entry, "css") {
                continue;
            }
            let text = entry.text(self.name())?;
            let minified = minify_css(text)
                .map_err(|msg| PipelineError::transform(self.name(), &entry.source, msg))?;
            entry.set_text(minified);
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_js_shrinks() {
        let source = "function add(first, second) {\n    return first + second;\n}\nexport { add };\n";
        let minified = minify_js(source).unwrap();
        assert!(minified.len() < source.len());
        assert!(!minified.contains('\n') || minified.lines().count() <= 2);
    }

    #[test]
    fn test_minify_js_rejects_broken_source() {
        assert!(minify_js("function (((").is_err());
    }

    #[test]
    fn test_minify_css_shrinks() {
        let source = "body {\n    margin: 0px;\n    color: #ffffff;\n}\n";
        let minified = minify_css(source).unwrap();
        assert!(minified.len() < source.len());
    }

    #[test]
    fn test_check_js() {
        assert!(check_js("const a = 1;").is_ok());
        assert!(check_js("const a = ;").is_err());
    }
}
