//! Markup rendering and the template-cache module.
//!
//! Views are markdown documents rendered with pulldown-cmark, either to
//! standalone HTML pages or, in cache mode, bundled into a single script
//! module that registers every view body in a runtime template cache.

use std::path::PathBuf;

use pulldown_cmark::{Options, Parser, html};

use crate::fileset::{FileEntry, FileSet};
use crate::pipeline::{PipelineError, StepContext, Transform};

/// Render every entry from markdown to HTML.
pub struct RenderHtml {
    /// Wrap the rendered body into a full HTML document.
    pub wrap: bool,
}

impl Transform for RenderHtml {
    fn name(&self) -> &'static str {
        "render"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        for entry in &mut files.entries {
            let text = entry.text(self.name())?;
            let body = render_markdown(text);
            let page = if self.wrap {
                let title = entry
                    .relative
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                page_shell(&title, &body)
            } else {
                body
            };
            entry.set_text(page);
            entry.relative = entry.relative.with_extension("html");
        }
        Ok(files)
    }
}

/// Collapse rendered views into one `templates.js` cache module.
pub struct TemplateCache {
    pub module: String,
}

impl Transform for TemplateCache {
    fn name(&self) -> &'static str {
        "templatecache"
    }

    fn apply(&self, files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        let mut module = String::from(
            "(function (cache) {\n  \"use strict\";\n",
        );
        for entry in &files.entries {
            let key = entry.relative.to_string_lossy().replace('\\', "/");
            let value = serde_json::to_string(entry.text(self.name())?)
                .map_err(|e| PipelineError::transform(self.name(), &entry.source, e.to_string()))?;
            module.push_str(&format!("  cache[{}] = {};\n", serde_json::to_string(&key).unwrap_or_default(), value));
        }
        module.push_str("})(window.templateCache = window.templateCache || {});\n");

        Ok(FileSet {
            entries: vec![FileEntry::new(
                PathBuf::from(&self.module),
                PathBuf::from(&self.module),
                module.into_bytes(),
            )],
        })
    }
}

/// Inject a script tag referencing the template-cache module into HTML
/// entries, right before `</body>`.
pub struct InjectCacheScript {
    pub src: String,
}

impl Transform for InjectCacheScript {
    fn name(&self) -> &'static str {
        "inject"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        let tag = format!("<script src=\"{}\"></script>", self.src);
        for entry in &mut files.entries {
            let is_html = entry
                .relative
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("html"));
            if !is_html {
                continue;
            }
            entry.contents = inject_before_body_close(&entry.contents, tag.as_bytes());
        }
        Ok(files)
    }
}

fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::empty());
    let mut out = String::with_capacity(source.len() * 2);
    html::push_html(&mut out, parser);
    out
}

fn page_shell(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// Insert `tag` before the last `</body>`, or append when absent.
fn inject_before_body_close(content: &[u8], tag: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        let mut result = Vec::with_capacity(content.len() + tag.len());
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(tag);
        result.extend_from_slice(&content[pos..]);
        return result;
    }

    let mut result = Vec::with_capacity(content.len() + tag.len());
    result.extend_from_slice(content);
    result.extend_from_slice(tag);
    result
}
