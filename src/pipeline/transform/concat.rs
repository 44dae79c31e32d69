//! Concatenation of a file set into a single bundle.
//!
//! Files are joined in set order (which is glob/manifest order). With
//! `with_map` the step also emits a `<bundle>.map` entry carrying exact
//! line provenance, plus a trailing `sourceMappingURL` comment.

use std::path::PathBuf;

use crate::fileset::{FileEntry, FileSet};
use crate::pipeline::sourcemap;
use crate::pipeline::{PipelineError, StepContext, Transform};

pub struct Concat {
    pub output: String,
    pub with_map: bool,
}

impl Transform for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        let mut bundle = String::new();
        let mut origins = Vec::new();
        let mut sources = Vec::new();
        let mut contents = Vec::new();

        for (index, entry) in files.entries.iter().enumerate() {
            let text = entry.text(self.name())?;
            for (line_no, line) in text.lines().enumerate() {
                bundle.push_str(line);
                bundle.push('\n');
                origins.push((index, line_no));
            }
            sources.push(entry.source.display().to_string());
            contents.push(text.to_owned());
        }

        let mut out = Vec::with_capacity(2);

        if self.with_map {
            let map_name = format!("{}.map", self.output);
            bundle.push_str(&format!("//# sourceMappingURL={map_name}\n"));
            let map = sourcemap::concat_map(&self.output, &sources, &contents, &origins);
            out.push(FileEntry::new(
                PathBuf::from(&map_name),
                PathBuf::from(&map_name),
                map.into_bytes(),
            ));
        }

        out.insert(
            0,
            FileEntry::new(
                PathBuf::from(&self.output),
                PathBuf::from(&self.output),
                bundle.into_bytes(),
            ),
        );

        Ok(FileSet { entries: out })
    }
}

/// Group entries by their manifest bundle override.
///
/// Entries carrying a `bundle` name are concatenated, in set order, into
/// one output per name. Entries without one join `fallback` when it is
/// set (single-bundle pipelines) and pass through unchanged otherwise
/// (copy pipelines).
pub struct BundleOverrides {
    pub fallback: Option<String>,
}

impl Transform for BundleOverrides {
    fn name(&self) -> &'static str {
        "bundle"
    }

    fn apply(&self, files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        let mut out: Vec<FileEntry> = Vec::new();
        // bundle name -> position in `out`; bundles appear at the
        // position of their first member
        let mut slots: rustc_hash::FxHashMap<String, usize> = rustc_hash::FxHashMap::default();

        for entry in files.entries {
            let Some(name) = entry.bundle.clone().or_else(|| self.fallback.clone()) else {
                out.push(entry);
                continue;
            };
            let mut text = entry.text(self.name())?.to_owned();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            match slots.get(&name) {
                Some(&slot) => out[slot].contents.extend_from_slice(text.as_bytes()),
                None => {
                    slots.insert(name.clone(), out.len());
                    out.push(FileEntry::new(
                        PathBuf::from(&name),
                        PathBuf::from(&name),
                        text.into_bytes(),
                    ));
                }
            }
        }

        Ok(FileSet { entries: out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildOptions, test_parse_config};

    fn entry(name: &str, body: &str) -> FileEntry {
        FileEntry::new(
            PathBuf::from(format!("/src/{name}")),
            PathBuf::from(name),
            body.as_bytes().to_vec(),
        )
    }

    fn run(step: &dyn Transform, files: FileSet) -> FileSet {
        let config = test_parse_config("");
        let options = BuildOptions::default();
        let ctx = StepContext {
            config: &config,
            options: &options,
        };
        step.apply(files, &ctx).unwrap()
    }

    #[test]
    fn test_concat_order() {
        let step = Concat {
            output: "app.js".into(),
            with_map: false,
        };
        let files = FileSet {
            entries: vec![entry("a.js", "var a = 1;"), entry("b.js", "var b = 2;")],
        };

        let out = run(&step, files);
        assert_eq!(out.len(), 1);
        assert_eq!(
            std::str::from_utf8(&out.entries[0].contents).unwrap(),
            "var a = 1;\nvar b = 2;\n"
        );
        assert_eq!(out.entries[0].relative, PathBuf::from("app.js"));
    }

    #[test]
    fn test_concat_with_map() {
        let step = Concat {
            output: "app.js".into(),
            with_map: true,
        };
        let files = FileSet {
            entries: vec![entry("a.js", "var a = 1;")],
        };

        let out = run(&step, files);
        assert_eq!(out.len(), 2);

        let bundle = std::str::from_utf8(&out.entries[0].contents).unwrap();
        assert!(bundle.ends_with("//# sourceMappingURL=app.js.map\n"));

        let map: serde_json::Value =
            serde_json::from_slice(&out.entries[1].contents).unwrap();
        assert_eq!(map["version"], 3);
        assert!(map["sources"][0].as_str().unwrap().ends_with("a.js"));
    }

    fn bundled(name: &str, body: &str, bundle: &str) -> FileEntry {
        let mut e = entry(name, body);
        e.bundle = Some(bundle.to_owned());
        e
    }

    #[test]
    fn test_bundle_overrides_group_with_fallback() {
        let step = BundleOverrides {
            fallback: Some("base.js".into()),
        };
        let files = FileSet {
            entries: vec![
                entry("jquery.js", "var jq = 1;"),
                bundled("rickshaw.js", "var rs = 1;", "charts.js"),
                entry("ui.js", "var ui = 1;"),
                bundled("d3.js", "var d3 = 1;", "charts.js"),
            ],
        };

        let out = run(&step, files);
        let names: Vec<_> = out
            .entries
            .iter()
            .map(|e| e.relative.to_string_lossy().into_owned())
            .collect();
        // bundles sit at their first member's position
        assert_eq!(names, vec!["base.js", "charts.js"]);
        assert_eq!(
            std::str::from_utf8(&out.entries[0].contents).unwrap(),
            "var jq = 1;\nvar ui = 1;\n"
        );
        assert_eq!(
            std::str::from_utf8(&out.entries[1].contents).unwrap(),
            "var rs = 1;\nvar d3 = 1;\n"
        );
    }

    #[test]
    fn test_bundle_overrides_pass_through_without_fallback() {
        let step = BundleOverrides { fallback: None };
        let files = FileSet {
            entries: vec![
                entry("d3/d3.js", "var d3 = 1;"),
                bundled("rickshaw/rickshaw.js", "var rs = 1;", "charts.js"),
            ],
        };

        let out = run(&step, files);
        assert_eq!(out.len(), 2);
        assert_eq!(out.entries[0].relative, PathBuf::from("d3/d3.js"));
        assert_eq!(out.entries[1].relative, PathBuf::from("charts.js"));
    }
}
