//! In-memory file sets flowing through pipelines.
//!
//! A [`FileSet`] is an ordered sequence of loaded files. Order is
//! semantically significant: concatenation steps emit files in set order,
//! which for scripts mirrors module bootstrap order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PathSpec;
use crate::pipeline::PipelineError;
use crate::vendor::VendorManifest;

/// One loaded file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute source path (kept for diagnostics and source maps).
    pub source: PathBuf,

    /// Path relative to the category base; names the destination file.
    pub relative: PathBuf,

    /// File contents.
    pub contents: Vec<u8>,

    /// Bundle override from a vendor manifest entry, if any.
    pub bundle: Option<String>,
}

impl FileEntry {
    pub fn new(source: PathBuf, relative: PathBuf, contents: Vec<u8>) -> Self {
        Self {
            source,
            relative,
            contents,
            bundle: None,
        }
    }

    /// Borrow contents as UTF-8 text.
    pub fn text(&self, step: &'static str) -> Result<&str, PipelineError> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| PipelineError::transform(step, &self.source, e.to_string()))
    }

    /// Replace contents with new text.
    pub fn set_text(&mut self, text: String) {
        self.contents = text.into_bytes();
    }
}

/// Ordered sequence of files.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    pub entries: Vec<FileEntry>,
}

impl FileSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Discover and load sources for a path spec.
    ///
    /// Globs are expanded in declaration order; within one glob, matches
    /// are alphabetical (the `glob` crate's traversal order). A file
    /// matched by several globs is loaded once, at its first position.
    pub fn from_globs(
        spec: &PathSpec,
        base: &Path,
        hidden_prefix: &str,
    ) -> Result<Self, PipelineError> {
        let excludes = compile_patterns(&spec.exclude_globs)?;
        let mut seen = rustc_hash::FxHashSet::default();
        let mut entries = Vec::new();

        for pattern in &spec.source_globs {
            let paths = glob::glob(pattern)
                .map_err(|e| PipelineError::Pattern(pattern.clone(), e))?;
            for path in paths.flatten() {
                if !path.is_file() || !seen.insert(path.clone()) {
                    continue;
                }
                if excludes.iter().any(|p| p.matches_path(&path)) {
                    continue;
                }
                if spec.exclude_hidden && is_hidden(&path, base, hidden_prefix) {
                    continue;
                }
                entries.push(load_entry(&path, base)?);
            }
        }

        Ok(Self { entries })
    }

    /// Load files listed in a vendor manifest, enforcing existence first.
    pub fn from_manifest(manifest: &VendorManifest) -> Result<Self, PipelineError> {
        manifest.expect_all_exist()?;

        let entries = manifest
            .entries
            .iter()
            .map(|entry| {
                let contents = fs::read(&entry.source)
                    .map_err(|e| PipelineError::io(&entry.source, e))?;
                let mut loaded =
                    FileEntry::new(entry.source.clone(), entry.relative.clone(), contents);
                loaded.bundle = entry.bundle.clone();
                Ok(loaded)
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        Ok(Self { entries })
    }

    /// Write every entry under the destination directory.
    pub fn write_to(&self, dest_dir: &Path) -> Result<(), PipelineError> {
        for entry in &self.entries {
            let dest = dest_dir.join(&entry.relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
            }
            fs::write(&dest, &entry.contents).map_err(|e| PipelineError::io(&dest, e))?;
        }
        Ok(())
    }
}

fn load_entry(path: &Path, base: &Path) -> Result<FileEntry, PipelineError> {
    let contents = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    let relative = path
        .strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
    Ok(FileEntry::new(path.to_path_buf(), relative, contents))
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<glob::Pattern>, PipelineError> {
    patterns
        .iter()
        .map(|p| glob::Pattern::new(p).map_err(|e| PipelineError::Pattern(p.clone(), e)))
        .collect()
}

/// A path is hidden when any component under the base carries the prefix.
fn is_hidden(path: &Path, base: &Path, prefix: &str) -> bool {
    let relevant = path.strip_prefix(base).unwrap_or(path);
    relevant.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathSpec;
    use tempfile::TempDir;

    fn spec(globs: Vec<String>, excludes: Vec<String>) -> PathSpec {
        PathSpec {
            source_globs: globs,
            exclude_globs: excludes,
            dest_dir: PathBuf::from("/unused"),
            exclude_hidden: true,
        }
    }

    fn touch(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_glob_order_and_dedup() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        touch(base, "app.module.js", "// module");
        touch(base, "modules/a/a.module.js", "// a module");
        touch(base, "modules/a/a.js", "// a");

        let g = |p: &str| format!("{}/{}", base.display(), p);
        let spec = spec(
            vec![
                g("app.module.js"),
                g("modules/**/*.module.js"),
                g("modules/**/*.js"),
            ],
            vec![],
        );

        let set = FileSet::from_globs(&spec, base, "_").unwrap();
        let names: Vec<_> = set
            .entries
            .iter()
            .map(|e| e.relative.to_string_lossy().into_owned())
            .collect();

        // a.module.js matched twice but kept once, at its first position
        assert_eq!(
            names,
            vec!["app.module.js", "modules/a/a.module.js", "modules/a/a.js"]
        );
    }

    #[test]
    fn test_hidden_and_excluded_files_skipped() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path();
        touch(base, "main.css", "body{}");
        touch(base, "_draft.css", "body{}");
        touch(base, "themes/dark.css", "body{}");

        let g = |p: &str| format!("{}/{}", base.display(), p);
        let spec = spec(vec![g("**/*.css")], vec![g("themes/*")]);

        let set = FileSet::from_globs(&spec, base, "_").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.entries[0].relative.ends_with("main.css"));
    }

    #[test]
    fn test_write_creates_nested_dirs() {
        let tmp = TempDir::new().unwrap();
        let set = FileSet {
            entries: vec![FileEntry::new(
                PathBuf::from("/src/a/b.js"),
                PathBuf::from("a/b.js"),
                b"x".to_vec(),
            )],
        };

        let dest = tmp.path().join("out");
        set.write_to(&dest).unwrap();
        assert_eq!(fs::read(dest.join("a/b.js")).unwrap(), b"x");
    }
}
