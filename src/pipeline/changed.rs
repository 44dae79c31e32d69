//! Freshness filtering for incremental renders.
//!
//! Compares source mtime against the already-rendered destination file
//! and drops sources that are up to date. Missing metadata on either
//! side counts as stale, so the file is rendered again.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{PipelineError, StepContext, Transform};
use crate::fileset::FileSet;

/// Keep only entries newer than their rendered counterpart.
pub struct ChangedOnly {
    pub dest_dir: PathBuf,
    pub dest_extension: &'static str,
}

impl Transform for ChangedOnly {
    fn name(&self) -> &'static str {
        "changed"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StepContext<'_>) -> Result<FileSet, PipelineError> {
        files.entries.retain(|entry| {
            let dest = self
                .dest_dir
                .join(entry.relative.with_extension(self.dest_extension));
            is_stale(&entry.source, &dest)
        });
        Ok(files)
    }
}

fn is_stale(source: &Path, dest: &Path) -> bool {
    match (mtime(source), mtime(dest)) {
        (Some(src), Some(dst)) => src > dst,
        // unreadable metadata or missing dest: render again
        _ => true,
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildOptions, test_parse_config};
    use crate::fileset::FileEntry;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_dest_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("view.md");
        fs::write(&src, "# hi").unwrap();
        let dest_dir = tmp.path().join("out");
        fs::create_dir_all(&dest_dir).unwrap();
        // dest written after source: up to date
        fs::write(dest_dir.join("view.html"), "<h1>hi</h1>").unwrap();

        let step = ChangedOnly {
            dest_dir,
            dest_extension: "html",
        };
        let files = FileSet {
            entries: vec![FileEntry::new(
                src,
                PathBuf::from("view.md"),
                b"# hi".to_vec(),
            )],
        };

        let config = test_parse_config("");
        let options = BuildOptions::default();
        let ctx = StepContext {
            config: &config,
            options: &options,
        };

        let out = step.apply(files, &ctx).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_dest_is_stale() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("view.md");
        fs::write(&src, "# hi").unwrap();

        let step = ChangedOnly {
            dest_dir: tmp.path().join("out"),
            dest_extension: "html",
        };
        let files = FileSet {
            entries: vec![FileEntry::new(
                src,
                PathBuf::from("view.md"),
                b"# hi".to_vec(),
            )],
        };

        let config = test_parse_config("");
        let options = BuildOptions::default();
        let ctx = StepContext {
            config: &config,
            options: &options,
        };

        let out = step.apply(files, &ctx).unwrap();
        assert_eq!(out.len(), 1);
    }
}
