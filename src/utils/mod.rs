//! Small shared helpers.

pub mod mime;

use std::path::{Path, PathBuf};

/// Resolve a path to an absolute, symlink-free form where possible.
///
/// Falls back to joining onto the current directory when the path does
/// not exist yet (removed files still need a stable key).
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Pluralization suffix for counters in log lines.
pub fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
