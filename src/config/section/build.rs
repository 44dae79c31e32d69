//! `[build]` section configuration.
//!
//! Build output settings.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "static"             # build root, all destinations live under it
//! hidden_prefix = "_"           # path components with this prefix are skipped
//! template_module = "templates.js"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build root directory. Relative paths resolve against the project
    /// root; an absolute path (or one escaping the project root) makes
    /// `clean` require `--force`.
    pub output: PathBuf,

    /// File/directory name prefix treated as hidden and excluded from
    /// every source glob.
    pub hidden_prefix: String,

    /// Name of the emitted template-cache script module (cache mode).
    pub template_module: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("static"),
            hidden_prefix: String::from("_"),
            template_module: String::from("templates.js"),
        }
    }
}
