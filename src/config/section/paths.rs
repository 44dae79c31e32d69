//! `[paths]` section configuration.
//!
//! Source directories for each asset category, relative to the project root.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! scripts = "js/"
//! styles = "less/"
//! markup = "jade/"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Application scripts.
    pub scripts: PathBuf,

    /// Stylesheets. A `themes/` subdirectory is built as a separate
    /// pipeline and excluded from the main styles watch set.
    pub styles: PathBuf,

    /// Markup sources: `index.*` plus view documents.
    pub markup: PathBuf,

    /// Static images, copied verbatim.
    pub images: PathBuf,

    /// Translation files.
    pub i18n: PathBuf,

    /// Arbitrary data files (JSON fixtures etc.).
    pub data: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scripts: PathBuf::from("js"),
            styles: PathBuf::from("styles"),
            markup: PathBuf::from("markup"),
            images: PathBuf::from("img"),
            i18n: PathBuf::from("i18n"),
            data: PathBuf::from("data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    #[test]
    fn test_paths_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.paths.scripts, PathBuf::from("js"));
        assert_eq!(config.paths.styles, PathBuf::from("styles"));
        assert_eq!(config.paths.markup, PathBuf::from("markup"));
    }

    #[test]
    fn test_paths_override() {
        let config = test_parse_config("[paths]\nstyles = \"less\"\nmarkup = \"jade\"");
        assert_eq!(config.paths.styles, PathBuf::from("less"));
        assert_eq!(config.paths.markup, PathBuf::from("jade"));
        // untouched fields keep defaults
        assert_eq!(config.paths.images, PathBuf::from("img"));
    }
}
