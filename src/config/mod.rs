//! Project configuration management for `conveyor.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── paths      # [paths]
//! │   ├── serve      # [serve]
//! │   └── vendor     # [vendor]
//! ├── paths.rs       # AssetCategory + PathSpec registry
//! └── mod.rs         # Config (this file)
//! ```
//!
//! # Sections
//!
//! | Section    | Purpose                                       |
//! |------------|-----------------------------------------------|
//! | `[paths]`  | Source directories per asset category         |
//! | `[build]`  | Build root, hidden prefix, template module    |
//! | `[vendor]` | Vendor manifest files and resolution root     |
//! | `[serve]`  | Development server (port, interface, proxy)   |

pub mod section;

mod paths;

pub use paths::{AssetCategory, PathRegistry, PathSpec};
pub use section::{BuildConfig, PathsConfig, ServeConfig, VendorConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Root configuration
// ============================================================================

/// Root configuration structure representing conveyor.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Source directory layout
    pub paths: PathsConfig,

    /// Build output settings
    pub build: BuildConfig,

    /// Vendor manifest settings
    pub vendor: VendorConfig,

    /// Development server settings
    pub serve: ServeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            paths: PathsConfig::default(),
            build: BuildConfig::default(),
            vendor: VendorConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the given conveyor.toml path.
    ///
    /// A missing file yields the default configuration rooted at the
    /// current directory; a present-but-malformed file is a fatal error.
    pub fn load(config_path: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let config_path = if config_path.is_absolute() {
            config_path.to_path_buf()
        } else {
            cwd.join(config_path)
        };

        let mut config = if config_path.is_file() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::Io(config_path.clone(), e))?;
            toml::from_str::<Config>(&raw).map_err(ConfigError::Toml)?
        } else {
            Config::default()
        };

        config.root = config_path.parent().map_or(cwd, Path::to_path_buf);
        config.config_path = config_path;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.build.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "build.output must not be empty".into(),
            ));
        }
        if self.build.hidden_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "build.hidden_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolve a path against the project root.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute build root directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root_join(&self.build.output)
    }

    /// Whether the build root escapes the project root.
    /// `clean` requires `--force` for such layouts.
    pub fn output_escapes_root(&self) -> bool {
        let output = normalize_lexically(&self.output_dir());
        let root = normalize_lexically(&self.root);
        !output.starts_with(&root)
    }
}

/// Resolve `.`/`..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ============================================================================
// Build options
// ============================================================================

/// Immutable per-invocation build options.
///
/// Constructed once in `main` from the CLI invocation plan and passed by
/// reference into every task and pipeline. Tasks never mutate these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Minify scripts and styles.
    pub production: bool,

    /// Emit concat source maps for script bundles.
    pub source_maps: bool,

    /// Compile views into an embedded template-cache script module
    /// instead of static pages.
    pub use_template_cache: bool,
}

// ============================================================================
// Test helpers
// ============================================================================

/// Parse a config from a TOML string (test helper for section tests).
#[cfg(test)]
pub fn test_parse_config(raw: &str) -> Config {
    let mut config: Config = toml::from_str(raw).expect("test config must parse");
    config.root = PathBuf::from("/project");
    config.config_path = PathBuf::from("/project/conveyor.toml");
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_section_rejected_fields_ignored() {
        // serde(default) tolerates missing sections; a wrong type is fatal
        assert!(toml::from_str::<Config>("[serve]\nport = \"not a port\"").is_err());
    }

    #[test]
    fn test_output_escapes_root() {
        let mut config = test_parse_config("[build]\noutput = \"../static\"");
        assert!(config.output_escapes_root());

        config = test_parse_config("[build]\noutput = \"static\"");
        assert!(!config.output_escapes_root());
    }

    #[test]
    fn test_validation_rejects_empty_output() {
        let config = test_parse_config("[build]\noutput = \"\"");
        assert!(config.validate().is_err());
    }
}
