//! `[vendor]` section configuration.
//!
//! Third-party assets are tracked via two ordered manifest files instead of
//! glob discovery: a "base" set concatenated into one bootstrap bundle, and
//! an "app" set copied file-by-file for lazy loading.
//!
//! # Example
//!
//! ```toml
//! [vendor]
//! base_manifest = "vendor.base.json"
//! app_manifest = "vendor.json"
//! root = "vendor_components"
//! base_bundle = "base.js"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Vendor manifest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Manifest of scripts required to bootstrap the app (concatenated).
    pub base_manifest: PathBuf,

    /// Manifest of lazily-loaded vendor assets (copied per-file).
    pub app_manifest: PathBuf,

    /// Directory manifest entries resolve against.
    pub root: PathBuf,

    /// Output name of the concatenated base bundle.
    pub base_bundle: String,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            base_manifest: PathBuf::from("vendor.base.json"),
            app_manifest: PathBuf::from("vendor.json"),
            root: PathBuf::from("vendor_components"),
            base_bundle: String::from("base.js"),
        }
    }
}
