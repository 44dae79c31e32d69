//! Vendor descriptor loading.
//!
//! Third-party assets are declared in two JSON manifests rather than
//! discovered by glob: `vendor.base.json` lists the load-order-sensitive
//! bootstrap scripts, `vendor.json` the lazily-loaded app assets. Entries
//! resolve against the configured vendor root in descriptor order; a
//! library must be able to precede its plugin.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

/// Vendor manifest errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed manifest `{0}`: {1}")]
    Malformed(PathBuf, #[source] serde_json::Error),

    #[error("vendor file listed in manifest does not exist: `{0}`")]
    MissingFile(PathBuf),
}

/// One manifest entry: a relative path, optionally with a bundle name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Path(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        bundle: Option<String>,
    },
}

/// A resolved vendor asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorEntry {
    /// Absolute source path.
    pub source: PathBuf,

    /// Path relative to the vendor root, preserved on copy.
    pub relative: PathBuf,

    /// Optional bundle override for concatenating pipelines.
    pub bundle: Option<String>,
}

/// Ordered vendor asset list, immutable after load.
#[derive(Debug, Clone, Default)]
pub struct VendorManifest {
    pub entries: Vec<VendorEntry>,
}

impl VendorManifest {
    /// Every listed path must exist at build time; a missing file is a
    /// fatal error for the owning task, not a skip.
    pub fn expect_all_exist(&self) -> Result<(), ManifestError> {
        for entry in &self.entries {
            if !entry.source.is_file() {
                return Err(ManifestError::MissingFile(entry.source.clone()));
            }
        }
        Ok(())
    }
}

/// Load both vendor manifests (base, app) in descriptor order.
pub fn load_manifests(config: &Config) -> Result<(VendorManifest, VendorManifest), ManifestError> {
    let base = load_manifest(config, &config.root_join(&config.vendor.base_manifest))?;
    let app = load_manifest(config, &config.root_join(&config.vendor.app_manifest))?;
    Ok((base, app))
}

/// Like [`load_manifests`], but an absent descriptor file means the
/// project simply has no vendor assets of that kind. A malformed
/// descriptor is still fatal.
pub fn load_manifests_lenient(
    config: &Config,
) -> Result<(VendorManifest, VendorManifest), ManifestError> {
    let load = |manifest: &Path| {
        let path = config.root_join(manifest);
        match load_manifest(config, &path) {
            Ok(m) => Ok(m),
            Err(ManifestError::Io(path, _)) => {
                crate::debug!("vendor"; "no manifest at {}, treating as empty", path.display());
                Ok(VendorManifest::default())
            }
            Err(e) => Err(e),
        }
    };
    Ok((load(&config.vendor.base_manifest)?, load(&config.vendor.app_manifest)?))
}

fn load_manifest(config: &Config, path: &PathBuf) -> Result<VendorManifest, ManifestError> {
    let raw = fs::read_to_string(path).map_err(|e| ManifestError::Io(path.clone(), e))?;
    let entries: Vec<RawEntry> =
        serde_json::from_str(&raw).map_err(|e| ManifestError::Malformed(path.clone(), e))?;

    let vendor_root = config.root_join(&config.vendor.root);
    let entries = entries
        .into_iter()
        .map(|raw| {
            let (relative, bundle) = match raw {
                RawEntry::Path(p) => (p, None),
                RawEntry::Detailed { path, bundle } => (path, bundle),
            };
            VendorEntry {
                source: vendor_root.join(&relative),
                relative,
                bundle,
            }
        })
        .collect();

    Ok(VendorManifest { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use tempfile::TempDir;

    fn write_manifest(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn rooted_config(dir: &TempDir) -> Config {
        let mut config = test_parse_config("");
        config.root = dir.path().to_path_buf();
        config
    }

    #[test]
    fn test_order_preserved_and_stable() {
        let dir = TempDir::new().unwrap();
        let config = rooted_config(&dir);
        write_manifest(&dir, "vendor.base.json", r#"["jquery/jquery.js", "jquery-ui/ui.js"]"#);
        write_manifest(&dir, "vendor.json", r#"[]"#);

        let (first, _) = load_manifests(&config).unwrap();
        let (second, _) = load_manifests(&config).unwrap();

        assert_eq!(first.entries.len(), 2);
        assert!(first.entries[0].source.ends_with("vendor_components/jquery/jquery.js"));
        assert!(first.entries[1].source.ends_with("vendor_components/jquery-ui/ui.js"));
        // unchanged descriptors yield identical ordered sequences
        assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn test_detailed_entries() {
        let dir = TempDir::new().unwrap();
        let config = rooted_config(&dir);
        write_manifest(&dir, "vendor.base.json", r#"[]"#);
        write_manifest(
            &dir,
            "vendor.json",
            r#"[{"path": "rickshaw/rickshaw.js", "bundle": "charts.js"}, "d3/d3.js"]"#,
        );

        let (_, app) = load_manifests(&config).unwrap();
        assert_eq!(app.entries[0].bundle.as_deref(), Some("charts.js"));
        assert_eq!(app.entries[1].bundle, None);
    }

    #[test]
    fn test_malformed_manifest_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = rooted_config(&dir);
        write_manifest(&dir, "vendor.base.json", r#"{"not": "a list"}"#);
        write_manifest(&dir, "vendor.json", r#"[]"#);

        assert!(matches!(
            load_manifests(&config),
            Err(ManifestError::Malformed(..))
        ));
    }

    #[test]
    fn test_lenient_load_treats_absent_descriptor_as_empty() {
        let dir = TempDir::new().unwrap();
        let config = rooted_config(&dir);
        // only the base descriptor exists
        write_manifest(&dir, "vendor.base.json", r#"["jquery/jquery.js"]"#);

        let (base, app) = load_manifests_lenient(&config).unwrap();
        assert_eq!(base.entries.len(), 1);
        assert!(app.entries.is_empty());
    }

    #[test]
    fn test_lenient_load_keeps_malformed_descriptor_fatal() {
        let dir = TempDir::new().unwrap();
        let config = rooted_config(&dir);
        write_manifest(&dir, "vendor.base.json", r#"not json"#);
        write_manifest(&dir, "vendor.json", r#"[]"#);

        assert!(matches!(
            load_manifests_lenient(&config),
            Err(ManifestError::Malformed(..))
        ));
    }

    #[test]
    fn test_missing_file_detected() {
        let dir = TempDir::new().unwrap();
        let config = rooted_config(&dir);
        write_manifest(&dir, "vendor.base.json", r#"["ghost/ghost.js"]"#);
        write_manifest(&dir, "vendor.json", r#"[]"#);

        let (base, _) = load_manifests(&config).unwrap();
        assert!(matches!(
            base.expect_all_exist(),
            Err(ManifestError::MissingFile(_))
        ));
    }
}
