//! Asset categories and the path registry.
//!
//! The registry is a pure lookup table built once from the configured
//! source roots: each [`AssetCategory`] maps to an immutable [`PathSpec`]
//! (ordered source globs, destination under the build root, hidden-file
//! exclusion). No discovery happens here.

use std::path::{Path, PathBuf};

use super::Config;

/// Logical asset category, one per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Scripts,
    Styles,
    Themes,
    MarkupIndex,
    MarkupViews,
    I18n,
    Images,
    Data,
    VendorBase,
    VendorApp,
}

impl AssetCategory {
    /// All categories, in pipeline-definition order.
    pub const ALL: [AssetCategory; 10] = [
        Self::Scripts,
        Self::Styles,
        Self::Themes,
        Self::MarkupIndex,
        Self::MarkupViews,
        Self::I18n,
        Self::Images,
        Self::Data,
        Self::VendorBase,
        Self::VendorApp,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Scripts => "scripts",
            Self::Styles => "styles",
            Self::Themes => "themes",
            Self::MarkupIndex => "markup-index",
            Self::MarkupViews => "markup-views",
            Self::I18n => "i18n",
            Self::Images => "images",
            Self::Data => "data",
            Self::VendorBase => "vendor-base",
            Self::VendorApp => "vendor-app",
        }
    }
}

/// Immutable source/destination mapping for one category.
#[derive(Debug, Clone)]
pub struct PathSpec {
    /// Ordered glob patterns; order is load order for concatenation.
    pub source_globs: Vec<String>,

    /// Glob patterns removed from the matched set (negative globs).
    pub exclude_globs: Vec<String>,

    /// Destination directory, always under the build root.
    pub dest_dir: PathBuf,

    /// Skip files whose name carries the configured hidden prefix.
    pub exclude_hidden: bool,
}

/// Lookup table from category to path spec, built once at startup.
#[derive(Debug)]
pub struct PathRegistry {
    specs: Vec<(AssetCategory, PathSpec)>,
}

impl PathRegistry {
    pub fn new(config: &Config) -> Self {
        let out = config.output_dir();
        let scripts = config.root_join(&config.paths.scripts);
        let styles = config.root_join(&config.paths.styles);
        let markup = config.root_join(&config.paths.markup);

        let specs = AssetCategory::ALL
            .iter()
            .map(|&category| {
                let spec = match category {
                    // Order matters: module declarations load before
                    // their members, mirroring script bootstrap order.
                    AssetCategory::Scripts => PathSpec {
                        source_globs: vec![
                            join_glob(&scripts, "app.module.js"),
                            join_glob(&scripts, "modules/**/*.module.js"),
                            join_glob(&scripts, "modules/**/*.js"),
                            join_glob(&scripts, "views/**/*.module.js"),
                            join_glob(&scripts, "views/**/*.js"),
                            join_glob(&scripts, "resources/*.module.js"),
                            join_glob(&scripts, "resources/*.js"),
                        ],
                        exclude_globs: vec![],
                        dest_dir: out.join("js"),
                        exclude_hidden: true,
                    },
                    AssetCategory::Styles => PathSpec {
                        source_globs: vec![join_glob(&styles, "*.*")],
                        exclude_globs: vec![join_glob(&styles, "themes/*")],
                        dest_dir: out.join("css"),
                        exclude_hidden: true,
                    },
                    AssetCategory::Themes => PathSpec {
                        source_globs: vec![join_glob(&styles, "themes/*")],
                        exclude_globs: vec![],
                        dest_dir: out.join("css"),
                        exclude_hidden: true,
                    },
                    AssetCategory::MarkupIndex => PathSpec {
                        source_globs: vec![join_glob(&markup, "index.*")],
                        exclude_globs: vec![],
                        dest_dir: out.clone(),
                        exclude_hidden: true,
                    },
                    AssetCategory::MarkupViews => PathSpec {
                        source_globs: vec![join_glob(&markup, "**/*.*")],
                        exclude_globs: vec![join_glob(&markup, "index.*")],
                        dest_dir: out.clone(),
                        exclude_hidden: true,
                    },
                    AssetCategory::I18n => PathSpec {
                        source_globs: vec![join_glob(&config.root_join(&config.paths.i18n), "*.*")],
                        exclude_globs: vec![],
                        dest_dir: out.join("i18n"),
                        exclude_hidden: true,
                    },
                    AssetCategory::Images => PathSpec {
                        source_globs: vec![join_glob(
                            &config.root_join(&config.paths.images),
                            "**/*.*",
                        )],
                        exclude_globs: vec![],
                        dest_dir: out.join("img"),
                        exclude_hidden: true,
                    },
                    AssetCategory::Data => PathSpec {
                        source_globs: vec![join_glob(
                            &config.root_join(&config.paths.data),
                            "**/*.*",
                        )],
                        exclude_globs: vec![],
                        dest_dir: out.join("data"),
                        exclude_hidden: true,
                    },
                    // Vendor categories resolve via manifests, not globs.
                    AssetCategory::VendorBase => PathSpec {
                        source_globs: vec![],
                        exclude_globs: vec![],
                        dest_dir: out.join("js"),
                        exclude_hidden: false,
                    },
                    AssetCategory::VendorApp => PathSpec {
                        source_globs: vec![],
                        exclude_globs: vec![],
                        dest_dir: out.join("vendor"),
                        exclude_hidden: false,
                    },
                };
                (category, spec)
            })
            .collect();

        Self { specs }
    }

    /// Look up the path spec for a category. Exhaustive by construction.
    pub fn spec(&self, category: AssetCategory) -> &PathSpec {
        &self
            .specs
            .iter()
            .find(|(c, _)| *c == category)
            .expect("registry covers every category")
            .1
    }

    /// Watch globs for the styles pipeline: everything under the styles
    /// root, since nested files can be imported from the top-level
    /// sheets. The category's exclude globs still carve out themes.
    pub fn styles_watch_globs(&self, config: &Config) -> Vec<String> {
        let styles = config.root_join(&config.paths.styles);
        vec![join_glob(&styles, "**/*")]
    }
}

fn join_glob(dir: &Path, pattern: &str) -> String {
    let mut s = dir.to_string_lossy().into_owned();
    if !s.ends_with(std::path::MAIN_SEPARATOR) && !s.ends_with('/') {
        s.push('/');
    }
    s.push_str(pattern);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_every_destination_under_build_root() {
        let config = test_parse_config("");
        let registry = PathRegistry::new(&config);
        let out = config.output_dir();

        for category in AssetCategory::ALL {
            let spec = registry.spec(category);
            assert!(
                spec.dest_dir.starts_with(&out),
                "{} dest {:?} escapes build root {:?}",
                category.label(),
                spec.dest_dir,
                out
            );
        }
    }

    #[test]
    fn test_script_globs_keep_bootstrap_order() {
        let config = test_parse_config("");
        let registry = PathRegistry::new(&config);
        let globs = &registry.spec(AssetCategory::Scripts).source_globs;

        assert!(globs[0].ends_with("app.module.js"));
        let modules = globs.iter().position(|g| g.contains("modules/**/*.module.js"));
        let plain = globs.iter().position(|g| g.ends_with("modules/**/*.js"));
        assert!(modules.unwrap() < plain.unwrap());
    }

    #[test]
    fn test_views_exclude_index() {
        let config = test_parse_config("");
        let registry = PathRegistry::new(&config);
        let spec = registry.spec(AssetCategory::MarkupViews);
        assert!(spec.exclude_globs.iter().any(|g| g.contains("index.")));
    }
}
