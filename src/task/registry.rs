//! Builtin task registry.
//!
//! Declares the public task names (part of the CLI surface, kept stable)
//! and wires them into the graph:
//!
//! ```text
//! build      = seq [vendor, assets]            (production options)
//! default    = seq [vendor, assets, serve]
//! sourcemaps = seq [default]                   (source-map options)
//! vendor     = par [vendor:base, vendor:app]
//! assets     = par [all leaf pipelines]
//! ```

use std::fs;

use super::graph::{GraphBuilder, TaskBody, TaskError, TaskGraph};
use crate::config::{AssetCategory, BuildOptions, Config, PathRegistry};
use crate::pipeline::build_pipeline;
use crate::log;
use crate::vendor;

/// Leaf pipeline names composing the `assets` group.
const ASSET_LEAVES: [&str; 8] = [
    "scripts:app",
    "styles:app",
    "styles:themes",
    "templates:index",
    "templates:views",
    "i18n:files",
    "images:files",
    "data:files",
];

/// Build the full builtin graph for one invocation.
///
/// Pipelines are baked against the immutable options here; nothing about
/// the graph changes while it runs.
pub fn build_graph(
    config: &Config,
    options: &BuildOptions,
    force_clean: bool,
) -> anyhow::Result<TaskGraph> {
    let registry = PathRegistry::new(config);
    let (base_manifest, app_manifest) = vendor::load_manifests_lenient(config)?;

    let mut b = GraphBuilder::new();

    for category in AssetCategory::ALL {
        let pipeline = build_pipeline(
            category,
            config,
            &registry,
            options,
            &base_manifest,
            &app_manifest,
        );
        let name = pipeline.name.clone();
        if category == AssetCategory::MarkupIndex {
            // index embeds a reference to the views output
            b.leaf_with_deps(name, TaskBody::Pipeline(pipeline), vec![
                "templates:views".into(),
            ]);
        } else {
            b.leaf(name, TaskBody::Pipeline(pipeline));
        }
    }

    b.par("vendor", vec!["vendor:base".into(), "vendor:app".into()]);
    b.par("assets", ASSET_LEAVES.iter().map(|s| s.to_string()).collect());
    b.seq("build", vec!["vendor".into(), "assets".into()]);

    b.leaf(
        "watch",
        TaskBody::Action(Box::new(|config, options| {
            crate::watch::run_watch(config, options, None).map_err(|e| TaskError::Failed {
                task: "watch".into(),
                message: e.to_string(),
            })
        })),
    );
    b.leaf(
        "serve",
        TaskBody::Action(Box::new(|config, options| {
            crate::serve::run_serve(config, options).map_err(|e| TaskError::Failed {
                task: "serve".into(),
                message: e.to_string(),
            })
        })),
    );

    // `serve` runs the watcher internally, so `default` gets both the
    // rebuild loop and live reload.
    b.seq(
        "default",
        vec!["vendor".into(), "assets".into(), "serve".into()],
    );
    // flag effects are applied by the invocation plan; the alias keeps
    // the name invocable
    b.seq("sourcemaps", vec!["default".into()]);

    b.leaf(
        "clean",
        TaskBody::Action(Box::new(move |config, _| clean_output(config, force_clean))),
    );
    b.leaf(
        "lint",
        TaskBody::Action(Box::new(|config, _| {
            let findings = crate::lint::run_lint(config).map_err(|e| TaskError::Failed {
                task: "lint".into(),
                message: e.to_string(),
            })?;
            if findings > 0 {
                return Err(TaskError::Failed {
                    task: "lint".into(),
                    message: format!(
                        "{findings} finding{}",
                        if findings == 1 { "" } else { "s" }
                    ),
                });
            }
            Ok(())
        })),
    );

    Ok(b.build()?)
}

/// Delete the build output root.
///
/// A build root outside the project root is only deleted with `--force`,
/// so a mistyped config cannot wipe unrelated directories.
fn clean_output(config: &Config, force: bool) -> Result<(), TaskError> {
    let out = config.output_dir();

    if out.parent().is_none() {
        return Err(TaskError::Failed {
            task: "clean".into(),
            message: "refusing to delete filesystem root".into(),
        });
    }
    if config.output_escapes_root() && !force {
        return Err(TaskError::Failed {
            task: "clean".into(),
            message: format!(
                "build root `{}` is outside the project root; pass --force to delete it",
                out.display()
            ),
        });
    }

    if !out.exists() {
        log!("clean"; "{} already clean", out.display());
        return Ok(());
    }

    log!("clean"; "removing {}", out.display());
    fs::remove_dir_all(&out).map_err(|e| TaskError::Failed {
        task: "clean".into(),
        message: e.to_string(),
    })
}
