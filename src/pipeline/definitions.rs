//! Per-category pipeline definitions.
//!
//! Each asset category maps to one named pipeline with a fixed step
//! sequence. Conditional steps are resolved here, at build time, against
//! the immutable build options; nothing about a pipeline's shape changes
//! while it runs.

use std::path::PathBuf;

use super::changed::ChangedOnly;
use super::transform::{
    Annotate, BundleOverrides, CompileCss, Concat, InjectCacheScript, MinifyCss, MinifyJs,
    RenderHtml, TemplateCache, ValidateJs,
};
use super::{Pipeline, Source, StepDef};
use crate::config::{AssetCategory, BuildOptions, Config, PathRegistry};
use crate::vendor::VendorManifest;

/// Pipeline name for a category. These names are part of the CLI surface
/// and must stay stable.
pub fn pipeline_name(category: AssetCategory) -> &'static str {
    match category {
        AssetCategory::Scripts => "scripts:app",
        AssetCategory::Styles => "styles:app",
        AssetCategory::Themes => "styles:themes",
        AssetCategory::MarkupIndex => "templates:index",
        AssetCategory::MarkupViews => "templates:views",
        AssetCategory::I18n => "i18n:files",
        AssetCategory::Images => "images:files",
        AssetCategory::Data => "data:files",
        AssetCategory::VendorBase => "vendor:base",
        AssetCategory::VendorApp => "vendor:app",
    }
}

/// Build the concrete pipeline for a category.
pub fn build_pipeline(
    category: AssetCategory,
    config: &Config,
    registry: &PathRegistry,
    options: &BuildOptions,
    base_manifest: &VendorManifest,
    app_manifest: &VendorManifest,
) -> Pipeline {
    let name = pipeline_name(category);
    let spec = registry.spec(category).clone();
    let production = options.production;

    match category {
        AssetCategory::Scripts => Pipeline::new(
            name,
            globs(spec.clone(), config.root_join(&config.paths.scripts)),
            spec.dest_dir,
        )
        .with_steps(vec![
            StepDef::Always(Box::new(ValidateJs)),
            // per-file, ahead of concat, so map provenance stays exact
            StepDef::Always(Box::new(Annotate)),
            // minify before concat (like vendor:base) so the bundle map
            // still lines up with what actually entered the bundle
            StepDef::When(production, Box::new(MinifyJs)),
            StepDef::Always(Box::new(Concat {
                output: "app.js".into(),
                with_map: options.source_maps,
            })),
        ]),

        AssetCategory::VendorBase => Pipeline::new(
            name,
            Source::Manifest(base_manifest.clone()),
            spec.dest_dir,
        )
        .with_steps(vec![
            StepDef::When(production, Box::new(MinifyJs)),
            StepDef::Always(Box::new(BundleOverrides {
                fallback: Some(config.vendor.base_bundle.clone()),
            })),
        ]),

        AssetCategory::VendorApp => Pipeline::new(
            name,
            Source::Manifest(app_manifest.clone()),
            spec.dest_dir,
        )
        .with_steps(vec![
            StepDef::When(production, Box::new(MinifyJs)),
            StepDef::When(production, Box::new(MinifyCss)),
            // manifest entries may name a shared bundle; the rest copy
            // through per-file
            StepDef::Always(Box::new(BundleOverrides { fallback: None })),
        ]),

        AssetCategory::Styles => Pipeline::new(
            name,
            globs(spec.clone(), config.root_join(&config.paths.styles)),
            spec.dest_dir,
        )
        .with_steps(vec![
            StepDef::Always(Box::new(CompileCss)),
            StepDef::When(production, Box::new(MinifyCss)),
        ]),

        // themes are shipped readable, never minified
        AssetCategory::Themes => Pipeline::new(
            name,
            globs(
                spec.clone(),
                config.root_join(&config.paths.styles).join("themes"),
            ),
            spec.dest_dir,
        )
        .with_steps(vec![StepDef::Always(Box::new(CompileCss))]),

        AssetCategory::MarkupViews => {
            let markup_base = config.root_join(&config.paths.markup);
            if options.use_template_cache {
                // cache mode: one script module next to the app scripts
                let dest = config.output_dir().join("js");
                Pipeline::new(name, globs(spec, markup_base), dest).with_steps(vec![
                    StepDef::Always(Box::new(RenderHtml { wrap: false })),
                    StepDef::Always(Box::new(TemplateCache {
                        module: config.build.template_module.clone(),
                    })),
                    StepDef::When(production, Box::new(MinifyJs)),
                ])
            } else {
                let dest = spec.dest_dir.clone();
                Pipeline::new(name, globs(spec, markup_base), dest.clone()).with_steps(vec![
                    StepDef::When(
                        !production,
                        Box::new(ChangedOnly {
                            dest_dir: dest,
                            dest_extension: "html",
                        }),
                    ),
                    StepDef::Always(Box::new(RenderHtml { wrap: true })),
                ])
            }
        }

        AssetCategory::MarkupIndex => Pipeline::new(
            name,
            globs(spec.clone(), config.root_join(&config.paths.markup)),
            spec.dest_dir,
        )
        .with_steps(vec![
            StepDef::Always(Box::new(RenderHtml { wrap: true })),
            StepDef::When(
                options.use_template_cache,
                Box::new(InjectCacheScript {
                    src: format!("js/{}", config.build.template_module),
                }),
            ),
        ]),

        AssetCategory::I18n => Pipeline::new(
            name,
            globs(spec.clone(), config.root_join(&config.paths.i18n)),
            spec.dest_dir,
        )
        .with_steps(vec![]),

        AssetCategory::Images => Pipeline::new(
            name,
            globs(spec.clone(), config.root_join(&config.paths.images)),
            spec.dest_dir,
        )
        .with_steps(vec![]),

        AssetCategory::Data => Pipeline::new(
            name,
            globs(spec.clone(), config.root_join(&config.paths.data)),
            spec.dest_dir,
        )
        .with_steps(vec![]),
    }
}

fn globs(spec: crate::config::PathSpec, base: PathBuf) -> Source {
    Source::Globs { globs: spec, base }
}
