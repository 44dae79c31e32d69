//! Watch orchestrator.
//!
//! Watches the source roots, debounces raw notify events, maps the
//! recovered batch onto asset pipelines by glob, and reruns only the
//! affected pipelines. Rebuild failures are logged and watching
//! continues; the orchestrator only stops on shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecursiveMode, Watcher};

use crate::config::{AssetCategory, BuildOptions, Config, PathRegistry};
use crate::pipeline::build_pipeline;
use crate::utils::plural;
use crate::{core, debug, log, vendor};

mod debouncer;

use debouncer::{ChangeKind, Debouncer};

/// Invoked after every batch that rebuilt at least one pipeline.
pub type ReloadHook = Arc<dyn Fn() + Send + Sync>;

/// One glob binding: paths matching any pattern and no exclude
/// retrigger the category.
struct Binding {
    category: AssetCategory,
    patterns: Vec<glob::Pattern>,
    excludes: Vec<glob::Pattern>,
}

/// Run the watch loop until shutdown. Blocks the calling thread.
pub fn run_watch(
    config: &Config,
    options: &BuildOptions,
    reload: Option<ReloadHook>,
) -> anyhow::Result<()> {
    let registry = PathRegistry::new(config);
    let bindings = build_bindings(config, &registry)?;

    let (notify_tx, notify_rx) = crossbeam::channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;
    let shutdown_rx = core::shutdown_signal();

    let roots = watch_roots(config);
    for root in &roots {
        watcher.watch(root, RecursiveMode::Recursive)?;
        debug!("watch"; "root {}", root.display());
    }
    for manifest in [&config.vendor.base_manifest, &config.vendor.app_manifest] {
        let path = config.root_join(manifest);
        if path.is_file() {
            watcher.watch(&path, RecursiveMode::NonRecursive)?;
        }
    }

    log!("watch"; "watching {} root{} for changes", roots.len(), plural(roots.len()));

    let mut debouncer = Debouncer::new();
    loop {
        if core::is_shutdown() {
            log!("watch"; "stopping");
            return Ok(());
        }

        crossbeam::channel::select! {
            recv(notify_rx) -> res => match res {
                Ok(Ok(event)) => debouncer.add_event(&event),
                Ok(Err(e)) => log!("watch"; "notify error: {e}"),
                Err(_) => return Ok(()),
            },
            recv(shutdown_rx) -> _ => {
                log!("watch"; "stopping");
                return Ok(());
            }
            default(debouncer.sleep_duration()) => {
                if let Some(changes) = debouncer.take_if_ready() {
                    let triggered = triggered_categories(&changes, &bindings);
                    if !triggered.is_empty() {
                        log_batch(&changes);
                        if rebuild(&triggered, config, options) > 0
                            && let Some(hook) = &reload
                        {
                            hook();
                        }
                    }
                }
            }
        }
    }
}

/// Directories to attach the watcher to.
fn watch_roots(config: &Config) -> Vec<PathBuf> {
    let dirs = [
        &config.paths.scripts,
        &config.paths.styles,
        &config.paths.markup,
        &config.paths.i18n,
        &config.paths.images,
        &config.paths.data,
    ];
    dirs.iter()
        .map(|d| config.root_join(d))
        .filter(|p| p.is_dir())
        .collect()
}

/// Bind every category to the glob patterns that should retrigger it.
fn build_bindings(config: &Config, registry: &PathRegistry) -> anyhow::Result<Vec<Binding>> {
    let mut bindings = Vec::new();

    for category in AssetCategory::ALL {
        let spec = registry.spec(category);
        let globs = match category {
            // App styles rebuild on any non-theme stylesheet change since
            // nested files can be imported from the top-level sheets.
            AssetCategory::Styles => registry.styles_watch_globs(config),
            AssetCategory::VendorBase => {
                vec![config.root_join(&config.vendor.base_manifest).display().to_string()]
            }
            AssetCategory::VendorApp => {
                vec![config.root_join(&config.vendor.app_manifest).display().to_string()]
            }
            _ => spec.source_globs.clone(),
        };

        let patterns = compile(&globs)?;
        // The category's negative globs scope the binding the same way
        // they scope the pipeline: a theme edit must not retrigger
        // styles:app, an index edit must not retrigger templates:views.
        let excludes = compile(&spec.exclude_globs)?;
        bindings.push(Binding { category, patterns, excludes });
    }

    Ok(bindings)
}

fn compile(globs: &[String]) -> anyhow::Result<Vec<glob::Pattern>> {
    Ok(globs
        .iter()
        .map(|g| glob::Pattern::new(g))
        .collect::<Result<Vec<_>, _>>()?)
}

/// Categories affected by a debounced batch, in definition order.
fn triggered_categories(
    changes: &rustc_hash::FxHashMap<PathBuf, ChangeKind>,
    bindings: &[Binding],
) -> Vec<AssetCategory> {
    let mut triggered = Vec::new();
    for binding in bindings {
        let hit = changes.keys().any(|path| {
            binding.patterns.iter().any(|p| p.matches_path(path))
                && !binding.excludes.iter().any(|p| p.matches_path(path))
        });
        if hit {
            triggered.push(binding.category);
        }
    }
    triggered
}

fn log_batch(changes: &rustc_hash::FxHashMap<PathBuf, ChangeKind>) {
    let mut entries: Vec<_> = changes.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (path, kind) in entries {
        log!("watch"; "{} {}", kind.label(), display_relative(path));
    }
}

fn display_relative(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).ok())
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Rerun the triggered pipelines; returns how many succeeded.
fn rebuild(categories: &[AssetCategory], config: &Config, options: &BuildOptions) -> usize {
    let registry = PathRegistry::new(config);
    let (base_manifest, app_manifest) = match vendor::load_manifests_lenient(config) {
        Ok(pair) => pair,
        Err(e) => {
            log!("error"; "vendor manifest reload failed: {e}");
            return 0;
        }
    };

    let mut categories: Vec<AssetCategory> = categories.to_vec();
    // A view change must also refresh the index when the template cache
    // is inlined into it.
    if options.use_template_cache
        && categories.contains(&AssetCategory::MarkupViews)
        && !categories.contains(&AssetCategory::MarkupIndex)
    {
        categories.push(AssetCategory::MarkupIndex);
    }

    let mut succeeded = 0;
    for category in categories {
        let pipeline = build_pipeline(
            category,
            config,
            &registry,
            options,
            &base_manifest,
            &app_manifest,
        );
        match pipeline.run(config, options) {
            Ok(()) => succeeded += 1,
            Err(e) => log!("error"; "{} failed: {e}", pipeline.name),
        }
    }
    succeeded
}
