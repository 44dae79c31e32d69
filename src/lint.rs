//! Script linting.
//!
//! Parses every application script with the same parser the build uses
//! and reports its diagnostics without writing any output. The task
//! fails when findings exist so CI can gate on it.

use oxc::allocator::Allocator;
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::config::{AssetCategory, Config, PathRegistry};
use crate::fileset::FileSet;
use crate::pipeline::PipelineError;
use crate::utils::plural;
use crate::log;

/// Lint all application scripts; returns the number of findings.
pub fn run_lint(config: &Config) -> Result<usize, PipelineError> {
    let registry = PathRegistry::new(config);
    let spec = registry.spec(AssetCategory::Scripts);
    let base = config.root_join(&config.paths.scripts);
    let files = FileSet::from_globs(spec, &base, &config.build.hidden_prefix)?;

    let mut findings = 0;
    for entry in &files.entries {
        let text = entry.text("lint")?;
        for message in diagnostics(text) {
            log!("lint"; "{}: {}", entry.relative.display(), message);
            findings += 1;
        }
    }

    log!(
        "lint";
        "{} file{} checked, {} finding{}",
        files.len(),
        plural(files.len()),
        findings,
        plural(findings)
    );
    Ok(findings)
}

/// All parser diagnostics for one source, in source order.
fn diagnostics(source: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    ret.errors.iter().map(|err| format!("{err:?}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::fs;
    use tempfile::TempDir;

    fn project_with(scripts: &[(&str, &str)]) -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        for (rel, body) in scripts {
            let path = tmp.path().join("js").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let mut config = test_parse_config("");
        config.root = tmp.path().to_path_buf();
        (tmp, config)
    }

    #[test]
    fn test_clean_sources_have_no_findings() {
        let (_tmp, config) = project_with(&[
            ("app.module.js", "const app = {};\nexport { app };\n"),
            ("modules/auth/auth.module.js", "export const auth = 1;\n"),
        ]);
        assert_eq!(run_lint(&config).unwrap(), 0);
    }

    #[test]
    fn test_broken_source_is_counted_not_fatal() {
        let (_tmp, config) = project_with(&[
            ("app.module.js", "const ok = 1;\n"),
            ("modules/bad/bad.module.js", "const broken = (;\n"),
        ]);
        assert!(run_lint(&config).unwrap() > 0);
    }

    #[test]
    fn test_empty_project_lints_clean() {
        let (_tmp, config) = project_with(&[]);
        assert_eq!(run_lint(&config).unwrap(), 0);
    }

    #[test]
    fn test_diagnostics_in_source_order() {
        let found = diagnostics("const a = ;\nconst b = 1;\n");
        assert!(!found.is_empty());
    }
}
