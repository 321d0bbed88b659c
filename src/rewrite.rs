//! Test source rewriting
//!
//! Generated query tests import the cgo SQLite driver. This pass points them
//! at a pure Go driver so they run without a C toolchain.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace, warn};

use crate::error::Warning;

/// Import substitution applied to generated test files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRewrite {
    /// Quoted import path to replace
    pub from: String,
    /// Quoted import path to put in its place
    pub to: String,
    /// File name suffix of the files to rewrite
    pub test_suffix: String,
}

impl Default for ImportRewrite {
    fn default() -> Self {
        Self {
            from: r#""gorm.io/driver/sqlite""#.to_string(),
            to: r#""github.com/glebarez/sqlite""#.to_string(),
            test_suffix: "_test.go".to_string(),
        }
    }
}

impl ImportRewrite {
    /// Module path of `from` without its quotes
    fn from_module(&self) -> &str {
        self.from.trim_matches(|c: char| c == '"' || c == '`')
    }
}

/// Outcome of a rewrite pass
#[derive(Debug, Default)]
pub struct RewriteReport {
    /// Files whose content changed
    pub rewritten: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Rewrite driver imports in every test file under `dirs`
pub fn rewrite_tests(dirs: &[&Path], rule: &ImportRewrite) -> RewriteReport {
    let mut report = RewriteReport::default();

    for dir in dirs {
        walk(dir, rule, &mut report);
    }

    info!(
        rewritten = report.rewritten.len(),
        warnings = report.warnings.len(),
        "Test import rewrite complete"
    );
    report
}

fn walk(dir: &Path, rule: &ImportRewrite, report: &mut RewriteReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = ?dir, error = ?e, "Failed to read directory");
            report.warnings.push(Warning::new(
                dir.display().to_string(),
                format!("failed to read directory: {}", e),
            ));
            return;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(path = ?dir, error = ?e, "Failed to read directory entry");
                report.warnings.push(Warning::new(
                    dir.display().to_string(),
                    format!("failed to read directory entry: {}", e),
                ));
                continue;
            }
        };

        if path.is_dir() {
            walk(&path, rule, report);
        } else if path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(&rule.test_suffix))
        {
            rewrite_file(&path, rule, report);
        }
    }
}

fn rewrite_file(path: &Path, rule: &ImportRewrite, report: &mut RewriteReport) {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = ?path, error = ?e, "Failed to read test file");
            report
                .warnings
                .push(Warning::new(path.display().to_string(), format!("failed to read: {}", e)));
            return;
        }
    };

    if !content.contains(&rule.from) {
        if content.contains(rule.from_module()) {
            warn!(path = ?path, import = ?rule.from, "Driver import not in expected form, file left unchanged");
            report.warnings.push(Warning::new(
                path.display().to_string(),
                format!("mentions {} but not as {}, left unchanged", rule.from_module(), rule.from),
            ));
        } else {
            trace!(path = ?path, "No driver import to rewrite");
        }
        return;
    }

    let updated = content.replace(&rule.from, &rule.to);
    match fs::write(path, updated) {
        Ok(()) => {
            debug!(path = ?path, from = ?rule.from, to = ?rule.to, "Rewrote driver import");
            report.rewritten.push(path.to_path_buf());
        }
        Err(e) => {
            warn!(path = ?path, error = ?e, "Failed to write test file");
            report
                .warnings
                .push(Warning::new(path.display().to_string(), format!("failed to write: {}", e)));
        }
    }
}
