//! Output directory lifecycle
//!
//! Prepares the model and query trees before generation and writes the
//! `.gitignore` manifests once generation is done.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::error::{GormliftError, Warning};

/// File name of the ignore-manifest written into each output tree
pub const IGNORE_MANIFEST: &str = ".gitignore";

/// Optionally purge the output trees, then make sure each one exists
///
/// Removing a missing directory is not an error. Failing to create a
/// directory is, since the generator writes straight into these paths.
pub fn reset(paths: &[&Path], clear: bool) -> Result<(), GormliftError> {
    for path in paths {
        if clear {
            match fs::remove_dir_all(path) {
                Ok(()) => info!(path = ?path, "Cleared output directory"),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = ?path, "Output directory absent, nothing to clear")
                }
                Err(e) => {
                    error!(path = ?path, error = ?e, "Failed to clear output directory");
                    return Err(e.into());
                }
            }
        }

        fs::create_dir_all(path).map_err(|e| {
            error!(path = ?path, error = ?e, "Failed to create output directory");
            GormliftError::Output(e)
        })?;
        debug!(path = ?path, "Output directory ready");
    }

    Ok(())
}

/// Write an ignore-manifest listing `patterns` into each path
///
/// Existing manifests are overwritten. Failures are returned as warnings and
/// the remaining paths are still processed.
pub fn write_ignore_manifest(paths: &[&Path], patterns: &[String]) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let mut content = patterns.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    for dir in paths {
        if let Err(e) = fs::create_dir_all(dir) {
            warn!(path = ?dir, error = ?e, "Failed to create directory");
            warnings.push(Warning::new(
                dir.display().to_string(),
                format!("failed to create directory: {}", e),
            ));
            continue;
        }

        let manifest = dir.join(IGNORE_MANIFEST);
        match fs::write(&manifest, &content) {
            Ok(()) => debug!(path = ?manifest, patterns = ?patterns, "Wrote ignore manifest"),
            Err(e) => {
                warn!(path = ?manifest, error = ?e, "Failed to write ignore manifest");
                warnings.push(Warning::new(
                    manifest.display().to_string(),
                    format!("failed to write ignore manifest: {}", e),
                ));
            }
        }
    }

    warnings
}
