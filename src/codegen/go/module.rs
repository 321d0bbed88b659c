//! Go module lookup
//!
//! The query package imports the model package, so the model directory has
//! to be expressed as a Go import path.

use std::fs;
use std::path::Path;

use tracing::{debug, trace};

/// Package name for a directory: its base name reduced to `[a-z0-9_]`
pub fn package_name(dir: &Path, fallback: &str) -> String {
    let name: String = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    match name.chars().next() {
        Some(first) if !first.is_ascii_digit() => name,
        _ => fallback.to_string(),
    }
}

/// Import path of `dir`, resolved against the nearest enclosing `go.mod`
///
/// Falls back to `fallback` when the directory is not inside a Go module.
pub fn import_path(dir: &Path, fallback: &str) -> String {
    let Ok(dir) = dir.canonicalize() else {
        debug!(path = ?dir, "Cannot resolve directory, using package name as import path");
        return fallback.to_string();
    };

    for root in dir.ancestors() {
        let go_mod = root.join("go.mod");
        let Ok(content) = fs::read_to_string(&go_mod) else {
            continue;
        };
        trace!(path = ?go_mod, "Found go.mod");

        let Some(module) = module_path(&content) else {
            debug!(path = ?go_mod, "go.mod has no module directive");
            break;
        };

        let Ok(relative) = dir.strip_prefix(root) else {
            break;
        };
        let mut import = module.to_string();
        for part in relative.components() {
            import.push('/');
            import.push_str(&part.as_os_str().to_string_lossy());
        }
        debug!(import = ?import, "Resolved model import path");
        return import;
    }

    fallback.to_string()
}

/// Value of the `module` directive in a go.mod file
fn module_path(go_mod: &str) -> Option<&str> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.split("//").next()?.trim().trim_matches('"');
        (!module.is_empty()).then_some(module)
    })
}
