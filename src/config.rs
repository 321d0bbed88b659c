//! Configuration
//!
//! Parses the database source URI (optionally read from a .env file) and
//! holds the immutable settings of one generation run.

use std::{env, path::Path};

use tracing::{debug, error, warn};

use crate::codegen::CodeGenConfig;
use crate::naming::normalize_prefix;
use crate::prelude::GormliftError;
use crate::rewrite::ImportRewrite;

/// Environment variable consulted when no source is given explicitly
pub const DB_SOURCE_VAR: &str = "DB_SOURCE";

/// Database engines a source URI can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbScheme {
    Postgres,
    Mysql,
    Sqlite,
}

impl DbScheme {
    fn parse(scheme: &str) -> Option<Self> {
        match scheme.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" | "postgre" => Some(Self::Postgres),
            "mysql" => Some(Self::Mysql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

/// A database source written as `scheme://path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSource {
    pub scheme: DbScheme,
    pub path: String,
}

impl DbSource {
    /// Parse a `scheme://path` URI
    pub fn parse(uri: &str) -> Result<Self, GormliftError> {
        let parts: Vec<&str> = uri.split("://").collect();
        let [scheme, path] = parts.as_slice() else {
            let masked = mask_uri(uri);
            error!(source = ?masked, "Database source is not scheme://path");
            return Err(GormliftError::InvalidSource(masked));
        };

        let scheme = DbScheme::parse(scheme).ok_or_else(|| {
            error!(scheme = ?scheme, "Unknown database scheme");
            GormliftError::UnsupportedScheme {
                scheme: scheme.to_string(),
                uri: mask_uri(uri),
            }
        })?;

        Ok(Self {
            scheme,
            path: path.to_string(),
        })
    }

    /// Resolve the source from an explicit value or the environment
    ///
    /// The .env file is loaded first when it exists; an explicit value wins
    /// over [`DB_SOURCE_VAR`].
    pub fn load(explicit: Option<&str>, env_file: &Path) -> Result<Self, GormliftError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                GormliftError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            warn!(path = ?env_file, "Environment file not found, using existing environment");
        }

        match explicit {
            Some(uri) => Self::parse(uri),
            None => {
                let uri = env::var(DB_SOURCE_VAR).map_err(|_| {
                    error!("No database source given and {} is not set", DB_SOURCE_VAR);
                    GormliftError::Config(format!(
                        "--dbsrc or the {} environment variable is required",
                        DB_SOURCE_VAR
                    ))
                })?;
                Self::parse(&uri)
            }
        }
    }

    /// Connection parameters for the postgres client
    ///
    /// Key/value DSNs pass through; anything else is read as a URL remainder.
    pub fn postgres_connection_string(&self) -> String {
        if self.path.contains('=') {
            self.path.clone()
        } else {
            format!("postgresql://{}", self.path)
        }
    }

    /// The source with its password masked (for logs and error messages)
    pub fn redacted(&self) -> String {
        format!("{}://{}", self.scheme.name(), mask_password(&self.path))
    }
}

/// Mask the password in a raw, possibly malformed, source URI
fn mask_uri(uri: &str) -> String {
    match uri.split_once("://") {
        Some((scheme, rest)) => format!("{}://{}", scheme, mask_password(rest)),
        None => mask_password(uri),
    }
}

/// Mask the password in a key/value DSN or a `user:password@host` path
fn mask_password(path: &str) -> String {
    if path.contains('=') {
        path.split_whitespace()
            .map(|pair| match pair.split_once('=') {
                Some((key, _)) if key.eq_ignore_ascii_case("password") => format!("{}=***", key),
                _ => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        match (path.find(':'), path.rfind('@')) {
            (Some(colon), Some(at)) if colon < at => {
                format!("{}:***{}", &path[..colon], &path[at..])
            }
            _ => path.to_string(),
        }
    }
}

/// Split a comma-separated list, dropping blank entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Settings for one generation run
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Always ends with the naming separator
    pub table_prefix: String,
    /// Allow-list of raw table names (empty means all)
    pub tables: Vec<String>,
    /// Deny-list of raw table names
    pub tables_ex: Vec<String>,
    /// Remove the output trees before generating
    pub clear: bool,
    /// Patterns written to each output tree's ignore-manifest
    pub ignore_patterns: Vec<String>,
    /// Driver import substitution for generated tests, if any
    pub rewrite: Option<ImportRewrite>,
    pub codegen: CodeGenConfig,
}

impl GenerationConfig {
    pub fn new(codegen: CodeGenConfig) -> Self {
        Self {
            table_prefix: normalize_prefix(""),
            tables: Vec::new(),
            tables_ex: Vec::new(),
            clear: true,
            ignore_patterns: vec!["*_test.db".to_string()],
            rewrite: Some(ImportRewrite::default()),
            codegen,
        }
    }

    pub fn with_table_prefix(mut self, prefix: &str) -> Self {
        self.table_prefix = normalize_prefix(prefix);
        self
    }

    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = dedup(tables);
        self
    }

    pub fn with_tables_ex(mut self, tables: Vec<String>) -> Self {
        self.tables_ex = dedup(tables);
        self
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_rewrite(mut self, rewrite: Option<ImportRewrite>) -> Self {
        self.rewrite = rewrite;
        self
    }

    pub fn query_dir(&self) -> &Path {
        &self.codegen.query_dir
    }

    pub fn model_dir(&self) -> &Path {
        &self.codegen.model_dir
    }
}

/// Drop repeated and blank names, keeping first occurrences in order
fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_string();
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}
