use std::fmt;

use thiserror::Error;

/// gormlift errors
#[derive(Error, Debug)]
pub enum GormliftError {
    #[error("Invalid database source '{0}': expected scheme://path")]
    InvalidSource(String),

    #[error("Unsupported database scheme '{scheme}' in '{uri}'")]
    UnsupportedScheme { scheme: String, uri: String },

    #[error("Failed to connect to {0}")]
    Connection(String),

    #[error("Failed to introspect schema '{schema}': {message}")]
    Introspection { schema: String, message: String },

    #[error("Table naming conflict: {0}")]
    Naming(String),

    #[error("Code generation failed for table '{table}': {message}")]
    CodeGen { table: String, message: String },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A non-fatal housekeeping failure.
///
/// Warnings are collected over a run and reported at the end, next to the
/// generated files. `target` names the path or table that was affected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub target: String,
    pub message: String,
}

impl Warning {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.message)
    }
}
