//! Code generation
//!
//! This module provides the generator seam and the Go/GORM generator that
//! turns introspected tables into model and query packages.

use std::path::{Path, PathBuf};

use crate::introspect::Introspector;
use crate::naming::NamingStrategy;
use crate::prelude::GormliftError;

pub mod go;

pub use go::GoGenerator;

/// Query API flavour of the generated query package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryMode {
    /// Query objects are usable without binding a `context.Context`
    pub without_context: bool,
    /// Emit package-level `Q` and per-table defaults plus `SetDefault`
    pub default_query: bool,
    /// Emit an `I<Model>Do` interface per table
    pub query_interface: bool,
}

impl Default for QueryMode {
    fn default() -> Self {
        Self {
            without_context: true,
            default_query: true,
            query_interface: true,
        }
    }
}

/// How columns become model fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOptions {
    /// Pointer types for nullable columns
    pub nullable: bool,
    /// Pointer types for columns with a default, so zero values can be written
    pub coverable: bool,
    /// Emit the database type in the gorm tag
    pub type_tag: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            nullable: true,
            coverable: true,
            type_tag: true,
        }
    }
}

/// Configuration for code generation
#[derive(Debug, Clone)]
pub struct CodeGenConfig {
    pub model_dir: PathBuf,
    pub query_dir: PathBuf,
    pub query_mode: QueryMode,
    pub fields: FieldOptions,
    /// Emit `_test.go` files for the query package
    pub unit_test: bool,
    /// Generated tests open the database with a UTC clock
    pub utc_timestamps: bool,
}

impl CodeGenConfig {
    pub fn new(model_dir: impl Into<PathBuf>, query_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            query_dir: query_dir.into(),
            query_mode: QueryMode::default(),
            fields: FieldOptions::default(),
            unit_test: true,
            utc_timestamps: true,
        }
    }

    pub fn with_query_mode(mut self, mode: QueryMode) -> Self {
        self.query_mode = mode;
        self
    }

    pub fn with_fields(mut self, fields: FieldOptions) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_unit_test(mut self, unit_test: bool) -> Self {
        self.unit_test = unit_test;
        self
    }

    pub fn with_utc_timestamps(mut self, utc: bool) -> Self {
        self.utc_timestamps = utc;
        self
    }

    /// Output directories, query tree first
    pub fn output_dirs(&self) -> [&Path; 2] {
        [self.query_dir.as_path(), self.model_dir.as_path()]
    }
}

/// Which tables a generator run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRequest {
    /// Every table the introspector reports
    All,
    /// These tables, by raw name, in order
    Named(Vec<String>),
}

/// Trait for code generators
pub trait CodeGenerator {
    /// Generate sources for the requested tables and return the written paths
    ///
    /// Tables the naming strategy resolves to `None` are skipped.
    fn generate(
        &self,
        introspector: &mut dyn Introspector,
        request: &TableRequest,
        naming: &dyn NamingStrategy,
        config: &CodeGenConfig,
    ) -> Result<Vec<PathBuf>, GormliftError>;
}
