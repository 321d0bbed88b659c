//! Generation driver
//!
//! Runs one generation end to end: prepare the output trees, select tables,
//! invoke the generator, then do the housekeeping passes.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::codegen::{CodeGenerator, TableRequest};
use crate::config::GenerationConfig;
use crate::error::{GormliftError, Warning};
use crate::introspect::Introspector;
use crate::output;
use crate::rewrite;
use crate::select::{TableSelector, TableSpec};

/// Result of a successful run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Selection decision for every discovered table
    pub tables: Vec<TableSpec>,
    /// Files written by the generator
    pub files: Vec<PathBuf>,
    /// Test files whose driver import was rewritten
    pub rewritten: Vec<PathBuf>,
    /// Housekeeping problems that did not stop the run
    pub warnings: Vec<Warning>,
}

impl RunReport {
    pub fn included(&self) -> impl Iterator<Item = &TableSpec> {
        self.tables.iter().filter(|t| t.is_included())
    }
}

/// Run a full generation
///
/// Configuration and generation failures are returned as errors and leave
/// whatever was already written in place; re-run with clearing enabled.
/// Housekeeping failures end up in [`RunReport::warnings`].
pub fn run(
    introspector: &mut dyn Introspector,
    generator: &dyn CodeGenerator,
    config: &GenerationConfig,
) -> Result<RunReport, GormliftError> {
    let selector = TableSelector::new(
        &config.table_prefix,
        config.tables.clone(),
        config.tables_ex.clone(),
    );
    info!(
        prefix = ?selector.prefix(),
        tables = ?config.tables,
        tables_ex = ?config.tables_ex,
        clear = config.clear,
        "Starting generation run"
    );

    let dirs = config.codegen.output_dirs();
    output::reset(&dirs, config.clear)?;

    let discovered = introspector.table_names()?;
    let tables = selector.select(&discovered);
    selector.check_conflicts(&tables)?;

    let mut warnings = Vec::new();
    for name in &config.tables {
        if !discovered.contains(name) {
            warn!(table = ?name, "Requested table not found in schema");
            warnings.push(Warning::new(name.clone(), "table not found in schema, skipped"));
        }
    }

    for spec in &tables {
        debug!(table = ?spec.raw_name, output = ?spec.output, "Table selection");
    }

    let request = if config.tables.is_empty() {
        TableRequest::All
    } else {
        TableRequest::Named(
            config
                .tables
                .iter()
                .filter(|name| tables.iter().any(|t| &t.raw_name == *name && t.is_included()))
                .cloned()
                .collect(),
        )
    };

    let files = generator.generate(introspector, &request, &selector, &config.codegen)?;
    info!(files = files.len(), "Generation finished");

    warnings.extend(output::write_ignore_manifest(&dirs, &config.ignore_patterns));

    let rewritten = match &config.rewrite {
        Some(rule) => {
            let report = rewrite::rewrite_tests(&dirs, rule);
            warnings.extend(report.warnings);
            report.rewritten
        }
        None => Vec::new(),
    };

    Ok(RunReport {
        tables,
        files,
        rewritten,
        warnings,
    })
}
