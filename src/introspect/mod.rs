//! Database introspection
//!
//! Extracts table listings and table structure from a live database. Each
//! supported database has its own feature-gated submodule.

use crate::prelude::{GormliftError, Table};

/// Trait for database introspection implementations
pub trait Introspector {
    /// Names of all tables in discovery order
    fn table_names(&mut self) -> Result<Vec<String>, GormliftError>;

    /// Columns, primary key and comments of one table
    fn describe_table(&mut self, table_name: &str) -> Result<Table, GormliftError>;
}

// Feature-gated database implementations
#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresIntrospector;
