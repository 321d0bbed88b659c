//! # gormlift
//!
//! Generate GORM models and typed query helpers from database schemas
//!
//! This crate provides a CLI tool and library that introspects a database,
//! selects and renames its tables, emits Go model and query packages and
//! post-processes the generated tests so they run on a pure Go SQLite driver.

pub mod codegen;
pub mod config;
pub mod driver;
pub mod error;
pub mod introspect;
pub mod naming;
pub mod output;
pub mod rewrite;
pub mod schema;
pub mod select;

pub mod prelude {
    pub use crate::codegen::{
        CodeGenConfig, CodeGenerator, FieldOptions, GoGenerator, QueryMode, TableRequest,
    };
    pub use crate::config::{DbScheme, DbSource, GenerationConfig};
    pub use crate::driver::{run, RunReport};
    pub use crate::error::{GormliftError, Warning};
    pub use crate::introspect::Introspector;
    pub use crate::naming::NamingStrategy;
    pub use crate::rewrite::ImportRewrite;
    pub use crate::schema::{Column, DataType, Table};
    pub use crate::select::{TableSelector, TableSpec};
}

#[cfg(feature = "postgres")]
pub use introspect::PostgresIntrospector;
