//! Schema data structures
//!
//! These types represent database schema information and form the contract
//! between introspection (produces) and code generation (consumes).

/// Database table
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Column names that form the primary key (in order)
    pub primary_key: Vec<String>,
    pub comment: Option<String>,
}

impl Table {
    pub fn is_primary_key(&self, column: &Column) -> bool {
        self.primary_key.contains(&column.name)
    }
}

/// A table column
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    /// Type as the database reports it, e.g. `character varying(64)`
    pub db_type: String,
    pub is_nullable: bool,
    /// Server-side default expression
    pub default: Option<String>,
    /// Column is auto-generated (SERIAL, BIGSERIAL, IDENTITY)
    pub is_auto_generated: bool,
    pub comment: Option<String>,
}

impl Column {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    SmallInt,
    Integer,
    BigInt,
    Boolean,
    Text,
    Varchar(Option<u32>),
    Char(Option<u32>),
    Real,
    DoublePrecision,
    Numeric,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    TimeTz,
    Uuid,
    Json,
    JsonBinary,
    Binary,
    Array(Box<DataType>),
    /// Custom enum type, stores the enum name
    Enum(String),
}

impl DataType {
    /// Types that map onto a calendar instant
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataType::Timestamp | DataType::TimestampTz | DataType::Date
        )
    }
}
