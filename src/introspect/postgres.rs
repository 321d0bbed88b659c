use postgres::Client;
use tracing::{debug, error, info, trace};

use super::Introspector;
use crate::prelude::GormliftError;
use crate::schema::{Column, DataType, Table};

/// PostgreSQL introspector bound to one schema (namespace)
pub struct PostgresIntrospector<'a> {
    client: &'a mut Client,
    schema: String,
}

impl<'a> PostgresIntrospector<'a> {
    pub fn new(client: &'a mut Client, schema: impl Into<String>) -> Self {
        Self {
            client,
            schema: schema.into(),
        }
    }

    fn failure(&self, message: String) -> GormliftError {
        GormliftError::Introspection {
            schema: self.schema.clone(),
            message,
        }
    }
}

impl Introspector for PostgresIntrospector<'_> {
    fn table_names(&mut self) -> Result<Vec<String>, GormliftError> {
        trace!(schema = ?self.schema, "Querying tables");

        let sql = r#"
            SELECT c.relname AS table_name
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p')
                AND n.nspname = $1
            ORDER BY c.relname
        "#;

        let rows = self.client.query(sql, &[&self.schema]).map_err(|e| {
            error!(schema = ?self.schema, error = ?e, "Failed to query tables");
            self.failure(format!("Failed to query tables: {}", e))
        })?;

        let tables: Vec<String> = rows.iter().map(|row| row.get("table_name")).collect();
        info!(schema = ?self.schema, tables = tables.len(), "Discovered tables");
        Ok(tables)
    }

    fn describe_table(&mut self, table_name: &str) -> Result<Table, GormliftError> {
        debug!(schema = ?self.schema, table = ?table_name, "Introspecting table");

        let comment = query_table_comment(self.client, &self.schema, table_name)
            .map_err(|e| self.failure(e))?;
        let Some(comment) = comment else {
            error!(schema = ?self.schema, table = ?table_name, "Table not found");
            return Err(self.failure(format!("Table '{}' does not exist", table_name)));
        };

        let columns = query_columns(self.client, &self.schema, table_name)
            .map_err(|e| self.failure(e))?;
        trace!(table = ?table_name, columns = ?columns.len(), "Found columns");

        let primary_key = query_primary_key(self.client, &self.schema, table_name)
            .map_err(|e| self.failure(e))?;
        trace!(table = ?table_name, primary_key = ?primary_key, "Found primary key");

        Ok(Table {
            name: table_name.to_string(),
            columns,
            primary_key,
            comment,
        })
    }
}

/// Table comment; the outer `None` means the table does not exist
fn query_table_comment(
    client: &mut Client,
    schema_name: &str,
    table_name: &str,
) -> Result<Option<Option<String>>, String> {
    let sql = r#"
        SELECT obj_description(c.oid, 'pg_class') AS comment
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relname = $1
            AND n.nspname = $2
            AND c.relkind IN ('r', 'p')
    "#;

    let row = client
        .query_opt(sql, &[&table_name, &schema_name])
        .map_err(|e| format!("Failed to look up table '{}': {}", table_name, e))?;

    Ok(row.map(|row| row.get("comment")))
}

/// Query all columns for a table
fn query_columns(
    client: &mut Client,
    schema_name: &str,
    table_name: &str,
) -> Result<Vec<Column>, String> {
    let sql = r#"
        SELECT
            a.attname AS column_name,
            format_type(a.atttypid, a.atttypmod) AS data_type,
            NOT a.attnotnull AS is_nullable,
            pg_get_expr(d.adbin, d.adrelid) AS default_value,
            a.attidentity <> '' AS is_identity,
            col_description(c.oid, a.attnum) AS comment
        FROM pg_attribute a
        JOIN pg_class c ON c.oid = a.attrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_attrdef d ON d.adrelid = c.oid AND d.adnum = a.attnum
        WHERE c.relname = $1
            AND n.nspname = $2
            AND a.attnum > 0
            AND NOT a.attisdropped
        ORDER BY a.attnum
    "#;

    let rows = client
        .query(sql, &[&table_name, &schema_name])
        .map_err(|e| format!("Failed to query columns for table '{}': {}", table_name, e))?;

    let columns = rows
        .iter()
        .map(|row| {
            let db_type: String = row.get("data_type");
            let default: Option<String> = row.get("default_value");
            let is_identity: bool = row.get("is_identity");

            let column = Column {
                name: row.get("column_name"),
                data_type: parse_data_type(&db_type),
                is_nullable: row.get("is_nullable"),
                is_auto_generated: is_identity || is_sequence_default(default.as_deref()),
                default,
                comment: row.get("comment"),
                db_type,
            };
            trace!(column = ?column.name, data_type = ?column.data_type, "Parsed column");
            column
        })
        .collect();

    Ok(columns)
}

/// Query primary key columns for a table
fn query_primary_key(
    client: &mut Client,
    schema_name: &str,
    table_name: &str,
) -> Result<Vec<String>, String> {
    let sql = r#"
        SELECT a.attname AS column_name
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(con.conkey)
        WHERE con.contype = 'p'
            AND c.relname = $1
            AND n.nspname = $2
        ORDER BY array_position(con.conkey, a.attnum)
    "#;

    let rows = client
        .query(sql, &[&table_name, &schema_name])
        .map_err(|e| format!("Failed to query primary key for table '{}': {}", table_name, e))?;

    Ok(rows.iter().map(|row| row.get("column_name")).collect())
}

/// SERIAL and BIGSERIAL columns default to nextval('sequence_name')
fn is_sequence_default(default_value: Option<&str>) -> bool {
    default_value.is_some_and(|d| d.to_lowercase().contains("nextval("))
}

/// Parse a `format_type` string into a DataType
fn parse_data_type(type_str: &str) -> DataType {
    let lower = type_str.trim().to_lowercase();

    if let Some(inner) = lower.strip_suffix("[]") {
        return DataType::Array(Box::new(parse_data_type(inner)));
    }

    if lower.starts_with("character varying") || lower.starts_with("varchar") {
        return DataType::Varchar(extract_length(&lower));
    }
    if lower.starts_with("character(") || lower.starts_with("char(") || lower == "character" {
        return DataType::Char(extract_length(&lower));
    }
    if lower.starts_with("numeric") || lower.starts_with("decimal") {
        return DataType::Numeric;
    }
    if lower.starts_with("timestamp") {
        return if lower.contains("with time zone") || lower == "timestamptz" {
            DataType::TimestampTz
        } else {
            DataType::Timestamp
        };
    }
    if lower.starts_with("time ") || lower.starts_with("time(") || lower == "time" {
        return if lower.contains("with time zone") {
            DataType::TimeTz
        } else {
            DataType::Time
        };
    }

    match lower.as_str() {
        "smallint" | "int2" => DataType::SmallInt,
        "integer" | "int" | "int4" => DataType::Integer,
        "bigint" | "int8" => DataType::BigInt,
        "boolean" | "bool" => DataType::Boolean,
        "text" => DataType::Text,
        "real" | "float4" => DataType::Real,
        "double precision" | "float8" => DataType::DoublePrecision,
        "date" => DataType::Date,
        "uuid" => DataType::Uuid,
        "json" => DataType::Json,
        "jsonb" => DataType::JsonBinary,
        "bytea" => DataType::Binary,
        "timetz" => DataType::TimeTz,
        // Anything else is treated as a user-defined enum
        _ => DataType::Enum(type_str.trim().to_string()),
    }
}

/// Extract length parameter from type like "varchar(255)"
fn extract_length(type_str: &str) -> Option<u32> {
    let start = type_str.find('(')?;
    let end = type_str[start..].find(')')? + start;
    type_str[start + 1..end].split(',').next()?.trim().parse().ok()
}
