//! Table naming
//!
//! Turns raw schema table names into the identifiers used for generated
//! models and files.

/// Separator between a table prefix and the rest of the table name
pub const SEPARATOR: char = '_';

/// Ensure a table prefix ends with [`SEPARATOR`]
///
/// An empty prefix becomes the bare separator, which only strips a single
/// leading underscore from table names.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with(SEPARATOR) {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, SEPARATOR)
    }
}

/// Normalize a raw table name into an output identifier
///
/// Removes `prefix` when the name starts with it, then strips at most one
/// leading and one trailing separator. A name equal to the prefix yields an
/// empty string.
pub fn normalize(table_name: &str, prefix: &str) -> String {
    let name = table_name.strip_prefix(prefix).unwrap_or(table_name);
    let name = name.strip_prefix(SEPARATOR).unwrap_or(name);
    let name = name.strip_suffix(SEPARATOR).unwrap_or(name);
    name.to_string()
}

/// Naming policy injected into a code generator
pub trait NamingStrategy {
    /// Output identifier for a table, or `None` when the table must be skipped
    fn resolve_output_name(&self, table_name: &str) -> Option<String>;

    /// Base file name (without extension) for a table's generated sources
    fn resolve_file_name(&self, table_name: &str) -> String;
}

/// Convert snake_case to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    s.split(SEPARATOR)
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// Convert snake_case to camelCase
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}
