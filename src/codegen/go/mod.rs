//! Go code generator
//!
//! Generates GORM model structs and typed query helpers.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::Environment;
use tracing::{debug, error, info};

use crate::codegen::{CodeGenConfig, CodeGenerator, FieldOptions, TableRequest};
use crate::error::GormliftError;
use crate::introspect::Introspector;
use crate::naming::{to_camel_case, NamingStrategy, SEPARATOR};
use crate::schema::{Column, DataType, Table};

mod module;

pub use module::{import_path, package_name};

/// Words rendered fully upper-case in Go identifiers
const INITIALISMS: &[&str] = &[
    "ACL", "API", "CPU", "CSS", "DNS", "HTML", "HTTP", "HTTPS", "ID", "IP", "JSON", "SQL", "SSH",
    "TCP", "TLS", "TTL", "UID", "UI", "URI", "URL", "UTF8", "UUID", "XML",
];

/// Identifiers gen.go declares next to the per-table query fields
const RESERVED_QUERY_NAMES: &[&str] = &["Q", "Query", "SetDefault", "Transaction", "Use"];

/// Go code generator
pub struct GoGenerator {
    env: Environment<'static>,
}

impl GoGenerator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        // Register templates
        env.add_template("model", include_str!("templates/model.go.jinja"))
            .expect("Failed to load model template");
        env.add_template("query", include_str!("templates/query.go.jinja"))
            .expect("Failed to load query template");
        env.add_template("query_test", include_str!("templates/query_test.go.jinja"))
            .expect("Failed to load query test template");
        env.add_template("gen", include_str!("templates/gen.go.jinja"))
            .expect("Failed to load gen template");
        env.add_template("gen_test", include_str!("templates/gen_test.go.jinja"))
            .expect("Failed to load gen test template");

        Self { env }
    }
}

impl Default for GoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Names shared by everything generated for one table
struct TableNames {
    raw: String,
    file: String,
    struct_name: String,
    var_name: String,
    do_name: String,
}

impl TableNames {
    fn new(raw: &str, output_name: &str, file: String) -> Self {
        let struct_name = go_identifier(output_name);
        let camel = to_camel_case(&struct_name.replace(SEPARATOR, ""));
        Self {
            raw: raw.to_string(),
            file,
            var_name: format!("{}Query", camel),
            do_name: format!("{}Do", camel),
            struct_name,
        }
    }
}

/// Packages and import paths of the two output trees
struct Packages {
    model: String,
    model_import: String,
    query: String,
}

impl CodeGenerator for GoGenerator {
    fn generate(
        &self,
        introspector: &mut dyn Introspector,
        request: &TableRequest,
        naming: &dyn NamingStrategy,
        config: &CodeGenConfig,
    ) -> Result<Vec<PathBuf>, GormliftError> {
        info!(
            model_dir = ?config.model_dir,
            query_dir = ?config.query_dir,
            request = ?request,
            "Generating Go code"
        );

        let table_names = match request {
            TableRequest::All => introspector.table_names()?,
            TableRequest::Named(names) => names.clone(),
        };

        let model = package_name(&config.model_dir, "model");
        let packages = Packages {
            model_import: import_path(&config.model_dir, &model),
            model,
            query: package_name(&config.query_dir, "query"),
        };
        debug!(model = ?packages.model, import = ?packages.model_import, query = ?packages.query, "Resolved packages");

        let mut generated = Vec::new();
        for raw in &table_names {
            let Some(output_name) = naming.resolve_output_name(raw) else {
                debug!(table = ?raw, "Skipping table");
                continue;
            };
            let file = naming.resolve_file_name(raw);
            if output_name.is_empty() || file.is_empty() {
                error!(table = ?raw, "Table resolves to an empty name");
                return Err(GormliftError::CodeGen {
                    table: raw.clone(),
                    message: "table resolves to an empty output name".to_string(),
                });
            }
            generated.push(TableNames::new(raw, &output_name, file));
        }
        check_identifiers(&generated)?;

        let mut written = Vec::new();
        for names in &generated {
            let table = introspector.describe_table(&names.raw)?;
            written.extend(self.generate_table(&table, names, &packages, config)?);
        }

        written.extend(self.generate_query_entry(&generated, &packages, config)?);

        info!(
            tables = generated.len(),
            files = written.len(),
            "Go code generation complete"
        );
        Ok(written)
    }
}

impl GoGenerator {
    /// Write model, query and query test files for one table
    fn generate_table(
        &self,
        table: &Table,
        names: &TableNames,
        packages: &Packages,
        config: &CodeGenConfig,
    ) -> Result<Vec<PathBuf>, GormliftError> {
        let mut written = Vec::new();
        let file_name = format!("{}.gen.go", names.file);
        let model_ref = format!("{}.{}", packages.model, names.struct_name);

        let fields: Vec<_> = table
            .columns
            .iter()
            .map(|col| build_field(col, table, &config.fields))
            .collect();

        let code = self.render(
            "model",
            &names.raw,
            minijinja::context! {
                package => &packages.model,
                imports => collect_model_imports(&fields),
                table_name => &table.name,
                struct_name => &names.struct_name,
                comment => table.comment.as_deref().map(single_line),
                fields => fields.iter().map(|f| minijinja::context! {
                    name => &f.name,
                    go_type => &f.go_type,
                    tag => &f.tag,
                    comment => &f.comment,
                }).collect::<Vec<_>>(),
            },
        )?;
        written.push(write_source(&config.model_dir.join(&file_name), &code)?);

        let mode = &config.query_mode;
        let ret = if mode.query_interface {
            format!("I{}Do", names.struct_name)
        } else {
            format!("*{}", names.do_name)
        };
        let ctx = minijinja::context! {
            package => &packages.query,
            model_package => &packages.model,
            model_import => &packages.model_import,
            model => &model_ref,
            struct_name => &names.struct_name,
            var_name => &names.var_name,
            do_name => &names.do_name,
            ret => ret,
            without_context => mode.without_context,
            query_interface => mode.query_interface,
        };

        let code = self.render("query", &names.raw, ctx.clone())?;
        written.push(write_source(&config.query_dir.join(&file_name), &code)?);

        if config.unit_test {
            let code = self.render("query_test", &names.raw, ctx)?;
            let path = config.query_dir.join(format!("{}.gen_test.go", names.file));
            written.push(write_source(&path, &code)?);
        }

        debug!(table = ?names.raw, struct_name = ?names.struct_name, files = written.len(), "Generated table files");
        Ok(written)
    }

    /// Write gen.go (and its test) tying all query objects together
    fn generate_query_entry(
        &self,
        tables: &[TableNames],
        packages: &Packages,
        config: &CodeGenConfig,
    ) -> Result<Vec<PathBuf>, GormliftError> {
        let mut written = Vec::new();
        let ctx = minijinja::context! {
            package => &packages.query,
            default_query => config.query_mode.default_query,
            utc_timestamps => config.utc_timestamps,
            tables => tables.iter().map(|t| minijinja::context! {
                struct_name => &t.struct_name,
                var_name => &t.var_name,
            }).collect::<Vec<_>>(),
        };

        let code = self.render("gen", "gen", ctx.clone())?;
        written.push(write_source(&config.query_dir.join("gen.go"), &code)?);

        if config.unit_test {
            let code = self.render("gen_test", "gen", ctx)?;
            written.push(write_source(&config.query_dir.join("gen_test.go"), &code)?);
        }

        Ok(written)
    }

    fn render(
        &self,
        template_name: &str,
        table: &str,
        ctx: minijinja::Value,
    ) -> Result<String, GormliftError> {
        let template = self
            .env
            .get_template(template_name)
            .map_err(|e| GormliftError::CodeGen {
                table: table.to_string(),
                message: format!("Template error: {}", e),
            })?;

        template.render(ctx).map_err(|e| GormliftError::CodeGen {
            table: table.to_string(),
            message: format!("Render error: {}", e),
        })
    }
}

/// Reject tables whose Go identifiers collide with each other or with gen.go
fn check_identifiers(tables: &[TableNames]) -> Result<(), GormliftError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for names in tables {
        if RESERVED_QUERY_NAMES.contains(&names.struct_name.as_str()) {
            error!(table = ?names.raw, struct_name = ?names.struct_name, "Struct name is reserved");
            return Err(GormliftError::Naming(format!(
                "table '{}' generates '{}', which the query package already declares",
                names.raw, names.struct_name
            )));
        }

        if let Some(other) = seen.insert(names.struct_name.as_str(), names.raw.as_str()) {
            error!(first = ?other, second = ?names.raw, struct_name = ?names.struct_name, "Struct names collide");
            return Err(GormliftError::Naming(format!(
                "tables '{}' and '{}' both generate struct '{}'",
                other, names.raw, names.struct_name
            )));
        }
    }

    Ok(())
}

fn write_source(path: &Path, code: &str) -> Result<PathBuf, GormliftError> {
    fs::write(path, code).map_err(|e| {
        error!(path = ?path, error = ?e, "Failed to write generated file");
        GormliftError::Output(e)
    })?;
    debug!(path = ?path, "Wrote generated file");
    Ok(path.to_path_buf())
}

/// A rendered model field
struct Field {
    name: String,
    go_type: String,
    tag: String,
    comment: Option<String>,
}

fn build_field(col: &Column, table: &Table, options: &FieldOptions) -> Field {
    let is_pk = table.is_primary_key(col);
    let mut go_type = go_type(col);

    let pointer = go_type != "gorm.DeletedAt"
        && go_type != "[]byte"
        && ((options.nullable && col.is_nullable)
            || (options.coverable && col.has_default() && !is_pk && !col.is_auto_generated));
    if pointer {
        go_type.insert(0, '*');
    }

    Field {
        name: go_identifier(&col.name),
        go_type,
        tag: gorm_tag(col, is_pk, options),
        comment: col.comment.as_deref().map(single_line),
    }
}

/// Convert DataType to a Go type
fn go_type(col: &Column) -> String {
    if col.name == "deleted_at" && col.data_type.is_temporal() {
        return "gorm.DeletedAt".to_string();
    }

    match &col.data_type {
        DataType::SmallInt => "int16",
        DataType::Integer => "int32",
        DataType::BigInt => "int64",
        DataType::Boolean => "bool",
        DataType::Real => "float32",
        DataType::DoublePrecision | DataType::Numeric => "float64",
        DataType::Timestamp | DataType::TimestampTz | DataType::Date => "time.Time",
        DataType::Binary => "[]byte",
        DataType::Text
        | DataType::Varchar(_)
        | DataType::Char(_)
        | DataType::Time
        | DataType::TimeTz
        | DataType::Uuid
        | DataType::Json
        | DataType::JsonBinary
        | DataType::Array(_)
        | DataType::Enum(_) => "string",
    }
    .to_string()
}

/// Struct tag with gorm and json keys
fn gorm_tag(col: &Column, is_pk: bool, options: &FieldOptions) -> String {
    let mut parts = vec![format!("column:{}", col.name)];

    if options.type_tag {
        parts.push(format!("type:{}", col.db_type));
    }
    if is_pk {
        parts.push("primaryKey".to_string());
    }
    if col.is_auto_generated {
        parts.push("autoIncrement:true".to_string());
    }
    if !col.is_nullable {
        parts.push("not null".to_string());
    }
    // Sequence defaults are implied by autoIncrement
    if let Some(default) = col.default.as_deref().filter(|_| !col.is_auto_generated) {
        if is_tag_safe(default) {
            parts.push(format!("default:{}", default));
        }
    }
    if let Some(comment) = col.comment.as_deref().filter(|c| is_tag_safe(c)) {
        parts.push(format!("comment:{}", single_line(comment)));
    }

    format!(r#"gorm:"{}" json:"{}""#, parts.join(";"), col.name)
}

/// Values that can sit inside a backquoted gorm tag without escaping
fn is_tag_safe(value: &str) -> bool {
    !value.contains(['`', '"', ';'])
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_model_imports(fields: &[Field]) -> Vec<&'static str> {
    let mut imports = Vec::new();
    if fields.iter().any(|f| f.go_type.trim_start_matches('*') == "time.Time") {
        imports.push("time");
    }
    if fields.iter().any(|f| f.go_type == "gorm.DeletedAt") {
        imports.push("gorm.io/gorm");
    }
    imports
}

/// Exported Go identifier from a snake_case name, honoring initialisms
pub fn go_identifier(name: &str) -> String {
    let ident: String = name
        .split(|c: char| c == SEPARATOR || c == '-' || c == ' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let upper = word.to_uppercase();
            if INITIALISMS.contains(&upper.as_str()) {
                upper
            } else {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect();

    match ident.chars().next() {
        Some(first) if first.is_ascii_digit() => format!("T{}", ident),
        _ => ident,
    }
}
