use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gormlift::codegen::CodeGenConfig;
use gormlift::config::{split_list, DbScheme, DbSource, GenerationConfig};
use gormlift::driver::RunReport;

#[derive(Parser, Debug)]
#[command(name = "gormlift")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database source as scheme://path (falls back to DB_SOURCE)
    #[arg(long)]
    dbsrc: Option<String>,

    /// Output directory for generated query code
    #[arg(long, default_value = "./query")]
    query_dir: PathBuf,

    /// Output directory for generated models
    #[arg(long, default_value = "./model")]
    model_dir: PathBuf,

    /// Comma-separated list of tables to generate (default: all)
    #[arg(long, default_value = "")]
    tables: String,

    /// Comma-separated list of tables to skip
    #[arg(long, default_value = "")]
    tables_ex: String,

    /// Prefix stripped from table names
    #[arg(long, default_value = "")]
    table_prefix: String,

    /// Clear the output directories before generating
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    clear: bool,

    /// Database schema to introspect
    #[arg(long, default_value = "public")]
    schema: String,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Patterns written to each output directory's .gitignore
    #[arg(long, value_delimiter = ',', default_value = "*_test.db")]
    ignore: Vec<String>,

    /// Keep the cgo SQLite driver in generated tests
    #[arg(long)]
    no_rewrite: bool,

    /// Do not generate query tests
    #[arg(long)]
    without_unit_test: bool,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("gormlift v{}", env!("CARGO_PKG_VERSION"));

    let source = DbSource::load(cli.dbsrc.as_deref(), &cli.env_file)
        .context("Failed to resolve database source")?;
    debug!(source = ?source.redacted(), "Resolved database source");

    let codegen = CodeGenConfig::new(&cli.model_dir, &cli.query_dir)
        .with_unit_test(!cli.without_unit_test);
    let mut config = GenerationConfig::new(codegen)
        .with_table_prefix(&cli.table_prefix)
        .with_tables(split_list(&cli.tables))
        .with_tables_ex(split_list(&cli.tables_ex))
        .with_clear(cli.clear)
        .with_ignore_patterns(cli.ignore.iter().flat_map(|p| split_list(p)).collect());
    if cli.no_rewrite {
        config = config.with_rewrite(None);
    }
    debug!(config = ?config, "Generation config");

    let report = match source.scheme {
        DbScheme::Postgres => generate_postgres(&source, &cli.schema, &config)?,
        DbScheme::Mysql | DbScheme::Sqlite => bail!(
            "{} sources are recognized but have no introspector yet: {}",
            source.scheme.name(),
            source.redacted()
        ),
    };

    summarize(&report);
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn summarize(report: &RunReport) {
    for spec in report.included() {
        if let Some(output) = &spec.output {
            info!(table = ?spec.raw_name, name = ?output.name, "Generated table");
        }
    }

    for warning in &report.warnings {
        warn!(target_path = ?warning.target, "{}", warning.message);
    }

    info!(
        tables = report.included().count(),
        files = report.files.len(),
        rewritten = report.rewritten.len(),
        warnings = report.warnings.len(),
        "Code generation complete"
    );
}

#[cfg(feature = "postgres")]
fn generate_postgres(
    source: &DbSource,
    schema_name: &str,
    config: &GenerationConfig,
) -> Result<RunReport> {
    use gormlift::codegen::GoGenerator;
    use gormlift::error::GormliftError;
    use gormlift::{driver, PostgresIntrospector};
    use postgres::NoTls;

    info!(source = ?source.redacted(), "Connecting to PostgreSQL");

    let mut client = postgres::Client::connect(&source.postgres_connection_string(), NoTls)
        .map_err(|e| {
            error!(source = ?source.redacted(), error = ?e, "Failed to connect");
            GormliftError::Connection(format!("{}: {}", source.redacted(), e))
        })?;

    info!("Connected to database");

    let mut introspector = PostgresIntrospector::new(&mut client, schema_name);
    let generator = GoGenerator::new();
    let report = driver::run(&mut introspector, &generator, config)
        .context("Generation failed; re-run with --clear true to discard partial output")?;

    Ok(report)
}

#[cfg(not(feature = "postgres"))]
fn generate_postgres(
    _source: &DbSource,
    _schema_name: &str,
    _config: &GenerationConfig,
) -> Result<RunReport> {
    bail!("PostgreSQL support not enabled. Rebuild with --features postgres")
}
