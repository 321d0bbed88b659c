//! End-to-end generation runs against an in-memory schema.

use std::fs;
use std::path::Path;

use gormlift::prelude::*;
use tempfile::TempDir;

/// Introspector serving a fixed set of tables
struct MemoryIntrospector {
    tables: Vec<Table>,
    /// Table whose description fails
    broken: Option<String>,
}

impl MemoryIntrospector {
    fn with_tables(names: &[&str]) -> Self {
        Self {
            tables: names.iter().map(|name| table(name)).collect(),
            broken: None,
        }
    }
}

impl Introspector for MemoryIntrospector {
    fn table_names(&mut self) -> Result<Vec<String>, GormliftError> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    fn describe_table(&mut self, table_name: &str) -> Result<Table, GormliftError> {
        if self.broken.as_deref() == Some(table_name) {
            return Err(GormliftError::Introspection {
                schema: "memory".to_string(),
                message: format!("Failed to query columns for table '{}'", table_name),
            });
        }
        self.tables
            .iter()
            .find(|t| t.name == table_name)
            .cloned()
            .ok_or_else(|| GormliftError::Introspection {
                schema: "memory".to_string(),
                message: format!("Table '{}' does not exist", table_name),
            })
    }
}

fn table(name: &str) -> Table {
    Table {
        name: name.to_string(),
        columns: vec![
            Column {
                name: "id".to_string(),
                data_type: DataType::BigInt,
                db_type: "bigint".to_string(),
                is_nullable: false,
                default: Some(format!("nextval('{}_id_seq'::regclass)", name)),
                is_auto_generated: true,
                comment: None,
            },
            Column {
                name: "created_at".to_string(),
                data_type: DataType::TimestampTz,
                db_type: "timestamp with time zone".to_string(),
                is_nullable: true,
                default: Some("now()".to_string()),
                is_auto_generated: false,
                comment: Some("creation time".to_string()),
            },
        ],
        primary_key: vec!["id".to_string()],
        comment: None,
    }
}

fn config(temp: &TempDir) -> GenerationConfig {
    GenerationConfig::new(CodeGenConfig::new(
        temp.path().join("model"),
        temp.path().join("query"),
    ))
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn generates_all_tables_except_denied() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["app_user", "app_order", "log_raw"]);
    let config = config(&temp)
        .with_table_prefix("app_")
        .with_tables_ex(vec!["log_raw".to_string()]);

    let report = run(&mut introspector, &GoGenerator::new(), &config).unwrap();

    let names: Vec<_> = report
        .included()
        .map(|t| t.output.as_ref().unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["user", "order"]);
    assert!(report.warnings.is_empty());

    let model = temp.path().join("model");
    let query = temp.path().join("query");
    assert!(model.join("user.gen.go").exists());
    assert!(model.join("order.gen.go").exists());
    assert!(!model.join("log_raw.gen.go").exists());
    assert!(query.join("user.gen.go").exists());
    assert!(query.join("order.gen_test.go").exists());

    let user = read(model.join("user.gen.go"));
    assert!(user.contains("const TableNameUser = \"app_user\""));
    assert!(user.contains("\tID int64 `gorm:\"column:id;type:bigint;primaryKey;autoIncrement:true;not null\" json:\"id\"`\n"));
    assert!(user.contains("\tCreatedAt *time.Time"));
    assert!(user.contains("\t\"time\"\n"));

    let gen = read(query.join("gen.go"));
    assert!(gen.contains("\t\tUser: newUser(db),\n"));
    assert!(gen.contains("\t\tOrder: newOrder(db),\n"));
    assert!(!gen.contains("LogRaw"));
}

#[test]
fn writes_ignore_manifests_and_rewrites_test_imports() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["users"]);
    let config = config(&temp);

    let report = run(&mut introspector, &GoGenerator::new(), &config).unwrap();

    for dir in ["model", "query"] {
        assert_eq!(read(temp.path().join(dir).join(".gitignore")), "*_test.db\n");
    }

    let gen_test = temp.path().join("query").join("gen_test.go");
    let content = read(&gen_test);
    assert!(content.contains("\t\"github.com/glebarez/sqlite\"\n"));
    assert!(!content.contains("gorm.io/driver/sqlite"));
    assert!(content.contains("time.Now().UTC()"));
    assert_eq!(report.rewritten, vec![gen_test]);
}

#[test]
fn rewrite_can_be_disabled() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["users"]);
    let config = config(&temp).with_rewrite(None);

    let report = run(&mut introspector, &GoGenerator::new(), &config).unwrap();

    assert!(report.rewritten.is_empty());
    assert!(read(temp.path().join("query").join("gen_test.go")).contains("\"gorm.io/driver/sqlite\""));
}

#[test]
fn allow_list_limits_generation_and_reports_missing_tables() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["app_user", "app_order", "app_audit"]);
    let config = config(&temp)
        .with_table_prefix("app")
        .with_tables(vec![
            "app_order".to_string(),
            "app_missing".to_string(),
            "app_audit".to_string(),
        ])
        .with_tables_ex(vec!["app_audit".to_string()]);

    let report = run(&mut introspector, &GoGenerator::new(), &config).unwrap();

    let included: Vec<_> = report.included().map(|t| t.raw_name.as_str()).collect();
    assert_eq!(included, vec!["app_order"]);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].target, "app_missing");

    let model = temp.path().join("model");
    assert!(model.join("order.gen.go").exists());
    assert!(!model.join("user.gen.go").exists());
    assert!(!model.join("audit.gen.go").exists());
}

#[test]
fn unprefixed_lookalike_keeps_its_name() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["appuser", "app_user"]);
    let config = config(&temp).with_table_prefix("app");

    run(&mut introspector, &GoGenerator::new(), &config).unwrap();

    let model = temp.path().join("model");
    assert!(model.join("appuser.gen.go").exists());
    assert!(model.join("user.gen.go").exists());
}

#[test]
fn naming_conflict_aborts_before_generation() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["app_user", "user"]);
    let config = config(&temp).with_table_prefix("app_");

    let err = run(&mut introspector, &GoGenerator::new(), &config).unwrap_err();

    assert!(matches!(err, GormliftError::Naming(_)));
    let model = temp.path().join("model");
    assert!(model.is_dir());
    assert_eq!(fs::read_dir(&model).unwrap().count(), 0);
}

#[test]
fn colliding_go_struct_names_abort_before_generation() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["user_name", "user__name"]);

    let err = run(&mut introspector, &GoGenerator::new(), &config(&temp)).unwrap_err();

    assert!(matches!(err, GormliftError::Naming(_)));
    assert!(err.to_string().contains("UserName"));
    assert_eq!(fs::read_dir(temp.path().join("model")).unwrap().count(), 0);
    assert!(!temp.path().join("query").join("gen.go").exists());
}

#[test]
fn tables_named_like_query_package_declarations_are_rejected() {
    for tables in [&["query"][..], &["use"][..], &["q"][..], &["set_default"][..]] {
        let temp = TempDir::new().unwrap();
        let mut introspector = MemoryIntrospector::with_tables(tables);

        let err = run(&mut introspector, &GoGenerator::new(), &config(&temp)).unwrap_err();

        assert!(matches!(err, GormliftError::Naming(_)), "{:?}", tables);
        assert!(!temp.path().join("query").join("gen.go").exists());
    }
}

#[test]
fn clear_controls_stale_output() {
    let temp = TempDir::new().unwrap();
    let stale = temp.path().join("model").join("stale.gen.go");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "package model").unwrap();

    let mut introspector = MemoryIntrospector::with_tables(&["users"]);
    run(&mut introspector, &GoGenerator::new(), &config(&temp).with_clear(false)).unwrap();
    assert!(stale.exists());

    run(&mut introspector, &GoGenerator::new(), &config(&temp)).unwrap();
    assert!(!stale.exists());
    assert!(temp.path().join("model").join("users.gen.go").exists());
}

#[test]
fn generator_failures_are_fatal() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["accounts", "users"]);
    introspector.broken = Some("users".to_string());

    let err = run(&mut introspector, &GoGenerator::new(), &config(&temp)).unwrap_err();

    assert!(matches!(err, GormliftError::Introspection { .. }));
    // Earlier tables stay on disk; no finishing passes ran
    let model = temp.path().join("model");
    assert!(model.join("accounts.gen.go").exists());
    assert!(!model.join(".gitignore").exists());
}

#[test]
fn blocked_output_tree_is_fatal() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("query"), "not a directory").unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["users"]);

    let err = run(&mut introspector, &GoGenerator::new(), &config(&temp).with_clear(false))
        .unwrap_err();

    assert!(matches!(err, GormliftError::Output(_)));
}

#[test]
fn without_unit_tests_emits_no_test_files() {
    let temp = TempDir::new().unwrap();
    let mut introspector = MemoryIntrospector::with_tables(&["users"]);
    let config = GenerationConfig::new(
        CodeGenConfig::new(temp.path().join("model"), temp.path().join("query"))
            .with_unit_test(false),
    );

    let report = run(&mut introspector, &GoGenerator::new(), &config).unwrap();

    assert!(report.rewritten.is_empty());
    assert!(report
        .files
        .iter()
        .all(|f| !f.to_string_lossy().ends_with("_test.go")));
    assert!(temp.path().join("query").join("gen.go").exists());
}
