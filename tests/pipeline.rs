//! End-to-end pipeline behaviour against in-memory schemas and a throwaway SQLite file.

use modelgen::config::{resolve, validate, ConfigLayer, Overlay};
use modelgen::pipeline::resolve_models;
use modelgen::{
    generate, Bucket, ColumnMeta, ConfigError, EmitError, GenError, GenerationConfig,
    ModelEmitter, ResolvedTableModel, RustEmitter, SchemaSnapshot,
};
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;

fn list(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

fn config(associations: &[&str], string_tags: &[&str]) -> GenerationConfig {
    validate(ConfigLayer {
        dsn: Some("sqlite::memory:".into()),
        driver: Some("sqlite".into()),
        association: list(associations),
        field_with_string_tag: list(string_tags),
        ..ConfigLayer::defaults()
    })
    .unwrap()
}

fn id() -> ColumnMeta {
    ColumnMeta::new("id", "bigint").primary_key()
}

fn shop() -> SchemaSnapshot {
    SchemaSnapshot::new()
        .table("users", vec![id(), ColumnMeta::new("name", "varchar")])
        .table("schema_migrations", vec![ColumnMeta::new("version", "varchar").primary_key()])
        .table(
            "orders",
            vec![
                id(),
                ColumnMeta::new("user_id", "bigint"),
                ColumnMeta::new("total", "decimal"),
            ],
        )
        .table("order_items", vec![id(), ColumnMeta::new("order_id", "bigint")])
        .table("products", vec![id(), ColumnMeta::new("sku", "varchar")])
}

/// Captures what would be written.
#[derive(Default)]
struct Recorder {
    models: RefCell<Vec<ResolvedTableModel>>,
}

impl ModelEmitter for Recorder {
    fn emit(
        &self,
        _config: &GenerationConfig,
        models: &[ResolvedTableModel],
    ) -> Result<Vec<PathBuf>, EmitError> {
        self.models.borrow_mut().extend_from_slice(models);
        Ok(Vec::new())
    }
}

fn bucket_of(models: &[ResolvedTableModel], table: &str) -> Option<Bucket> {
    models.iter().find(|m| m.table_name == table).map(|m| {
        if m.is_association_source {
            Bucket::RelationSource
        } else {
            Bucket::Bare
        }
    })
}

#[tokio::test]
async fn excluded_migrations_table_is_dropped() {
    let report = generate(&config(&[], &[]), &shop(), &Recorder::default())
        .await
        .unwrap();
    assert_eq!(report.tables, vec!["users", "orders", "order_items", "products"]);
}

#[tokio::test]
async fn belongs_to_source_gets_field_and_target_is_bare() {
    let cfg = config(&["orders|users|User|belongs_to|foreignKey:UserID"], &[]);
    let models = resolve_models(&cfg, &shop()).await.unwrap();

    let orders = models.iter().find(|m| m.table_name == "orders").unwrap();
    assert!(orders.is_association_source);
    assert_eq!(orders.relations.len(), 1);
    assert_eq!(orders.relations[0].relation.field_name, "User");
    assert_eq!(bucket_of(&models, "users"), Some(Bucket::Bare));
    assert_eq!(models.iter().filter(|m| m.table_name == "users").count(), 1);
}

#[tokio::test]
async fn primary_key_is_string_encoded_without_rules() {
    let models = resolve_models(&config(&[], &[]), &shop()).await.unwrap();
    let users = models.iter().find(|m| m.table_name == "users").unwrap();
    assert_eq!(users.fields[0].tag.to_string(), "id,string");
    assert_eq!(users.fields[1].tag.to_string(), "name");
}

#[tokio::test]
async fn relation_fields_accumulate_in_declaration_order() {
    let cfg = config(
        &[
            "orders|users|User|belongs_to|foreignKey:UserID",
            "orders|order_items|Items|has_many|foreignKey:OrderID",
        ],
        &["orders|user_id"],
    );
    let models = resolve_models(&cfg, &shop()).await.unwrap();
    let orders = models.iter().find(|m| m.table_name == "orders").unwrap();
    let names: Vec<_> = orders
        .relations
        .iter()
        .map(|r| r.relation.field_name.as_str())
        .collect();
    assert_eq!(names, vec!["User", "Items"]);
    assert_eq!(orders.fields[1].tag.to_string(), "userId,string");
}

#[tokio::test]
async fn untouched_table_stays_bare_and_each_table_is_emitted_once() {
    let cfg = config(
        &[
            "orders|users|User|belongs_to|foreignKey:UserID",
            "users|orders|Orders|has_many|foreignKey:UserID",
        ],
        &[],
    );
    let models = resolve_models(&cfg, &shop()).await.unwrap();
    let mut names: Vec<_> = models.iter().map(|m| m.table_name.clone()).collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total);
    assert_eq!(bucket_of(&models, "products"), Some(Bucket::Bare));
    assert_eq!(bucket_of(&models, "users"), Some(Bucket::RelationSource));
    assert_eq!(bucket_of(&models, "orders"), Some(Bucket::RelationSource));
}

#[tokio::test]
async fn identical_inputs_give_identical_table_order() {
    let cfg = config(&["orders|users|User|belongs_to|foreignKey:UserID"], &[]);
    let first = generate(&cfg, &shop(), &Recorder::default()).await.unwrap();
    let second = generate(&cfg, &shop(), &Recorder::default()).await.unwrap();
    assert_eq!(first.tables, second.tables);
    assert_eq!(first.tables, vec!["orders", "order_items", "products", "users"]);
}

#[tokio::test]
async fn association_wins_over_exclusion() {
    let cfg = validate(ConfigLayer {
        dsn: Some("sqlite::memory:".into()),
        driver: Some("sqlite".into()),
        exclude: list(&["schema_migrations", "users"]),
        association: list(&["orders|users|User|belongs_to|foreignKey:UserID"]),
        ..ConfigLayer::defaults()
    })
    .unwrap();
    let models = resolve_models(&cfg, &shop()).await.unwrap();
    assert_eq!(bucket_of(&models, "users"), Some(Bucket::Bare));
    assert_eq!(bucket_of(&models, "orders"), Some(Bucket::RelationSource));
}

#[tokio::test]
async fn missing_table_aborts_the_run() {
    let cfg = config(&["orders|ghosts|Ghost|has_one|foreignKey:GhostID"], &[]);
    let err = generate(&cfg, &shop(), &Recorder::default()).await.unwrap_err();
    assert!(err.to_string().contains("ghosts"));
}

#[tokio::test]
async fn duplicate_relation_field_is_refused_by_the_rust_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(
        &[
            "orders|users|User|belongs_to|foreignKey:UserID",
            "orders|users|User|has_one|foreignKey:BuyerID",
        ],
        &[],
    );
    cfg.output.model_path = dir.path().join("model");
    cfg.output.query_path = dir.path().join("query");

    let recorder = Recorder::default();
    generate(&cfg, &shop(), &recorder).await.unwrap();
    let orders_relations = recorder
        .models
        .borrow()
        .iter()
        .find(|m| m.table_name == "orders")
        .map(|m| m.relations.len());
    assert_eq!(orders_relations, Some(2));

    let err = generate(&cfg, &shop(), &RustEmitter).await.unwrap_err();
    assert!(matches!(
        err,
        GenError::Emit(EmitError::DuplicateField { ref table, ref field }) if table == "orders" && field == "User"
    ));
    assert!(!cfg.output.model_path.exists());
}

#[tokio::test]
async fn identical_association_tokens_are_not_collapsed() {
    let dir = tempfile::tempdir().unwrap();
    let token = "orders|users|User|belongs_to|foreignKey:UserID";
    let mut cfg = config(&[token, token], &[]);
    assert_eq!(cfg.associations.len(), 2);
    cfg.output.model_path = dir.path().join("model");
    cfg.output.query_path = dir.path().join("query");

    let models = resolve_models(&cfg, &shop()).await.unwrap();
    let orders = models.iter().find(|m| m.table_name == "orders").unwrap();
    assert_eq!(orders.relations.len(), 2);

    let err = generate(&cfg, &shop(), &RustEmitter).await.unwrap_err();
    assert!(matches!(
        err,
        GenError::Emit(EmitError::DuplicateField { ref table, ref field }) if table == "orders" && field == "User"
    ));
    assert!(!cfg.output.model_path.exists());
}

#[test]
fn malformed_overlay_token_fails_during_resolve() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "gen:\n  dsn: postgres://nowhere.invalid/db\n  driver: postgres\n  association:\n    - orders|users|User|owns|foreignKey:UserID\n"
    )
    .unwrap();

    let err = resolve(ConfigLayer::default(), &Overlay::Explicit(file.path().to_path_buf())).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidRelationKind { ref token, ref kind }
            if token == "orders|users|User|owns|foreignKey:UserID" && kind == "owns"
    ));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "gen:\n  dsn: postgres://nowhere.invalid/db\n  association: orders|users|User\n"
    )
    .unwrap();
    let err = resolve(ConfigLayer::default(), &Overlay::Explicit(file.path().to_path_buf())).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidAssociation { ref token } if token == "orders|users|User"));
    assert!(err.to_string().contains("orders|users|User"));
}

#[test]
fn malformed_tokens_fail_before_any_connection() {
    let layer = ConfigLayer {
        dsn: Some("postgres://nowhere.invalid/db".into()),
        driver: Some("postgres".into()),
        association: list(&["orders|users|User"]),
        ..ConfigLayer::defaults()
    };
    let err = validate(layer).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidAssociation { .. }));

    let layer = ConfigLayer {
        dsn: Some("postgres://nowhere.invalid/db".into()),
        driver: Some("postgres".into()),
        field_with_string_tag: list(&["users"]),
        ..ConfigLayer::defaults()
    };
    assert!(matches!(
        validate(layer),
        Err(ConfigError::InvalidStringTag { .. })
    ));
}

#[tokio::test]
async fn generates_from_a_sqlite_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shop.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .unwrap();
    for ddl in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL, deleted_at DATETIME)",
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, total DECIMAL(10,2))",
        "CREATE TABLE schema_migrations (version TEXT PRIMARY KEY)",
    ] {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }
    pool.close().await;

    let mut cfg = validate(ConfigLayer {
        dsn: Some(db_path.display().to_string()),
        driver: Some("sqlite".into()),
        association: list(&["orders|users|User|belongs_to|foreignKey:UserID"]),
        field_nullable: Some(true),
        ..ConfigLayer::defaults()
    })
    .unwrap();
    cfg.output.model_path = dir.path().join("src/data/model");
    cfg.output.query_path = dir.path().join("src/data/query");

    let report = modelgen::run(&cfg).await.unwrap();
    assert_eq!(report.tables, vec!["orders", "users"]);
    assert_eq!(report.query_file, Some(cfg.output.query_file_path()));

    let orders = std::fs::read_to_string(cfg.output.model_path.join("orders.rs")).unwrap();
    assert!(orders.contains("pub total: Option<rust_decimal::Decimal>,"));
    assert!(orders.contains("pub user: Option<Box<super::Users>>,"));
    let queries = std::fs::read_to_string(cfg.output.query_file_path()).unwrap();
    assert!(queries.contains(r#"WHERE "id" = ? AND "deleted_at" IS NULL"#));
    assert!(queries.contains("crate::data::model::Users"));
}
