//! Command-line entry point: flags -> config -> one generation run.

use clap::Parser;
use modelgen::config::{resolve, ConfigLayer, Overlay, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Generate model and query code from a database schema.
#[derive(Parser, Debug)]
#[command(name = "modelgen", version)]
struct Args {
    /// Overlay config file (YAML, keys under `gen:`). Defaults to configs/gen.yml when present.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
    /// Connection string for the target database.
    #[arg(long, env = "MODELGEN_DSN")]
    dsn: Option<String>,
    /// mysql | postgres | sqlite | sqlserver | clickhouse
    #[arg(long = "db")]
    driver: Option<String>,
    /// Tables to generate; all tables when empty.
    #[arg(short = 't', long, value_delimiter = ',')]
    tables: Option<Vec<String>>,
    /// Tables to skip.
    #[arg(short = 'e', long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,
    /// Relation declaration `source|target|Field|kind|key:value`, e.g. "user|role|Role|has_one|foreignKey:RoleID".
    #[arg(short = 'a', long, value_delimiter = ',')]
    association: Option<Vec<String>>,
    /// Numeric columns serialized as text: `table|col[|col...]`.
    #[arg(short = 's', long = "field-with-string-tag", value_delimiter = ',')]
    field_with_string_tag: Option<Vec<String>>,
    /// Directory for generated models.
    #[arg(short = 'm', long = "model-path")]
    model_path: Option<PathBuf>,
    /// Directory for generated query code.
    #[arg(short = 'p', long = "query-path")]
    query_path: Option<PathBuf>,
    /// File name of the query code.
    #[arg(long = "query-file")]
    query_file: Option<String>,
    /// Module path the query code imports models from; derived from --model-path when unset.
    #[arg(long = "model-pkg")]
    model_pkg: Option<String>,
    /// Only generate models (no query file).
    #[arg(short = 'o', long = "only-model", num_args = 0..=1, default_missing_value = "true")]
    only_model: Option<bool>,
    /// Add a unit-test module to the query file.
    #[arg(long = "with-unit-test", num_args = 0..=1, default_missing_value = "true")]
    with_unit_test: Option<bool>,
    /// Nullable columns become Option<T>.
    #[arg(long = "field-nullable", num_args = 0..=1, default_missing_value = "true")]
    field_nullable: Option<bool>,
    /// Document index membership on fields.
    #[arg(long = "field-with-index-tag", num_args = 0..=1, default_missing_value = "true")]
    field_with_index_tag: Option<bool>,
    /// Document the column type on fields.
    #[arg(long = "field-with-type-tag", num_args = 0..=1, default_missing_value = "true")]
    field_with_type_tag: Option<bool>,
    /// Map unsigned integer columns to unsigned Rust integers.
    #[arg(long = "field-signable", num_args = 0..=1, default_missing_value = "true")]
    field_signable: Option<bool>,
}

impl Args {
    fn overlay(&self) -> Overlay {
        match &self.config {
            Some(path) => Overlay::Explicit(path.clone()),
            None => Overlay::Default(PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }

    fn into_layer(self) -> ConfigLayer {
        ConfigLayer {
            dsn: self.dsn,
            driver: self.driver,
            tables: self.tables,
            exclude: self.exclude,
            association: self.association,
            field_with_string_tag: self.field_with_string_tag,
            model_path: self.model_path,
            query_path: self.query_path,
            query_file: self.query_file,
            model_pkg: self.model_pkg,
            only_model: self.only_model,
            with_unit_test: self.with_unit_test,
            field_nullable: self.field_nullable,
            field_with_index_tag: self.field_with_index_tag,
            field_with_type_tag: self.field_with_type_tag,
            field_signable: self.field_signable,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modelgen=info")),
        )
        .init();

    let args = Args::parse();
    let overlay = args.overlay();
    let config = resolve(args.into_layer(), &overlay).map_err(|e| {
        tracing::error!("parse config failed: {}", e);
        e
    })?;

    let report = modelgen::run(&config).await.map_err(|e| {
        tracing::error!("generate failed: {}", e);
        e
    })?;

    println!("generated {} models", report.tables.len());
    println!("model path {}", report.model_path.display());
    if let Some(query) = &report.query_file {
        println!("query file {}", query.display());
    }
    Ok(())
}
