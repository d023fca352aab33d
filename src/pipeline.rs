//! One generation run: connect, build the table set, resolve relations, emit.

use crate::association::{self, partition};
use crate::config::GenerationConfig;
use crate::connection::open_kind;
use crate::emit::{ModelEmitter, RustEmitter};
use crate::error::GenError;
use crate::introspect::SchemaSource;
use crate::model::{resolve_table, ResolvedTableModel};
use crate::tag::TagPolicy;
use crate::universe;
use std::path::PathBuf;

/// What a successful run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub model_path: PathBuf,
    /// `None` when only models were generated.
    pub query_file: Option<PathBuf>,
    /// Emitted tables in emission order.
    pub tables: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Resolve every table model without writing anything.
pub async fn resolve_models(
    config: &GenerationConfig,
    source: &dyn SchemaSource,
) -> Result<Vec<ResolvedTableModel>, GenError> {
    for table in universe::association_tables(config) {
        if config.exclude_tables.contains(table) {
            tracing::warn!(table, "table is excluded but named by an association; association wins");
        }
    }

    let plain = universe::build(config, source).await?;
    let plan = association::resolve(&config.associations);
    for (table, field) in plan.duplicate_fields() {
        tracing::warn!(%table, %field, "relation field declared more than once");
    }
    let buckets = partition(&plain, &plan);
    tracing::info!(
        tables = buckets.len(),
        relation_sources = plan.sources.len(),
        "resolved table set"
    );

    let tags = TagPolicy::new(&config.string_tags);
    let mut models = Vec::with_capacity(buckets.len());
    for (table, bucket) in buckets {
        let columns = source.columns(&table).await?;
        tracing::debug!(%table, ?bucket, columns = columns.len(), "model");
        models.push(resolve_table(&table, bucket, columns, &plan, &tags));
    }
    Ok(models)
}

/// Resolve and emit against any schema source and backend.
pub async fn generate(
    config: &GenerationConfig,
    source: &dyn SchemaSource,
    emitter: &dyn ModelEmitter,
) -> Result<RunReport, GenError> {
    let models = resolve_models(config, source).await?;
    let files = emitter.emit(config, &models)?;
    Ok(RunReport {
        model_path: config.output.model_path.clone(),
        query_file: (!config.fields.only_model).then(|| config.output.query_file_path()),
        tables: models.into_iter().map(|m| m.table_name).collect(),
        files,
    })
}

/// Full run against the configured database with the Rust backend.
pub async fn run(config: &GenerationConfig) -> Result<RunReport, GenError> {
    let conn = open_kind(config.driver, &config.dsn).await?;
    let result = generate(config, &conn, &RustEmitter).await;
    conn.close().await;
    result
}
