//! Working set of plain tables: include list (or every table) minus excludes minus association tables.

use crate::config::GenerationConfig;
use crate::error::IntrospectionError;
use crate::introspect::SchemaSource;
use std::collections::HashSet;

/// Tables named by any association, as source or target.
pub fn association_tables(config: &GenerationConfig) -> HashSet<&str> {
    config
        .associations
        .iter()
        .flat_map(|a| [a.source_table.as_str(), a.target_table.as_str()])
        .collect()
}

/// Ordered, duplicate-free set of tables emitted as bare models before association handling.
pub async fn build(
    config: &GenerationConfig,
    source: &dyn SchemaSource,
) -> Result<Vec<String>, IntrospectionError> {
    let candidates = if config.include_tables.is_empty() {
        let tables = source.table_names().await?;
        tracing::info!(count = tables.len(), "introspected tables");
        tables
    } else {
        config.include_tables.clone()
    };

    let absorbed = association_tables(config);
    let mut seen = HashSet::new();
    let universe: Vec<String> = candidates
        .into_iter()
        .filter(|t| !config.exclude_tables.contains(t))
        .filter(|t| !absorbed.contains(t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect();
    tracing::debug!(tables = ?universe, "table universe");
    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{validate, ConfigLayer};
    use crate::introspect::{ColumnMeta, SchemaSnapshot};

    fn config(tables: &[&str], exclude: &[&str], associations: &[&str]) -> GenerationConfig {
        let owned = |v: &[&str]| Some(v.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        validate(ConfigLayer {
            dsn: Some("sqlite::memory:".into()),
            driver: Some("sqlite".into()),
            tables: owned(tables),
            exclude: owned(exclude),
            association: owned(associations),
            ..ConfigLayer::defaults()
        })
        .unwrap()
    }

    fn shop() -> SchemaSnapshot {
        let id = || vec![ColumnMeta::new("id", "bigint").primary_key()];
        SchemaSnapshot::new()
            .table("users", id())
            .table("schema_migrations", id())
            .table("orders", id())
    }

    #[tokio::test]
    async fn excludes_are_removed_from_introspected_tables() {
        let cfg = config(&[], &["schema_migrations"], &[]);
        assert_eq!(build(&cfg, &shop()).await.unwrap(), vec!["users", "orders"]);
    }

    #[tokio::test]
    async fn include_list_skips_introspection() {
        let cfg = config(&["orders", "ghosts"], &[], &[]);
        assert_eq!(
            build(&cfg, &SchemaSnapshot::new()).await.unwrap(),
            vec!["orders", "ghosts"]
        );
    }

    #[tokio::test]
    async fn association_tables_leave_the_plain_set() {
        let cfg = config(
            &[],
            &["schema_migrations"],
            &["orders|users|User|belongs_to|foreignKey:UserID"],
        );
        assert!(build(&cfg, &shop()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_snapshot_same_universe() {
        let cfg = config(&[], &["schema_migrations"], &[]);
        let first = build(&cfg, &shop()).await.unwrap();
        let second = build(&cfg, &shop()).await.unwrap();
        assert_eq!(first, second);
    }
}
