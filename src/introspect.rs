//! Read table and column metadata from the connected database.

use crate::connection::{Connection, DbPool};
use crate::error::IntrospectionError;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Index a column takes part in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexMeta {
    pub name: String,
    pub unique: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    /// Base type name, lowercase, without length or modifiers (e.g. "decimal", "int8").
    pub data_type: String,
    /// Full column type as the database reports it (e.g. "bigint(20) unsigned").
    pub column_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub indexes: Vec<IndexMeta>,
    pub comment: Option<String>,
}

impl ColumnMeta {
    pub fn new(name: &str, data_type: &str) -> Self {
        ColumnMeta {
            name: name.to_string(),
            data_type: data_type.to_lowercase(),
            column_type: data_type.to_lowercase(),
            nullable: false,
            primary_key: false,
            indexes: Vec::new(),
            comment: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn column_type(mut self, full: &str) -> Self {
        self.column_type = full.to_lowercase();
        self
    }

    pub fn index(mut self, name: &str, unique: bool) -> Self {
        self.indexes.push(IndexMeta {
            name: name.to_string(),
            unique,
        });
        self
    }

    pub fn is_unsigned(&self) -> bool {
        self.column_type.contains("unsigned")
    }
}

/// Where table and column metadata come from.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// All base tables, in the order the source returns them.
    async fn table_names(&self) -> Result<Vec<String>, IntrospectionError>;

    /// Columns of `table` in ordinal order. Unknown tables are an error.
    async fn columns(&self, table: &str) -> Result<Vec<ColumnMeta>, IntrospectionError>;
}

/// Fixed in-memory schema. Same snapshot, same answers.
#[derive(Clone, Debug, Default)]
pub struct SchemaSnapshot {
    tables: Vec<(String, Vec<ColumnMeta>)>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        SchemaSnapshot::default()
    }

    pub fn table(mut self, name: &str, columns: Vec<ColumnMeta>) -> Self {
        self.tables.push((name.to_string(), columns));
        self
    }
}

#[async_trait]
impl SchemaSource for SchemaSnapshot {
    async fn table_names(&self) -> Result<Vec<String>, IntrospectionError> {
        Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnMeta>, IntrospectionError> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, cols)| cols.clone())
            .ok_or_else(|| IntrospectionError::UnknownTable(table.to_string()))
    }
}

const MYSQL_TABLES: &str = "SELECT CAST(TABLE_NAME AS CHAR) FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME";
const MYSQL_COLUMNS: &str = "SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR), \
     CAST(COLUMN_TYPE AS CHAR), CAST(IS_NULLABLE AS CHAR), CAST(COLUMN_KEY AS CHAR), \
     CAST(COLUMN_COMMENT AS CHAR) FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION";
const MYSQL_INDEXES: &str = "SELECT CAST(INDEX_NAME AS CHAR), CAST(COLUMN_NAME AS CHAR), \
     CAST(NON_UNIQUE AS SIGNED) FROM information_schema.STATISTICS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY INDEX_NAME, SEQ_IN_INDEX";

const PG_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' ORDER BY table_name";
const PG_COLUMNS: &str = "SELECT c.column_name::text, c.udt_name::text, c.data_type::text, \
     c.is_nullable::text, col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, \
     c.ordinal_position::int) FROM information_schema.columns c \
     WHERE c.table_schema = current_schema() AND c.table_name = $1 ORDER BY c.ordinal_position";
const PG_INDEXES: &str = "SELECT ic.relname::text, a.attname::text, i.indisunique, i.indisprimary \
     FROM pg_index i JOIN pg_class ic ON ic.oid = i.indexrelid \
     JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
     WHERE i.indrelid = format('%I.%I', current_schema(), $1::text)::regclass ORDER BY ic.relname";

const SQLITE_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
const SQLITE_COLUMNS: &str = "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid";
const SQLITE_INDEXES: &str = "SELECT il.name, ii.name, il.\"unique\" \
     FROM pragma_index_list(?1) il JOIN pragma_index_info(il.name) ii ORDER BY il.name, ii.seqno";

/// Strip length/precision and modifiers: "DECIMAL(10,2) UNSIGNED" -> "decimal".
fn base_type(full: &str) -> String {
    full.split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Attach index membership (column -> indexes) to each column.
fn attach_indexes(columns: &mut [ColumnMeta], by_column: BTreeMap<String, Vec<IndexMeta>>) {
    for col in columns.iter_mut() {
        if let Some(indexes) = by_column.get(&col.name) {
            col.indexes = indexes.clone();
        }
    }
}

impl Connection {
    async fn mysql_columns(
        pool: &sqlx::MySqlPool,
        table: &str,
    ) -> Result<Vec<ColumnMeta>, sqlx::Error> {
        tracing::debug!(sql = MYSQL_COLUMNS, table, "query");
        let rows = sqlx::query_as::<_, (String, String, String, String, String, Option<String>)>(
            MYSQL_COLUMNS,
        )
        .bind(table)
        .fetch_all(pool)
        .await?;
        let mut columns: Vec<ColumnMeta> = rows
            .into_iter()
            .map(|(name, data_type, column_type, nullable, key, comment)| ColumnMeta {
                name,
                data_type: data_type.to_lowercase(),
                column_type: column_type.to_lowercase(),
                nullable: nullable.eq_ignore_ascii_case("YES"),
                primary_key: key == "PRI",
                indexes: Vec::new(),
                comment: comment.filter(|c| !c.is_empty()),
            })
            .collect();

        tracing::debug!(sql = MYSQL_INDEXES, table, "query");
        let index_rows = sqlx::query_as::<_, (String, String, i64)>(MYSQL_INDEXES)
            .bind(table)
            .fetch_all(pool)
            .await?;
        let mut by_column: BTreeMap<String, Vec<IndexMeta>> = BTreeMap::new();
        for (index, column, non_unique) in index_rows {
            by_column.entry(column).or_default().push(IndexMeta {
                name: index,
                unique: non_unique == 0,
            });
        }
        attach_indexes(&mut columns, by_column);
        Ok(columns)
    }

    async fn pg_columns(pool: &sqlx::PgPool, table: &str) -> Result<Vec<ColumnMeta>, sqlx::Error> {
        tracing::debug!(sql = PG_COLUMNS, table, "query");
        let rows = sqlx::query_as::<_, (String, String, String, String, Option<String>)>(PG_COLUMNS)
            .bind(table)
            .fetch_all(pool)
            .await?;
        let mut columns: Vec<ColumnMeta> = rows
            .into_iter()
            .map(|(name, udt_name, data_type, nullable, comment)| ColumnMeta {
                name,
                data_type: udt_name.to_lowercase(),
                column_type: data_type.to_lowercase(),
                nullable: nullable.eq_ignore_ascii_case("YES"),
                primary_key: false,
                indexes: Vec::new(),
                comment,
            })
            .collect();
        if columns.is_empty() {
            return Ok(columns);
        }

        tracing::debug!(sql = PG_INDEXES, table, "query");
        let index_rows = sqlx::query_as::<_, (String, String, bool, bool)>(PG_INDEXES)
            .bind(table)
            .fetch_all(pool)
            .await?;
        let mut by_column: BTreeMap<String, Vec<IndexMeta>> = BTreeMap::new();
        for (index, column, unique, primary) in index_rows {
            if primary {
                if let Some(col) = columns.iter_mut().find(|c| c.name == column) {
                    col.primary_key = true;
                }
            }
            by_column.entry(column).or_default().push(IndexMeta { name: index, unique });
        }
        attach_indexes(&mut columns, by_column);
        Ok(columns)
    }

    async fn sqlite_columns(
        pool: &sqlx::SqlitePool,
        table: &str,
    ) -> Result<Vec<ColumnMeta>, sqlx::Error> {
        tracing::debug!(sql = SQLITE_COLUMNS, table, "query");
        let rows = sqlx::query_as::<_, (String, String, i64, i64)>(SQLITE_COLUMNS)
            .bind(table)
            .fetch_all(pool)
            .await?;
        let mut columns: Vec<ColumnMeta> = rows
            .into_iter()
            .map(|(name, declared, not_null, pk)| ColumnMeta {
                name,
                data_type: base_type(&declared),
                column_type: declared.to_lowercase(),
                nullable: not_null == 0 && pk == 0,
                primary_key: pk > 0,
                indexes: Vec::new(),
                comment: None,
            })
            .collect();

        tracing::debug!(sql = SQLITE_INDEXES, table, "query");
        let index_rows = sqlx::query_as::<_, (String, String, i64)>(SQLITE_INDEXES)
            .bind(table)
            .fetch_all(pool)
            .await?;
        let mut by_column: BTreeMap<String, Vec<IndexMeta>> = BTreeMap::new();
        for (index, column, unique) in index_rows {
            by_column.entry(column).or_default().push(IndexMeta {
                name: index,
                unique: unique != 0,
            });
        }
        attach_indexes(&mut columns, by_column);
        Ok(columns)
    }
}

#[async_trait]
impl SchemaSource for Connection {
    async fn table_names(&self) -> Result<Vec<String>, IntrospectionError> {
        let result = match &self.pool {
            DbPool::MySql(pool) => {
                tracing::debug!(sql = MYSQL_TABLES, "query");
                sqlx::query_scalar::<_, String>(MYSQL_TABLES).fetch_all(pool).await
            }
            DbPool::Postgres(pool) => {
                tracing::debug!(sql = PG_TABLES, "query");
                sqlx::query_scalar::<_, String>(PG_TABLES).fetch_all(pool).await
            }
            DbPool::Sqlite(pool) => {
                tracing::debug!(sql = SQLITE_TABLES, "query");
                sqlx::query_scalar::<_, String>(SQLITE_TABLES).fetch_all(pool).await
            }
        };
        result.map_err(IntrospectionError::Tables)
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnMeta>, IntrospectionError> {
        let result = match &self.pool {
            DbPool::MySql(pool) => Connection::mysql_columns(pool, table).await,
            DbPool::Postgres(pool) => Connection::pg_columns(pool, table).await,
            DbPool::Sqlite(pool) => Connection::sqlite_columns(pool, table).await,
        };
        let columns = result.map_err(|source| IntrospectionError::Columns {
            table: table.to_string(),
            source,
        })?;
        if columns.is_empty() {
            return Err(IntrospectionError::UnknownTable(table.to_string()));
        }
        Ok(columns)
    }
}
