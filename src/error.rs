//! Typed errors for each pipeline stage.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid association: {token} (expected source|target|field|kind|key:value)")]
    InvalidAssociation { token: String },
    #[error("invalid association tag: {tag} in {token} (expected key:value)")]
    InvalidAssociationTag { token: String, tag: String },
    #[error("invalid relation kind '{kind}' in {token} (expected has_one, has_many, belongs_to or many_to_many)")]
    InvalidRelationKind { token: String, kind: String },
    #[error("invalid identifier '{name}' in {token}")]
    InvalidIdentifier { token: String, name: String },
    #[error("invalid field with string tag: {token} (expected table|column[|column...])")]
    InvalidStringTag { token: String },
    #[error("unsupported driver '{0}' (expected mysql, postgres, sqlite, sqlserver or clickhouse)")]
    UnsupportedDriver(String),
    #[error("dsn cannot be empty")]
    EmptyDsn,
    #[error("invalid model package '{0}' (expected a module path such as crate::data::model)")]
    InvalidModelPkg(String),
    #[error("config file {}: {message}", .path.display())]
    Overlay { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("dsn cannot be empty")]
    EmptyDsn,
    #[error("unsupported driver '{0}' (expected mysql, postgres, sqlite, sqlserver or clickhouse)")]
    UnsupportedDriver(String),
    #[error("driver {0} is not available in this build")]
    DriverUnavailable(&'static str),
    #[error("connect {driver}: {source}")]
    Open {
        driver: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Error, Debug)]
pub enum IntrospectionError {
    #[error("list tables: {0}")]
    Tables(#[source] sqlx::Error),
    #[error("read columns of {table}: {source}")]
    Columns {
        table: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("table {0} not found")]
    UnknownTable(String),
}

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("table {table} declares relation field {field} more than once")]
    DuplicateField { table: String, field: String },
    #[error("table {table} serializes more than one field as {name}")]
    DuplicateSerializedName { table: String, name: String },
    #[error("relation {table}.{field} points at {target}, which is not emitted")]
    MissingTarget {
        table: String,
        field: String,
        target: String,
    },
}

/// Top-level error for one generation run.
#[derive(Error, Debug)]
pub enum GenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Introspection(#[from] IntrospectionError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}
