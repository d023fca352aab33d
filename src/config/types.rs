//! Resolved generation config and the structured tokens it carries.

use crate::error::ConfigError;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Database driver kind. Closed set; anything else is rejected at config time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverKind {
    MySql,
    Postgres,
    Sqlite,
    SqlServer,
    ClickHouse,
}

impl DriverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::MySql => "mysql",
            DriverKind::Postgres => "postgres",
            DriverKind::Sqlite => "sqlite",
            DriverKind::SqlServer => "sqlserver",
            DriverKind::ClickHouse => "clickhouse",
        }
    }
}

impl std::str::FromStr for DriverKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(DriverKind::MySql),
            "postgres" | "postgresql" => Ok(DriverKind::Postgres),
            "sqlite" => Ok(DriverKind::Sqlite),
            "sqlserver" => Ok(DriverKind::SqlServer),
            "clickhouse" => Ok(DriverKind::ClickHouse),
            _ => Err(ConfigError::UnsupportedDriver(s.to_string())),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a generated relation field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    ManyToMany,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::HasOne => "has_one",
            RelationKind::HasMany => "has_many",
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::ManyToMany => "many_to_many",
        }
    }

    /// has_many and many_to_many hold a collection; the others a single reference.
    pub fn is_collection(&self) -> bool {
        matches!(self, RelationKind::HasMany | RelationKind::ManyToMany)
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "has_one" => Some(RelationKind::HasOne),
            "has_many" => Some(RelationKind::HasMany),
            "belongs_to" => Some(RelationKind::BelongsTo),
            "many_to_many" => Some(RelationKind::ManyToMany),
            _ => None,
        }
    }
}

/// Foreign-key annotation carried on a relation field, e.g. `foreignKey:UserID`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKeyTag {
    pub key: String,
    pub value: String,
}

impl fmt::Display for ForeignKeyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// One declared relation edge: `source|target|field|kind|key:value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationSpec {
    pub source_table: String,
    pub target_table: String,
    pub field_name: String,
    pub kind: RelationKind,
    pub foreign_key: ForeignKeyTag,
}

/// Columns of one table that serialize as text: `table|col[|col...]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringTagSpec {
    pub table: String,
    pub columns: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    /// Directory for model files.
    pub model_path: PathBuf,
    /// Directory for query-builder code.
    pub query_path: PathBuf,
    /// File name of the query-builder code inside `query_path`.
    pub query_file: String,
    /// Module path the query code imports models from, e.g. `crate::data::model`.
    /// `None` derives it from `model_path`.
    pub model_pkg: Option<String>,
}

impl OutputPaths {
    pub fn query_file_path(&self) -> PathBuf {
        self.query_path.join(&self.query_file)
    }
}

/// Per-field emission switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldOptions {
    pub only_model: bool,
    pub with_unit_test: bool,
    /// Nullable columns become `Option<T>`.
    pub nullable: bool,
    pub with_index_tag: bool,
    pub with_type_tag: bool,
    /// Unsigned integer columns map to unsigned Rust integers.
    pub signable: bool,
}

/// Immutable configuration for one generation run.
#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub driver: DriverKind,
    pub dsn: String,
    pub include_tables: Vec<String>,
    pub exclude_tables: HashSet<String>,
    pub associations: Vec<AssociationSpec>,
    pub string_tags: Vec<StringTagSpec>,
    pub output: OutputPaths,
    pub fields: FieldOptions,
}
