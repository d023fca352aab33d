//! Rust backend: serde + sqlx annotated model structs and a query module.

use crate::case::{field_ident, to_pascal_case, to_snake_case};
use crate::config::{DriverKind, FieldOptions, GenerationConfig};
use crate::emit::{check_relations, ModelEmitter};
use crate::error::EmitError;
use crate::introspect::ColumnMeta;
use crate::model::{ResolvedField, ResolvedRelation, ResolvedTableModel};
use crate::type_map::SemanticType;
use std::path::{Component, Path, PathBuf};

const HEADER: &str = "// Code generated by modelgen. DO NOT EDIT.\n";

/// Type alias emitted into the model module for the soft-delete marker.
pub const SOFT_DELETE_TYPE: &str = "DeletedAt";

#[derive(Clone, Debug, Default)]
pub struct RustEmitter;

impl ModelEmitter for RustEmitter {
    fn emit(
        &self,
        config: &GenerationConfig,
        models: &[ResolvedTableModel],
    ) -> Result<Vec<PathBuf>, EmitError> {
        check_relations(models)?;

        let model_dir = &config.output.model_path;
        let mut files: Vec<(PathBuf, String)> = models
            .iter()
            .map(|model| {
                (
                    model_dir.join(format!("{}.rs", module_file(&model.table_name))),
                    render_model(model, config.driver, &config.fields),
                )
            })
            .collect();
        files.push((model_dir.join("mod.rs"), render_model_mod(models)));

        if !config.fields.only_model {
            let models_mod = config
                .output
                .model_pkg
                .clone()
                .unwrap_or_else(|| module_path(model_dir));
            files.push((
                config.output.query_file_path(),
                render_queries(models, config.driver, &config.fields, &models_mod),
            ));
        }

        write_all(&files)?;
        Ok(files.into_iter().map(|(path, _)| path).collect())
    }
}

/// Create every output directory, then write the files. A directory that cannot
/// be created fails the run before any file is touched; a failed write may still
/// leave earlier files of the same run in place.
fn write_all(files: &[(PathBuf, String)]) -> Result<(), EmitError> {
    let mut dirs: Vec<&Path> = files.iter().filter_map(|(path, _)| path.parent()).collect();
    dirs.dedup();
    for dir in dirs {
        std::fs::create_dir_all(dir).map_err(|source| EmitError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    for (path, content) in files {
        std::fs::write(path, content).map_err(|source| EmitError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "wrote");
    }
    Ok(())
}

/// Module identifier of a table's model file, as declared in `mod.rs`.
fn module_name(table: &str) -> String {
    field_ident(&to_snake_case(table))
}

/// File stem for `mod {module_name};`: raw identifiers resolve to the bare name.
fn module_file(table: &str) -> String {
    module_name(table).trim_start_matches("r#").to_string()
}

pub fn struct_name(table: &str) -> String {
    let name = to_pascal_case(table);
    if name == "Self" {
        format!("{}_", name)
    } else {
        name
    }
}

/// `src/data/model` -> `crate::data::model`.
pub fn module_path(dir: &Path) -> String {
    let parts: Vec<String> = dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let after_src = parts
        .iter()
        .position(|p| p == "src")
        .map(|i| &parts[i + 1..])
        .unwrap_or(&parts[parts.len().saturating_sub(1)..]);
    let mut path = String::from("crate");
    for p in after_src {
        path.push_str("::");
        path.push_str(&field_ident(p));
    }
    path
}

/// Default Rust type for a column with no override.
fn infer_type(column: &ColumnMeta, driver: DriverKind, signable: bool) -> &'static str {
    let unsigned = signable && column.is_unsigned();
    match column.data_type.as_str() {
        "tinyint" if column.column_type.starts_with("tinyint(1)") => "bool",
        "bool" | "boolean" | "bit" => "bool",
        "tinyint" if unsigned => "u8",
        "tinyint" => "i8",
        "smallint" | "int2" | "smallserial" if unsigned => "u16",
        "smallint" | "int2" | "smallserial" => "i16",
        "integer" if driver == DriverKind::Sqlite => "i64",
        "mediumint" | "int" | "integer" | "int4" | "serial" if unsigned => "u32",
        "mediumint" | "int" | "integer" | "int4" | "serial" => "i32",
        "bigint" | "int8" | "bigserial" if unsigned => "u64",
        "bigint" | "int8" | "bigserial" => "i64",
        "float" | "real" | "float4" => "f32",
        "double" | "float8" | "double precision" => "f64",
        "timestamptz" => "chrono::DateTime<chrono::Utc>",
        "timestamp" => "chrono::NaiveDateTime",
        "time" => "chrono::NaiveTime",
        "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" | "bytea" => {
            "Vec<u8>"
        }
        _ => "String",
    }
}

fn semantic_type(semantic: SemanticType) -> &'static str {
    match semantic {
        SemanticType::Decimal => "rust_decimal::Decimal",
        SemanticType::Date => "chrono::NaiveDate",
        SemanticType::DateTime => "chrono::NaiveDateTime",
        SemanticType::SoftDelete => SOFT_DELETE_TYPE,
    }
}

fn is_numeric(ty: &str) -> bool {
    matches!(
        ty,
        "i8" | "u8" | "i16" | "u16" | "i32" | "u32" | "i64" | "u64" | "f32" | "f64"
    ) || ty == semantic_type(SemanticType::Decimal)
}

/// Base type of a field, without the nullable wrapper.
fn base_rust_type(field: &ResolvedField, driver: DriverKind, opts: &FieldOptions) -> &'static str {
    match field.semantic {
        Some(s) => semantic_type(s),
        None => infer_type(&field.column, driver, opts.signable),
    }
}

fn wraps_option(field: &ResolvedField, opts: &FieldOptions) -> bool {
    opts.nullable && field.column.nullable && field.semantic != Some(SemanticType::SoftDelete)
}

fn field_type(field: &ResolvedField, driver: DriverKind, opts: &FieldOptions) -> String {
    let base = base_rust_type(field, driver, opts);
    if wraps_option(field, opts) {
        format!("Option<{}>", base)
    } else {
        base.to_string()
    }
}

fn string_encoded(field: &ResolvedField, driver: DriverKind, opts: &FieldOptions) -> bool {
    field.tag.string_encoded && is_numeric(base_rust_type(field, driver, opts))
}

fn render_field(out: &mut String, field: &ResolvedField, driver: DriverKind, opts: &FieldOptions) {
    let col = &field.column;
    if let Some(comment) = &col.comment {
        out.push_str(&format!("    /// {}\n", comment));
    }
    out.push_str(&format!("    /// column: {}\n", col.name));
    if opts.with_type_tag {
        out.push_str(&format!("    /// type: {}\n", col.column_type));
    }
    if opts.with_index_tag {
        for idx in &col.indexes {
            let unique = if idx.unique { " (unique)" } else { "" };
            out.push_str(&format!("    /// index: {}{}\n", idx.name, unique));
        }
    }
    let ident = field_ident(&col.name);
    if ident != col.name {
        out.push_str(&format!("    #[sqlx(rename = \"{}\")]\n", col.name));
    }
    out.push_str(&format!("    #[serde(rename = \"{}\")]\n", field.tag.name));
    if string_encoded(field, driver, opts) {
        let as_type = if wraps_option(field, opts) {
            "Option<serde_with::DisplayFromStr>"
        } else {
            "serde_with::DisplayFromStr"
        };
        out.push_str(&format!("    #[serde_as(as = \"{}\")]\n", as_type));
    }
    out.push_str(&format!(
        "    pub {}: {},\n",
        ident,
        field_type(field, driver, opts)
    ));
}

fn render_relation(out: &mut String, rel: &ResolvedRelation) {
    let r = &rel.relation;
    let target = struct_name(&r.target_table);
    out.push_str(&format!(
        "    /// relation: {} {}, {}\n",
        r.kind.as_str(),
        r.target_table,
        r.foreign_key
    ));
    out.push_str("    #[sqlx(skip)]\n");
    let ty = if r.kind.is_collection() {
        out.push_str(&format!(
            "    #[serde(rename = \"{}\", default, skip_serializing_if = \"Vec::is_empty\")]\n",
            rel.tag.name
        ));
        format!("Vec<super::{}>", target)
    } else {
        out.push_str(&format!(
            "    #[serde(rename = \"{}\", default, skip_serializing_if = \"Option::is_none\")]\n",
            rel.tag.name
        ));
        format!("Option<Box<super::{}>>", target)
    };
    out.push_str(&format!("    pub {}: {},\n", field_ident(&r.field_name), ty));
}

pub fn render_model(model: &ResolvedTableModel, driver: DriverKind, opts: &FieldOptions) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    if model.has_soft_delete() {
        out.push_str(&format!("use super::{};\n", SOFT_DELETE_TYPE));
    }
    out.push_str("use serde::{Deserialize, Serialize};\n\n");
    out.push_str(&format!("/// Model for table `{}`.\n", model.table_name));
    if model.fields.iter().any(|f| string_encoded(f, driver, opts)) {
        out.push_str("#[serde_with::serde_as]\n");
    }
    out.push_str("#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]\n");
    out.push_str(&format!("pub struct {} {{\n", struct_name(&model.table_name)));
    for field in &model.fields {
        render_field(&mut out, field, driver, opts);
    }
    for rel in &model.relations {
        render_relation(&mut out, rel);
    }
    out.push_str("}\n\n");
    out.push_str(&format!("impl {} {{\n", struct_name(&model.table_name)));
    out.push_str(&format!(
        "    pub const TABLE_NAME: &'static str = \"{}\";\n",
        model.table_name
    ));
    out.push_str("}\n");
    out
}

pub fn render_model_mod(models: &[ResolvedTableModel]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    out.push_str("/// Soft-delete marker: set once the row is logically deleted.\n");
    out.push_str(&format!(
        "pub type {} = Option<chrono::NaiveDateTime>;\n\n",
        SOFT_DELETE_TYPE
    ));
    for model in models {
        out.push_str(&format!("mod {};\n", module_name(&model.table_name)));
    }
    out.push('\n');
    for model in models {
        out.push_str(&format!(
            "pub use {}::{};\n",
            module_name(&model.table_name),
            struct_name(&model.table_name)
        ));
    }
    out
}

fn quote_ident(driver: DriverKind, name: &str) -> String {
    match driver {
        DriverKind::MySql | DriverKind::ClickHouse => format!("`{}`", name.replace('`', "``")),
        _ => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

fn placeholder(driver: DriverKind, n: usize) -> String {
    match driver {
        DriverKind::Postgres => format!("${}", n),
        DriverKind::SqlServer => format!("@p{}", n),
        _ => "?".into(),
    }
}

fn sqlx_database(driver: DriverKind) -> &'static str {
    match driver {
        DriverKind::MySql => "sqlx::MySql",
        DriverKind::Postgres => "sqlx::Postgres",
        DriverKind::Sqlite => "sqlx::Sqlite",
        DriverKind::SqlServer | DriverKind::ClickHouse => "sqlx::Any",
    }
}

/// `SELECT <columns> FROM <table>` with the soft-delete filter when the model has one.
fn select_sql(model: &ResolvedTableModel, driver: DriverKind, keys: &[&ResolvedField]) -> String {
    let columns: Vec<String> = model
        .fields
        .iter()
        .map(|f| quote_ident(driver, &f.column.name))
        .collect();
    let mut conditions: Vec<String> = keys
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = {}", quote_ident(driver, &f.column.name), placeholder(driver, i + 1)))
        .collect();
    if model.has_soft_delete() {
        conditions.push(format!(
            "{} IS NULL",
            quote_ident(driver, crate::type_map::SOFT_DELETE_COLUMN)
        ));
    }
    let mut sql = format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        quote_ident(driver, &model.table_name)
    );
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql
}

fn render_query_struct(
    out: &mut String,
    model: &ResolvedTableModel,
    driver: DriverKind,
    opts: &FieldOptions,
    models_mod: &str,
) {
    let name = struct_name(&model.table_name);
    let db = sqlx_database(driver);
    let columns: Vec<String> = model
        .fields
        .iter()
        .map(|f| format!("\"{}\"", f.column.name))
        .collect();

    out.push_str(&format!("/// Queries for table `{}`.\n", model.table_name));
    out.push_str(&format!("pub struct {}Query;\n\n", name));
    out.push_str(&format!("impl {}Query {{\n", name));
    out.push_str(&format!(
        "    pub const TABLE: &'static str = \"{}\";\n",
        model.table_name
    ));
    out.push_str(&format!(
        "    pub const COLUMNS: &'static [&'static str] = &[{}];\n",
        columns.join(", ")
    ));
    out.push_str(&format!(
        "    pub const SELECT_ALL: &'static str = r#\"{}\"#;\n",
        select_sql(model, driver, &[])
    ));

    let keys = model.primary_key();
    if !keys.is_empty() {
        out.push_str(&format!(
            "    pub const FIND_BY_PK: &'static str = r#\"{}\"#;\n",
            select_sql(model, driver, &keys)
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "    pub async fn all<'e, E>(executor: E) -> Result<Vec<{m}::{n}>, sqlx::Error>\n    where\n        E: sqlx::Executor<'e, Database = {db}>,\n    {{\n        sqlx::query_as::<_, {m}::{n}>(Self::SELECT_ALL).fetch_all(executor).await\n    }}\n",
        m = models_mod,
        n = name,
        db = db
    ));

    if !keys.is_empty() {
        let params: Vec<String> = keys
            .iter()
            .map(|f| {
                format!(
                    "{}: {}",
                    field_ident(&f.column.name),
                    base_rust_type(f, driver, opts)
                )
            })
            .collect();
        let binds: String = keys
            .iter()
            .map(|f| format!("\n            .bind({})", field_ident(&f.column.name)))
            .collect();
        out.push('\n');
        out.push_str(&format!(
            "    pub async fn find_by_pk<'e, E>(executor: E, {params}) -> Result<Option<{m}::{n}>, sqlx::Error>\n    where\n        E: sqlx::Executor<'e, Database = {db}>,\n    {{\n        sqlx::query_as::<_, {m}::{n}>(Self::FIND_BY_PK){binds}\n            .fetch_optional(executor)\n            .await\n    }}\n",
            params = params.join(", "),
            m = models_mod,
            n = name,
            db = db,
            binds = binds
        ));
    }
    out.push_str("}\n\n");
}

fn render_query_tests(out: &mut String, models: &[ResolvedTableModel]) {
    out.push_str("#[cfg(test)]\nmod tests {\n    use super::*;\n");
    for model in models {
        let name = struct_name(&model.table_name);
        out.push_str(&format!(
            "\n    #[test]\n    fn {snake}_query_matches_model() {{\n        assert_eq!({n}Query::TABLE, \"{t}\");\n        assert_eq!({n}Query::COLUMNS.len(), {len});\n        assert!({n}Query::SELECT_ALL.contains({n}Query::TABLE));\n    }}\n",
            snake = to_snake_case(&model.table_name),
            n = name,
            t = model.table_name,
            len = model.fields.len()
        ));
    }
    out.push_str("}\n");
}

pub fn render_queries(
    models: &[ResolvedTableModel],
    driver: DriverKind,
    opts: &FieldOptions,
    models_mod: &str,
) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for model in models {
        render_query_struct(&mut out, model, driver, opts, models_mod);
    }
    if opts.with_unit_test {
        render_query_tests(&mut out, models);
    }
    out
}
