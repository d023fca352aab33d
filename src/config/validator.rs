//! Turn a merged layer into a `GenerationConfig`: driver, dsn and token syntax.

use crate::config::loader::ConfigLayer;
use crate::config::token::{parse_association, parse_string_tag};
use crate::config::types::*;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Trimmed, non-empty entries in order. Repeats are kept.
fn clean_tokens(items: Option<Vec<String>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Table name lists: like `clean_tokens`, first occurrence wins.
fn clean_list(items: Option<Vec<String>>) -> Vec<String> {
    let mut seen = HashSet::new();
    clean_tokens(items)
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn module_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("static regex")
    })
}

/// Validate a fully merged layer. Runs before any database contact.
pub fn validate(layer: ConfigLayer) -> Result<GenerationConfig, ConfigError> {
    let defaults = ConfigLayer::defaults();

    let driver: DriverKind = layer
        .driver
        .as_deref()
        .unwrap_or("mysql")
        .parse()?;
    let dsn = layer.dsn.unwrap_or_default().trim().to_string();
    if dsn.is_empty() {
        return Err(ConfigError::EmptyDsn);
    }

    let associations = clean_tokens(layer.association)
        .iter()
        .map(|token| parse_association(token))
        .collect::<Result<Vec<_>, _>>()?;
    let string_tags = clean_tokens(layer.field_with_string_tag)
        .iter()
        .map(|token| parse_string_tag(token))
        .collect::<Result<Vec<_>, _>>()?;

    let query_file = layer
        .query_file
        .filter(|f| !f.trim().is_empty())
        .or(defaults.query_file)
        .unwrap_or_default();
    let model_pkg = match layer.model_pkg.map(|p| p.trim().to_string()) {
        Some(p) if p.is_empty() => None,
        Some(p) if !module_path_regex().is_match(&p) => {
            return Err(ConfigError::InvalidModelPkg(p));
        }
        other => other,
    };
    let output = OutputPaths {
        model_path: layer.model_path.or(defaults.model_path).unwrap_or_default(),
        query_path: layer.query_path.or(defaults.query_path).unwrap_or_default(),
        query_file,
        model_pkg,
    };
    let fields = FieldOptions {
        only_model: layer.only_model.unwrap_or(false),
        with_unit_test: layer.with_unit_test.unwrap_or(false),
        nullable: layer.field_nullable.unwrap_or(false),
        with_index_tag: layer.field_with_index_tag.unwrap_or(false),
        with_type_tag: layer.field_with_type_tag.unwrap_or(false),
        signable: layer.field_signable.unwrap_or(true),
    };

    Ok(GenerationConfig {
        driver,
        dsn,
        include_tables: clean_list(layer.tables),
        exclude_tables: clean_list(layer.exclude).into_iter().collect(),
        associations,
        string_tags,
        output,
        fields,
    })
}
