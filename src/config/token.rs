//! Parsers for the pipe-delimited association and string-tag tokens.

use crate::config::types::{AssociationSpec, ForeignKeyTag, RelationKind, StringTagSpec};
use crate::error::ConfigError;
use regex::Regex;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

fn check_identifier(token: &str, name: &str) -> Result<(), ConfigError> {
    if identifier_re().is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            token: token.to_string(),
            name: name.to_string(),
        })
    }
}

/// Parse `source|target|field|kind|key:value`.
/// Exactly five parts, and exactly two colon parts in the last one.
pub fn parse_association(token: &str) -> Result<AssociationSpec, ConfigError> {
    let parts: Vec<&str> = token.split('|').collect();
    let [source, target, field, kind, tag] = parts.as_slice() else {
        return Err(ConfigError::InvalidAssociation {
            token: token.to_string(),
        });
    };
    let tag_parts: Vec<&str> = tag.split(':').collect();
    let [key, value] = tag_parts.as_slice() else {
        return Err(ConfigError::InvalidAssociationTag {
            token: token.to_string(),
            tag: tag.to_string(),
        });
    };
    let kind = RelationKind::parse(kind).ok_or_else(|| ConfigError::InvalidRelationKind {
        token: token.to_string(),
        kind: kind.to_string(),
    })?;
    for name in [source, target, field] {
        check_identifier(token, name)?;
    }
    Ok(AssociationSpec {
        source_table: source.to_string(),
        target_table: target.to_string(),
        field_name: field.to_string(),
        kind,
        foreign_key: ForeignKeyTag {
            key: key.to_string(),
            value: value.to_string(),
        },
    })
}

/// Parse `table|column[|column...]`. At least one column is required.
pub fn parse_string_tag(token: &str) -> Result<StringTagSpec, ConfigError> {
    let mut parts = token.split('|');
    let table = parts.next().unwrap_or_default();
    let columns: Vec<String> = parts.map(str::to_string).collect();
    if columns.is_empty() {
        return Err(ConfigError::InvalidStringTag {
            token: token.to_string(),
        });
    }
    Ok(StringTagSpec {
        table: table.to_string(),
        columns,
    })
}
