//! Serialized field names and string-encoding of numeric columns.

use crate::case::to_camel_case;
use crate::config::StringTagSpec;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Serialized name of a field, plus whether the value is written as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldTag {
    pub name: String,
    pub string_encoded: bool,
}

impl fmt::Display for FieldTag {
    /// `userId` or `userId,string`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.string_encoded {
            write!(f, "{},string", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// String-tag rules indexed by table. Later rules for the same table add columns.
#[derive(Clone, Debug, Default)]
pub struct TagPolicy {
    by_table: HashMap<String, HashSet<String>>,
}

impl TagPolicy {
    pub fn new(rules: &[StringTagSpec]) -> Self {
        let mut by_table: HashMap<String, HashSet<String>> = HashMap::new();
        for rule in rules {
            by_table
                .entry(rule.table.clone())
                .or_default()
                .extend(rule.columns.iter().cloned());
        }
        TagPolicy { by_table }
    }

    /// Tag for one column. Primary keys are always string-encoded.
    pub fn tag_for(&self, table: &str, column: &str, primary_key: bool) -> FieldTag {
        let listed = self
            .by_table
            .get(table)
            .map(|cols| cols.contains(column))
            .unwrap_or(false);
        FieldTag {
            name: to_camel_case(column),
            string_encoded: primary_key || listed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_string_tag;

    fn policy(tokens: &[&str]) -> TagPolicy {
        let rules: Vec<_> = tokens.iter().map(|t| parse_string_tag(t).unwrap()).collect();
        TagPolicy::new(&rules)
    }

    #[test]
    fn primary_key_is_string_encoded_without_rules() {
        let tag = policy(&[]).tag_for("users", "id", true);
        assert_eq!(tag.to_string(), "id,string");
    }

    #[test]
    fn default_is_camel_case() {
        let tag = policy(&[]).tag_for("users", "created_at", false);
        assert_eq!(tag.to_string(), "createdAt");
    }

    #[test]
    fn listed_columns_are_string_encoded_for_their_table_only() {
        let p = policy(&["users|role_id|lock_expire"]);
        assert_eq!(p.tag_for("users", "role_id", false).to_string(), "roleId,string");
        assert_eq!(p.tag_for("users", "lock_expire", false).to_string(), "lockExpire,string");
        assert_eq!(p.tag_for("users", "name", false).to_string(), "name");
        assert_eq!(p.tag_for("orders", "role_id", false).to_string(), "roleId");
    }

    #[test]
    fn rules_for_the_same_table_merge() {
        let p = policy(&["users|role_id", "users|group_id"]);
        assert!(p.tag_for("users", "role_id", false).string_encoded);
        assert!(p.tag_for("users", "group_id", false).string_encoded);
    }
}
