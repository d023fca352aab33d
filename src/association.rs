//! Relation bookkeeping: which tables get relation fields, which are re-admitted as bare models.

use crate::config::{AssociationSpec, ForeignKeyTag, RelationKind};
use std::collections::HashSet;

/// Generated relation field on a source model pointing at the target's model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationField {
    pub kind: RelationKind,
    pub field_name: String,
    pub target_table: String,
    pub foreign_key: ForeignKeyTag,
}

/// Outcome of resolving all association specs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssociationPlan {
    /// Source tables in order of first declaration, each with its fields in declaration order.
    pub sources: Vec<(String, Vec<RelationField>)>,
    /// Tables that are only ever targets; emitted as bare models.
    pub bare_targets: Vec<String>,
}

impl AssociationPlan {
    pub fn relation_fields(&self, table: &str) -> Option<&[RelationField]> {
        self.sources
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, fields)| fields.as_slice())
    }

    pub fn is_source(&self, table: &str) -> bool {
        self.relation_fields(table).is_some()
    }

    /// `(source, field)` pairs declared more than once.
    pub fn duplicate_fields(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (table, fields) in &self.sources {
            let mut seen = HashSet::new();
            for f in fields {
                if !seen.insert(f.field_name.as_str()) {
                    out.push((table.clone(), f.field_name.clone()));
                }
            }
        }
        out
    }
}

pub fn resolve(associations: &[AssociationSpec]) -> AssociationPlan {
    let mut plan = AssociationPlan::default();
    let mut targets: Vec<&str> = Vec::new();

    for spec in associations {
        if !targets.contains(&spec.target_table.as_str()) {
            targets.push(&spec.target_table);
        }
        let field = RelationField {
            kind: spec.kind,
            field_name: spec.field_name.clone(),
            target_table: spec.target_table.clone(),
            foreign_key: spec.foreign_key.clone(),
        };
        match plan.sources.iter_mut().find(|(name, _)| *name == spec.source_table) {
            Some((_, fields)) => fields.push(field),
            None => plan.sources.push((spec.source_table.clone(), vec![field])),
        }
    }

    plan.bare_targets = targets
        .into_iter()
        .filter(|t| !plan.is_source(t))
        .map(str::to_string)
        .collect();
    plan
}

/// Emission bucket of a table. Each emitted table is in exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    RelationSource,
    Bare,
}

/// Combine the plain universe with the association plan: relation sources first,
/// then plain tables, then re-admitted targets.
pub fn partition(universe: &[String], plan: &AssociationPlan) -> Vec<(String, Bucket)> {
    let mut seen = HashSet::new();
    let sources = plan
        .sources
        .iter()
        .map(|(name, _)| (name.clone(), Bucket::RelationSource));
    let bare = universe
        .iter()
        .chain(plan.bare_targets.iter())
        .map(|name| (name.clone(), Bucket::Bare));
    sources
        .chain(bare)
        .filter(|(name, _)| seen.insert(name.clone()))
        .collect()
}
