//! Resolved table model handed to the emitter: columns with tags and type overrides, plus relation fields.

use crate::association::{AssociationPlan, Bucket, RelationField};
use crate::case::to_camel_case;
use crate::introspect::ColumnMeta;
use crate::tag::{FieldTag, TagPolicy};
use crate::type_map::{type_for, SemanticType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedField {
    pub column: ColumnMeta,
    pub tag: FieldTag,
    /// Override from the type map; `None` leaves inference to the emitter.
    pub semantic: Option<SemanticType>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRelation {
    pub relation: RelationField,
    pub tag: FieldTag,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTableModel {
    pub table_name: String,
    pub is_association_source: bool,
    pub fields: Vec<ResolvedField>,
    pub relations: Vec<ResolvedRelation>,
}

impl ResolvedTableModel {
    pub fn primary_key(&self) -> Vec<&ResolvedField> {
        self.fields.iter().filter(|f| f.column.primary_key).collect()
    }

    pub fn has_soft_delete(&self) -> bool {
        self.fields
            .iter()
            .any(|f| f.semantic == Some(SemanticType::SoftDelete))
    }
}

/// Build the model for one table from its introspected columns.
pub fn resolve_table(
    table: &str,
    bucket: Bucket,
    columns: Vec<ColumnMeta>,
    plan: &AssociationPlan,
    tags: &TagPolicy,
) -> ResolvedTableModel {
    let fields = columns
        .into_iter()
        .map(|column| ResolvedField {
            tag: tags.tag_for(table, &column.name, column.primary_key),
            semantic: type_for(&column),
            column,
        })
        .collect();
    let relations = match bucket {
        Bucket::RelationSource => plan
            .relation_fields(table)
            .unwrap_or_default()
            .iter()
            .map(|relation| ResolvedRelation {
                tag: FieldTag {
                    name: to_camel_case(&relation.target_table),
                    string_encoded: false,
                },
                relation: relation.clone(),
            })
            .collect(),
        Bucket::Bare => Vec::new(),
    };
    ResolvedTableModel {
        table_name: table.to_string(),
        is_association_source: bucket == Bucket::RelationSource,
        fields,
        relations,
    }
}
