//! Code emission backends.

pub mod rust;

use crate::case::field_ident;
use crate::config::GenerationConfig;
use crate::error::EmitError;
use crate::model::ResolvedTableModel;
use std::collections::HashSet;
use std::path::PathBuf;

pub use rust::RustEmitter;

/// Writes source files for a fully resolved set of models.
pub trait ModelEmitter {
    /// Emit all models in order. Returns the files written.
    fn emit(
        &self,
        config: &GenerationConfig,
        models: &[ResolvedTableModel],
    ) -> Result<Vec<PathBuf>, EmitError>;
}

/// Relation field names and serialized names must not collide within a model,
/// and every target must be emitted.
pub fn check_relations(models: &[ResolvedTableModel]) -> Result<(), EmitError> {
    let emitted: HashSet<&str> = models.iter().map(|m| m.table_name.as_str()).collect();
    for model in models {
        let mut idents: HashSet<String> = model
            .fields
            .iter()
            .map(|f| field_ident(&f.column.name))
            .collect();
        let mut names: HashSet<&str> = model.fields.iter().map(|f| f.tag.name.as_str()).collect();
        for rel in &model.relations {
            let field = rel.relation.field_name.as_str();
            if !idents.insert(field_ident(field)) {
                return Err(EmitError::DuplicateField {
                    table: model.table_name.clone(),
                    field: field.to_string(),
                });
            }
            if !names.insert(rel.tag.name.as_str()) {
                return Err(EmitError::DuplicateSerializedName {
                    table: model.table_name.clone(),
                    name: rel.tag.name.clone(),
                });
            }
            if !emitted.contains(rel.relation.target_table.as_str()) {
                return Err(EmitError::MissingTarget {
                    table: model.table_name.clone(),
                    field: field.to_string(),
                    target: rel.relation.target_table.clone(),
                });
            }
        }
    }
    Ok(())
}
