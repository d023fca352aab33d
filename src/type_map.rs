//! Fixed column-type overrides applied before the emitter's own type inference.

use crate::introspect::ColumnMeta;

/// Column holding the logical-deletion timestamp.
pub const SOFT_DELETE_COLUMN: &str = "deleted_at";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SemanticType {
    /// Arbitrary-precision decimal, never a float.
    Decimal,
    /// Calendar date without time zone.
    Date,
    /// Date and time without time zone.
    DateTime,
    /// Soft-delete marker.
    SoftDelete,
}

/// Override for a raw base type name, if any.
pub fn type_for_raw(data_type: &str) -> Option<SemanticType> {
    match data_type.to_lowercase().as_str() {
        "decimal" | "numeric" => Some(SemanticType::Decimal),
        "datetime" => Some(SemanticType::DateTime),
        "date" => Some(SemanticType::Date),
        _ => None,
    }
}

/// Override for a column. The soft-delete marker wins over its SQL type.
pub fn type_for(column: &ColumnMeta) -> Option<SemanticType> {
    if column.name == SOFT_DELETE_COLUMN {
        return Some(SemanticType::SoftDelete);
    }
    type_for_raw(&column.data_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_overrides() {
        assert_eq!(type_for_raw("DECIMAL"), Some(SemanticType::Decimal));
        assert_eq!(type_for_raw("numeric"), Some(SemanticType::Decimal));
        assert_eq!(type_for_raw("datetime"), Some(SemanticType::DateTime));
        assert_eq!(type_for_raw("date"), Some(SemanticType::Date));
        assert_eq!(type_for_raw("timestamp"), None);
        assert_eq!(type_for_raw("varchar"), None);
    }

    #[test]
    fn soft_delete_marker_ignores_sql_type() {
        let col = ColumnMeta::new("deleted_at", "bigint").nullable();
        assert_eq!(type_for(&col), Some(SemanticType::SoftDelete));
        let col = ColumnMeta::new("deleted_at", "datetime");
        assert_eq!(type_for(&col), Some(SemanticType::SoftDelete));
    }
}
