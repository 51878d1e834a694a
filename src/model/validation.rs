use crate::model::{document_set::DocumentSet, error::ValidationError, identity::Entity};

/// Check the constraints a document set must meet before it is stored.
///
/// `query` must be present and non-empty. Whitespace counts as content.
pub fn validate_document_set(document_set: &DocumentSet) -> Result<(), ValidationError> {
    match document_set.query() {
        Some(query) if !query.is_empty() => Ok(()),
        _ => Err(ValidationError::Required {
            entity: DocumentSet::NAME,
            field: "query",
        }),
    }
}
