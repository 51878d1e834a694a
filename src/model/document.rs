use serde::Serialize;
use uuid::Uuid;

use crate::model::{document_set::DocumentSetRef, identity::Entity};

/// A document owned by exactly one document set
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Surrogate key, assigned on first save
    pub(crate) id: Option<i64>,
    #[serde(skip)]
    pub(crate) handle: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Back-reference to the owning set
    #[serde(rename = "document_set_id", serialize_with = "serialize_owner")]
    pub(crate) document_set: Option<DocumentSetRef>,
}

impl Document {
    /// Create a new transient document
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            handle: Uuid::new_v4(),
            title: title.into(),
            text: None,
            url: None,
            document_set: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The set this document currently points at
    pub fn document_set(&self) -> Option<&DocumentSetRef> {
        self.document_set.as_ref()
    }
}

impl Entity for Document {
    const NAME: &'static str = "document";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn handle(&self) -> Uuid {
        self.handle
    }
}

pub(crate) fn serialize_owner<S: serde::Serializer>(
    owner: &Option<DocumentSetRef>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    Serialize::serialize(&owner.as_ref().and_then(|owner| owner.id), serializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let document = Document::new("Annual report")
            .with_text("Revenue grew")
            .with_url("https://example.com/report");

        assert!(document.is_transient());
        assert_eq!(document.title, "Annual report");
        assert_eq!(document.text.as_deref(), Some("Revenue grew"));
        assert_eq!(document.url.as_deref(), Some("https://example.com/report"));
        assert!(document.document_set().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let document = Document::new("Memo");
        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "id": null, "title": "Memo", "document_set_id": null })
        );
    }

    #[test]
    fn test_serialized_owner_is_set_id() {
        let mut document = Document::new("Memo");
        document.id = Some(3);
        document.document_set = Some(DocumentSetRef {
            handle: Uuid::new_v4(),
            id: Some(8),
        });

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["document_set_id"], 8);
    }
}
