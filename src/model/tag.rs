use serde::Serialize;
use uuid::Uuid;

use crate::model::{document::serialize_owner, document_set::DocumentSetRef, identity::Entity};

/// A label owned by a document set
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub(crate) id: Option<i64>,
    #[serde(skip)]
    pub(crate) handle: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "document_set_id", serialize_with = "serialize_owner")]
    pub(crate) document_set: Option<DocumentSetRef>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            handle: Uuid::new_v4(),
            name: name.into(),
            color: None,
            document_set: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn document_set(&self) -> Option<&DocumentSetRef> {
        self.document_set.as_ref()
    }
}

impl Entity for Tag {
    const NAME: &'static str = "tag";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn handle(&self) -> Uuid {
        self.handle
    }
}
