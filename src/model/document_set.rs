use serde::Serialize;
use uuid::Uuid;

use crate::model::{
    document::Document,
    identity::{Entity, EntitySet, Shared},
    tag::Tag,
};

/// Back-reference from an owned child to its document set.
///
/// Compares by handle, so a reference taken before the set was saved
/// still matches it afterwards.
#[derive(Debug, Clone, Copy, Eq)]
pub struct DocumentSetRef {
    pub handle: Uuid,
    pub id: Option<i64>,
}

impl PartialEq for DocumentSetRef {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

/// A collection of documents selected by a search query, together with
/// the tags that label it.
///
/// Tags and documents are owned: saving or deleting the set does the same
/// to them. Nodes that point at the set are not held here; ask the store
/// with `Repository::nodes_referencing`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSet {
    pub(crate) id: Option<i64>,
    #[serde(skip)]
    pub(crate) handle: Uuid,
    pub(crate) query: Option<String>,
    pub(crate) tags: EntitySet<Tag>,
    pub(crate) documents: EntitySet<Document>,
}

impl Default for DocumentSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSet {
    /// Create a transient set with no query
    pub fn new() -> Self {
        Self {
            id: None,
            handle: Uuid::new_v4(),
            query: None,
            tags: EntitySet::new(),
            documents: EntitySet::new(),
        }
    }

    pub fn with_query(query: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.set_query(query);
        set
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = Some(query.into());
    }

    pub fn reference(&self) -> DocumentSetRef {
        DocumentSetRef {
            handle: self.handle,
            id: self.id,
        }
    }

    pub fn tags(&self) -> &EntitySet<Tag> {
        &self.tags
    }

    pub fn documents(&self) -> &EntitySet<Document> {
        &self.documents
    }

    /// Add a document and point its back-reference at this set.
    ///
    /// Adding a document that is already present leaves the collection
    /// unchanged. A document owned by another set is relinked here, but it
    /// stays in the other set's collection until removed from there.
    pub fn add_document(&mut self, document: &Shared<Document>) {
        self.documents.insert(document);
        document.write().document_set = Some(self.reference());
    }

    /// Add a tag and point its back-reference at this set
    pub fn add_tag(&mut self, tag: &Shared<Tag>) {
        self.tags.insert(tag);
        tag.write().document_set = Some(self.reference());
    }

    /// Drop a document from this set. Its back-reference is cleared only
    /// while it still points here.
    pub fn remove_document(&mut self, document: &Shared<Document>) -> bool {
        let removed = self.documents.remove(document);
        let mut document = document.write();
        if document.document_set == Some(self.reference()) {
            document.document_set = None;
        }
        removed
    }

    pub fn contains_document(&self, document: &Shared<Document>) -> bool {
        self.documents.contains(document)
    }

    /// True when `document` is in this set and points back at it
    pub fn owns(&self, document: &Shared<Document>) -> bool {
        self.contains_document(document)
            && document.read().document_set() == Some(&self.reference())
    }
}

impl Entity for DocumentSet {
    const NAME: &'static str = "document set";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn handle(&self) -> Uuid {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_document(title: &str) -> Shared<Document> {
        Shared::new(Document::new(title))
    }

    #[test]
    fn test_new_set_is_transient() {
        let set = DocumentSet::new();

        assert!(set.is_transient());
        assert!(set.query().is_none());
        assert!(set.tags().is_empty());
        assert!(set.documents().is_empty());
    }

    #[test]
    fn test_add_document_links_both_sides() {
        let mut set = DocumentSet::with_query("cats");
        let document = shared_document("Siamese");

        set.add_document(&document);

        assert!(set.contains_document(&document));
        assert_eq!(document.read().document_set(), Some(&set.reference()));
        assert!(set.owns(&document));
    }

    #[test]
    fn test_add_document_twice_keeps_one() {
        let mut set = DocumentSet::with_query("cats");
        let document = shared_document("Siamese");

        set.add_document(&document);
        set.add_document(&document);

        assert_eq!(set.documents().len(), 1);
    }

    #[test]
    fn test_relink_leaves_stale_entry() {
        let mut first = DocumentSet::with_query("cats");
        let mut second = DocumentSet::with_query("dogs");
        let document = shared_document("Pets");

        first.add_document(&document);
        second.add_document(&document);

        assert_eq!(document.read().document_set(), Some(&second.reference()));
        assert!(first.contains_document(&document));
        assert!(!first.owns(&document));
        assert!(second.owns(&document));
    }

    #[test]
    fn test_remove_document_only_clears_own_reference() {
        let mut first = DocumentSet::with_query("cats");
        let mut second = DocumentSet::with_query("dogs");
        let document = shared_document("Pets");

        first.add_document(&document);
        second.add_document(&document);

        assert!(first.remove_document(&document));
        assert_eq!(document.read().document_set(), Some(&second.reference()));

        assert!(second.remove_document(&document));
        assert!(document.read().document_set().is_none());
    }

    #[test]
    fn test_add_tag() {
        let mut set = DocumentSet::with_query("cats");
        let tag = Shared::new(Tag::new("felines"));

        set.add_tag(&tag);
        set.add_tag(&tag);

        assert_eq!(set.tags().len(), 1);
        assert_eq!(tag.read().document_set(), Some(&set.reference()));
    }

    #[test]
    fn test_reference_survives_id_assignment() {
        let mut set = DocumentSet::with_query("cats");
        let before = set.reference();
        set.id = Some(12);

        assert_eq!(before, set.reference());
        assert_eq!(set.reference().id, Some(12));
    }
}
