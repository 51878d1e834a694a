use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::model::{document_set::DocumentSet, error::ModelError, identity::Entity};

/// A node that refers to document sets.
///
/// The node side owns the relation: a set only learns about the nodes
/// pointing at it by asking the store.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub(crate) id: Option<i64>,
    #[serde(skip)]
    pub(crate) handle: Uuid,
    pub description: String,
    pub(crate) document_sets: BTreeSet<i64>,
}

impl Node {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: None,
            handle: Uuid::new_v4(),
            description: description.into(),
            document_sets: BTreeSet::new(),
        }
    }

    /// Link a persisted document set to this node
    pub fn add_document_set(&mut self, document_set: &DocumentSet) -> Result<(), ModelError> {
        let id = document_set
            .id()
            .ok_or(ModelError::NotPersisted(DocumentSet::NAME))?;
        self.document_sets.insert(id);
        Ok(())
    }

    pub fn remove_document_set(&mut self, document_set_id: i64) -> bool {
        self.document_sets.remove(&document_set_id)
    }

    pub fn references(&self, document_set: &DocumentSet) -> bool {
        document_set
            .id()
            .map(|id| self.document_sets.contains(&id))
            .unwrap_or(false)
    }

    /// Ids of the sets this node refers to, ascending
    pub fn document_sets(&self) -> impl Iterator<Item = i64> + '_ {
        self.document_sets.iter().copied()
    }
}

impl Entity for Node {
    const NAME: &'static str = "node";

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

    #[test]
    fn test_link_requires_persisted_set() {
        let mut node = Node::new("root");
        let set = DocumentSet::with_query("cats");

        assert_eq!(
            node.add_document_set(&set),
            Err(ModelError::NotPersisted("document set"))
        );
        assert!(!node.references(&set));
    }

    #[test]
    fn test_link_and_unlink() {
        let mut node = Node::new("root");
        let mut set = DocumentSet::with_query("cats");
        set.id = Some(4);

        node.add_document_set(&set).unwrap();
        node.add_document_set(&set).unwrap();
        assert!(node.references(&set));
        assert_eq!(node.document_sets().collect::<Vec<_>>(), vec![4]);

        assert!(node.remove_document_set(4));
        assert!(!node.references(&set));
    }
}
