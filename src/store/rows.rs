//! Table rows backing the in-memory store and its JSON snapshot.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::model::{Document, DocumentSet, DocumentSetRef, Entity, Node, Shared, Tag};
use crate::store::error::StoreError;

/// Last id handed out per table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sequences {
    pub document_set: i64,
    pub tag: i64,
    pub document: i64,
    pub node: i64,
}

fn advance(counter: &mut i64, table: &'static str) -> Result<i64, StoreError> {
    *counter = counter
        .checked_add(1)
        .ok_or(StoreError::SequenceExhausted(table))?;
    Ok(*counter)
}

fn last_key<V>(table: &BTreeMap<i64, V>) -> i64 {
    table.keys().next_back().copied().unwrap_or(0)
}

impl Sequences {
    pub fn next_document_set(&mut self) -> Result<i64, StoreError> {
        advance(&mut self.document_set, DocumentSet::NAME)
    }

    pub fn next_tag(&mut self) -> Result<i64, StoreError> {
        advance(&mut self.tag, Tag::NAME)
    }

    pub fn next_document(&mut self) -> Result<i64, StoreError> {
        advance(&mut self.document, Document::NAME)
    }

    pub fn next_node(&mut self) -> Result<i64, StoreError> {
        advance(&mut self.node, Node::NAME)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSetRow {
    pub id: i64,
    pub handle: Uuid,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRow {
    pub id: i64,
    pub handle: Uuid,
    pub document_set_id: Option<i64>,
    pub name: String,
    pub color: Option<String>,
}

impl TagRow {
    pub fn from_tag(id: i64, tag: &Tag, document_set_id: i64) -> Self {
        Self {
            id,
            handle: tag.handle,
            document_set_id: Some(document_set_id),
            name: tag.name.clone(),
            color: tag.color.clone(),
        }
    }

    pub fn to_tag(&self) -> Tag {
        Tag {
            id: Some(self.id),
            handle: self.handle,
            name: self.name.clone(),
            color: self.color.clone(),
            document_set: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRow {
    pub id: i64,
    pub handle: Uuid,
    pub document_set_id: Option<i64>,
    pub title: String,
    pub text: Option<String>,
    pub url: Option<String>,
}

impl DocumentRow {
    pub fn from_document(id: i64, document: &Document, document_set_id: i64) -> Self {
        Self {
            id,
            handle: document.handle,
            document_set_id: Some(document_set_id),
            title: document.title.clone(),
            text: document.text.clone(),
            url: document.url.clone(),
        }
    }

    pub fn to_document(&self) -> Document {
        Document {
            id: Some(self.id),
            handle: self.handle,
            title: self.title.clone(),
            text: self.text.clone(),
            url: self.url.clone(),
            document_set: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: i64,
    pub handle: Uuid,
    pub description: String,
    pub document_set_ids: BTreeSet<i64>,
}

impl NodeRow {
    pub fn from_node(id: i64, node: &Node) -> Self {
        Self {
            id,
            handle: node.handle,
            description: node.description.clone(),
            document_set_ids: node.document_sets.clone(),
        }
    }

    pub fn to_node(&self) -> Node {
        Node {
            id: Some(self.id),
            handle: self.handle,
            description: self.description.clone(),
            document_sets: self.document_set_ids.clone(),
        }
    }
}

/// Every table in the store. This is also the snapshot file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub sequences: Sequences,
    #[serde(default)]
    pub document_sets: BTreeMap<i64, DocumentSetRow>,
    #[serde(default)]
    pub tags: BTreeMap<i64, TagRow>,
    #[serde(default)]
    pub documents: BTreeMap<i64, DocumentRow>,
    #[serde(default)]
    pub nodes: BTreeMap<i64, NodeRow>,
}

impl Tables {
    /// Raise each sequence to at least the largest key in its table, so a
    /// snapshot with missing or stale counters never reissues a live id
    pub fn reconcile_sequences(&mut self) {
        let sequences = &mut self.sequences;
        sequences.document_set = sequences.document_set.max(last_key(&self.document_sets));
        sequences.tag = sequences.tag.max(last_key(&self.tags));
        sequences.document = sequences.document.max(last_key(&self.documents));
        sequences.node = sequences.node.max(last_key(&self.nodes));
    }

    /// Rebuild a document set with its owned tags and documents
    pub fn load_document_set(&self, id: i64) -> Option<DocumentSet> {
        let row = self.document_sets.get(&id)?;
        let mut document_set = DocumentSet {
            id: Some(row.id),
            handle: row.handle,
            query: Some(row.query.clone()),
            ..DocumentSet::new()
        };

        for tag in self
            .tags
            .values()
            .filter(|tag| tag.document_set_id == Some(id))
        {
            document_set.add_tag(&Shared::new(tag.to_tag()));
        }
        for document in self
            .documents
            .values()
            .filter(|document| document.document_set_id == Some(id))
        {
            document_set.add_document(&Shared::new(document.to_document()));
        }

        Some(document_set)
    }

    /// Owner back-reference for a standalone child lookup
    pub fn owner_of(&self, document_set_id: Option<i64>) -> Option<DocumentSetRef> {
        let row = self.document_sets.get(&document_set_id?)?;
        Some(DocumentSetRef {
            handle: row.handle,
            id: Some(row.id),
        })
    }

    /// Clear the owner of rows that left the set's collection
    pub fn detach_children(&mut self, document_set_id: i64, tags: &[i64], documents: &[i64]) {
        for tag in self.tags.values_mut() {
            if tag.document_set_id == Some(document_set_id) && !tags.contains(&tag.id) {
                tag.document_set_id = None;
            }
        }
        for document in self.documents.values_mut() {
            if document.document_set_id == Some(document_set_id) && !documents.contains(&document.id)
            {
                document.document_set_id = None;
            }
        }
    }

    /// Delete every tag and document owned by the set, returning the counts
    pub fn remove_children(&mut self, document_set_id: i64) -> (usize, usize) {
        let tags_before = self.tags.len();
        self.tags
            .retain(|_, tag| tag.document_set_id != Some(document_set_id));
        let documents_before = self.documents.len();
        self.documents
            .retain(|_, document| document.document_set_id != Some(document_set_id));
        (
            tags_before - self.tags.len(),
            documents_before - self.documents.len(),
        )
    }

    /// Remove the set from every node that refers to it, returning how many changed
    pub fn detach_nodes(&mut self, document_set_id: i64) -> usize {
        let mut detached = 0;
        for node in self.nodes.values_mut() {
            if node.document_set_ids.remove(&document_set_id) {
                detached += 1;
            }
        }
        detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_start_at_one() {
        let mut sequences = Sequences::default();
        assert_eq!(sequences.next_document_set().unwrap(), 1);
        assert_eq!(sequences.next_document_set().unwrap(), 2);
        assert_eq!(sequences.next_tag().unwrap(), 1);
        assert_eq!(sequences.next_node().unwrap(), 1);
    }

    #[test]
    fn test_exhausted_sequence_fails() {
        let mut sequences = Sequences {
            document: i64::MAX,
            ..Sequences::default()
        };

        let result = sequences.next_document();

        assert!(matches!(result, Err(StoreError::SequenceExhausted("document"))));
        assert_eq!(sequences.document, i64::MAX);
    }

    #[test]
    fn test_reconcile_sequences_skips_live_ids() {
        let mut tables = Tables::default();
        tables.document_sets.insert(
            4,
            DocumentSetRow {
                id: 4,
                handle: Uuid::new_v4(),
                query: "cats".to_string(),
            },
        );
        tables.sequences.node = 9;

        tables.reconcile_sequences();

        assert_eq!(tables.sequences.next_document_set().unwrap(), 5);
        assert_eq!(tables.sequences.next_tag().unwrap(), 1);
        assert_eq!(tables.sequences.next_node().unwrap(), 10);
    }

    #[test]
    fn test_tables_snapshot_round_trip() {
        let mut tables = Tables::default();
        let id = tables.sequences.next_document_set().unwrap();
        tables.document_sets.insert(
            id,
            DocumentSetRow {
                id,
                handle: Uuid::new_v4(),
                query: "cats".to_string(),
            },
        );

        let json = serde_json::to_string(&tables).unwrap();
        let restored: Tables = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.sequences.document_set, 1);
        assert_eq!(restored.document_sets[&1].query, "cats");
    }

    #[test]
    fn test_load_restores_back_references() {
        let mut tables = Tables::default();
        let handle = Uuid::new_v4();
        tables.document_sets.insert(
            1,
            DocumentSetRow {
                id: 1,
                handle,
                query: "cats".to_string(),
            },
        );
        tables.documents.insert(
            5,
            DocumentRow {
                id: 5,
                handle: Uuid::new_v4(),
                document_set_id: Some(1),
                title: "Siamese".to_string(),
                text: None,
                url: None,
            },
        );

        let set = tables.load_document_set(1).unwrap();
        let document = set.documents().find_by_id(5).unwrap();
        assert!(set.owns(document));
        assert_eq!(document.read().document_set().unwrap().id, Some(1));
    }

    #[test]
    fn test_detach_nodes() {
        let mut tables = Tables::default();
        tables.nodes.insert(
            1,
            NodeRow {
                id: 1,
                handle: Uuid::new_v4(),
                description: "root".to_string(),
                document_set_ids: [1, 2].into_iter().collect(),
            },
        );

        assert_eq!(tables.detach_nodes(1), 1);
        assert_eq!(tables.detach_nodes(1), 0);
        assert_eq!(
            tables.nodes[&1].document_set_ids.iter().copied().collect::<Vec<_>>(),
            vec![2]
        );
    }
}
