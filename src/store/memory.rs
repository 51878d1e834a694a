use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::model::{validate_document_set, Document, DocumentSet, Entity, Node, Tag};
use crate::store::{
    error::StoreError,
    rows::{DocumentRow, DocumentSetRow, NodeRow, TagRow, Tables},
    Repository,
};

/// Repository kept in memory, optionally mirrored to a JSON snapshot file
/// that is rewritten after every change.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store with no snapshot file
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            snapshot_path: None,
        }
    }

    /// Open a store backed by `path`, loading it if the file exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let tables = if tokio::fs::try_exists(&path).await? {
            let bytes = tokio::fs::read(&path).await?;
            let mut tables: Tables = serde_json::from_slice(&bytes)?;
            tables.reconcile_sequences();
            debug!(
                path = %path.display(),
                document_sets = tables.document_sets.len(),
                nodes = tables.nodes.len(),
                "loaded snapshot"
            );
            tables
        } else {
            Tables::default()
        };

        Ok(Self {
            tables: RwLock::new(tables),
            snapshot_path: Some(path),
        })
    }

    pub async fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        match &config.snapshot_path {
            Some(path) => Self::open(path).await,
            None => Ok(Self::new()),
        }
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    async fn persist(&self, tables: &Tables) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(tables)?;

        // Replace the snapshot by rename; a partial write only touches the temp file
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        tokio::fs::write(&temp, bytes).await?;
        if let Err(err) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(err.into());
        }
        debug!(path = %path.display(), "wrote snapshot");
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<DocumentSet>, StoreError> {
        Ok(self.tables.read().await.load_document_set(id))
    }

    async fn find_all(&self) -> Result<Vec<DocumentSet>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .document_sets
            .keys()
            .filter_map(|id| tables.load_document_set(*id))
            .collect())
    }

    async fn find_by_query(&self, query: &str) -> Result<Vec<DocumentSet>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .document_sets
            .values()
            .filter(|row| row.query == query)
            .filter_map(|row| tables.load_document_set(row.id))
            .collect())
    }

    async fn save(&self, document_set: &mut DocumentSet) -> Result<i64, StoreError> {
        if let Err(err) = validate_document_set(document_set) {
            warn!(error = %err, "rejected document set");
            return Err(err.into());
        }

        let mut tables = self.tables.write().await;
        let mut next = tables.clone();
        let id = match document_set.id {
            Some(id) if next.document_sets.contains_key(&id) => id,
            Some(id) => {
                return Err(StoreError::NotFound {
                    entity: DocumentSet::NAME,
                    id,
                })
            }
            None => next.sequences.next_document_set()?,
        };
        next.document_sets.insert(
            id,
            DocumentSetRow {
                id,
                handle: document_set.handle,
                query: document_set.query.clone().unwrap_or_default(),
            },
        );

        // Only children whose back-reference still names this set are written
        // with it as owner; a child relinked elsewhere keeps its stored owner.
        let owner = document_set.reference();
        let mut tags = Vec::with_capacity(document_set.tags.len());
        for shared in document_set.tags.iter() {
            let tag = shared.read();
            if tag.document_set != Some(owner) {
                continue;
            }
            let tag_id = match tag.id {
                Some(tag_id) => tag_id,
                None => next.sequences.next_tag()?,
            };
            next.tags.insert(tag_id, TagRow::from_tag(tag_id, &tag, id));
            tags.push((shared.clone(), tag_id));
        }

        let mut documents = Vec::with_capacity(document_set.documents.len());
        for shared in document_set.documents.iter() {
            let document = shared.read();
            if document.document_set != Some(owner) {
                continue;
            }
            let document_id = match document.id {
                Some(document_id) => document_id,
                None => next.sequences.next_document()?,
            };
            next.documents.insert(
                document_id,
                DocumentRow::from_document(document_id, &document, id),
            );
            documents.push((shared.clone(), document_id));
        }

        let tag_ids: Vec<i64> = tags.iter().map(|(_, tag_id)| *tag_id).collect();
        let document_ids: Vec<i64> = documents.iter().map(|(_, document_id)| *document_id).collect();
        next.detach_children(id, &tag_ids, &document_ids);
        debug!(document_set_id = id, ?tag_ids, ?document_ids, "cascaded save");

        self.persist(&next).await?;
        *tables = next;

        // Ids reach the caller's entities only once the write has succeeded
        document_set.id = Some(id);
        let owner = document_set.reference();
        for (shared, tag_id) in &tags {
            let mut tag = shared.write();
            tag.id = Some(*tag_id);
            if let Some(reference) = tag.document_set.as_mut().filter(|r| **r == owner) {
                reference.id = owner.id;
            }
        }
        for (shared, document_id) in &documents {
            let mut document = shared.write();
            document.id = Some(*document_id);
            if let Some(reference) = document.document_set.as_mut().filter(|r| **r == owner) {
                reference.id = owner.id;
            }
        }

        info!(
            document_set_id = id,
            tags = tags.len(),
            documents = documents.len(),
            "saved document set"
        );
        Ok(id)
    }

    async fn delete(&self, document_set: &DocumentSet) -> Result<(), StoreError> {
        let id = document_set
            .id
            .ok_or(StoreError::NotPersisted(DocumentSet::NAME))?;

        let mut tables = self.tables.write().await;
        if !tables.document_sets.contains_key(&id) {
            warn!(document_set_id = id, "delete of unknown document set");
            return Err(StoreError::NotFound {
                entity: DocumentSet::NAME,
                id,
            });
        }
        let mut next = tables.clone();
        next.document_sets.remove(&id);
        let (tags, documents) = next.remove_children(id);
        let nodes = next.detach_nodes(id);

        self.persist(&next).await?;
        *tables = next;
        info!(
            document_set_id = id,
            tags,
            documents,
            detached_nodes = nodes,
            "deleted document set"
        );
        Ok(())
    }

    async fn nodes_referencing(
        &self,
        document_set: &DocumentSet,
    ) -> Result<Vec<Node>, StoreError> {
        let Some(id) = document_set.id else {
            return Ok(Vec::new());
        };
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .values()
            .filter(|row| row.document_set_ids.contains(&id))
            .map(NodeRow::to_node)
            .collect())
    }

    async fn find_document(&self, id: i64) -> Result<Option<Document>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.documents.get(&id).map(|row| {
            let mut document = row.to_document();
            document.document_set = tables.owner_of(row.document_set_id);
            document
        }))
    }

    async fn find_tag(&self, id: i64) -> Result<Option<Tag>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.tags.get(&id).map(|row| {
            let mut tag = row.to_tag();
            tag.document_set = tables.owner_of(row.document_set_id);
            tag
        }))
    }

    async fn find_node(&self, id: i64) -> Result<Option<Node>, StoreError> {
        Ok(self.tables.read().await.nodes.get(&id).map(NodeRow::to_node))
    }

    async fn save_node(&self, node: &mut Node) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(missing) = node
            .document_sets()
            .find(|id| !tables.document_sets.contains_key(id))
        {
            warn!(document_set_id = missing, "node refers to unknown document set");
            return Err(StoreError::NotFound {
                entity: DocumentSet::NAME,
                id: missing,
            });
        }

        let mut next = tables.clone();
        let id = match node.id {
            Some(id) if next.nodes.contains_key(&id) => id,
            Some(id) => {
                return Err(StoreError::NotFound {
                    entity: Node::NAME,
                    id,
                })
            }
            None => next.sequences.next_node()?,
        };
        next.nodes.insert(id, NodeRow::from_node(id, node));

        self.persist(&next).await?;
        *tables = next;
        node.id = Some(id);
        info!(node_id = id, document_sets = node.document_sets.len(), "saved node");
        Ok(id)
    }

    async fn delete_node(&self, node: &Node) -> Result<(), StoreError> {
        let id = node.id.ok_or(StoreError::NotPersisted(Node::NAME))?;
        let mut tables = self.tables.write().await;
        if !tables.nodes.contains_key(&id) {
            return Err(StoreError::NotFound {
                entity: Node::NAME,
                id,
            });
        }
        let mut next = tables.clone();
        next.nodes.remove(&id);

        self.persist(&next).await?;
        *tables = next;
        info!(node_id = id, "deleted node");
        Ok(())
    }
}
