pub mod error;
pub mod memory;
pub mod rows;

use async_trait::async_trait;

use crate::model::{Document, DocumentSet, Node, Tag};

pub use error::StoreError;
pub use memory::InMemoryStore;

#[cfg(test)]
use mockall::automock;

/// Persistence provider for document sets and the records around them.
///
/// Saving and deleting a document set cascades to the tags and documents
/// it owns. Nodes have their own lifecycle: deleting a set only removes it
/// from the nodes that refer to it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<DocumentSet>, StoreError>;

    /// All document sets, ordered by id
    async fn find_all(&self) -> Result<Vec<DocumentSet>, StoreError>;

    /// Document sets whose query equals `query` exactly
    async fn find_by_query(&self, query: &str) -> Result<Vec<DocumentSet>, StoreError>;

    /// Validate and store the set together with its tags and documents.
    ///
    /// Assigns ids to every transient record involved and returns the
    /// set's id.
    async fn save(&self, document_set: &mut DocumentSet) -> Result<i64, StoreError>;

    /// Delete the set, its tags and its documents
    async fn delete(&self, document_set: &DocumentSet) -> Result<(), StoreError>;

    /// Nodes that currently refer to the set
    async fn nodes_referencing(&self, document_set: &DocumentSet)
        -> Result<Vec<Node>, StoreError>;

    async fn find_document(&self, id: i64) -> Result<Option<Document>, StoreError>;

    async fn find_tag(&self, id: i64) -> Result<Option<Tag>, StoreError>;

    async fn find_node(&self, id: i64) -> Result<Option<Node>, StoreError>;

    async fn save_node(&self, node: &mut Node) -> Result<i64, StoreError>;

    async fn delete_node(&self, node: &Node) -> Result<(), StoreError>;
}
