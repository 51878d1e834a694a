use anyhow::Result;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::model::{Document, DocumentSet, Entity, Node, Shared, Tag};
use crate::store::{Repository, StoreError};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a document set for a search query
    Create {
        query: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Title of a document to add (repeatable)
        #[arg(long = "document")]
        documents: Vec<String>,
    },
    /// Show one document set with its tags and documents
    Show { id: i64 },
    /// List document sets
    List {
        /// Only sets with exactly this query
        #[arg(long)]
        query: Option<String>,
    },
    /// Add a document to an existing set
    AddDocument {
        id: i64,
        title: String,
        #[arg(long)]
        url: Option<String>,
    },
    /// Add a tag to an existing set
    AddTag {
        id: i64,
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a set along with its tags and documents
    Delete { id: i64 },
    /// List the nodes that refer to a set
    Nodes { id: i64 },
    /// Create a node referring to existing sets
    CreateNode {
        description: String,
        /// Document set id to link (repeatable)
        #[arg(long = "set")]
        sets: Vec<i64>,
    },
    /// Delete a node; the sets it refers to are kept
    DeleteNode { id: i64 },
}

async fn load<R: Repository + ?Sized>(repository: &R, id: i64) -> Result<DocumentSet> {
    repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| {
            StoreError::NotFound {
                entity: DocumentSet::NAME,
                id,
            }
            .into()
        })
}

/// Run `command` against `repository` and return what should be printed
pub async fn execute<R: Repository + ?Sized>(repository: &R, command: Command) -> Result<Value> {
    match command {
        Command::Create {
            query,
            tags,
            documents,
        } => {
            let mut document_set = DocumentSet::with_query(query);
            for name in tags {
                document_set.add_tag(&Shared::new(Tag::new(name)));
            }
            for title in documents {
                document_set.add_document(&Shared::new(Document::new(title)));
            }
            repository.save(&mut document_set).await?;
            Ok(serde_json::to_value(&document_set)?)
        }
        Command::Show { id } => {
            let document_set = load(repository, id).await?;
            Ok(serde_json::to_value(&document_set)?)
        }
        Command::List { query } => {
            let document_sets = match query {
                Some(query) => repository.find_by_query(&query).await?,
                None => repository.find_all().await?,
            };
            Ok(serde_json::to_value(&document_sets)?)
        }
        Command::AddDocument { id, title, url } => {
            let mut document_set = load(repository, id).await?;
            let mut document = Document::new(title);
            document.url = url;
            let document = Shared::new(document);
            document_set.add_document(&document);
            repository.save(&mut document_set).await?;
            Ok(serde_json::to_value(&document)?)
        }
        Command::AddTag { id, name, color } => {
            let mut document_set = load(repository, id).await?;
            let mut tag = Tag::new(name);
            tag.color = color;
            let tag = Shared::new(tag);
            document_set.add_tag(&tag);
            repository.save(&mut document_set).await?;
            Ok(serde_json::to_value(&tag)?)
        }
        Command::Delete { id } => {
            let document_set = load(repository, id).await?;
            repository.delete(&document_set).await?;
            Ok(json!({
                "deleted": id,
                "tags": document_set.tags().len(),
                "documents": document_set.documents().len(),
            }))
        }
        Command::Nodes { id } => {
            let document_set = load(repository, id).await?;
            let nodes = repository.nodes_referencing(&document_set).await?;
            Ok(serde_json::to_value(&nodes)?)
        }
        Command::CreateNode { description, sets } => {
            let mut node = Node::new(description);
            for id in sets {
                let document_set = load(repository, id).await?;
                node.add_document_set(&document_set)?;
            }
            repository.save_node(&mut node).await?;
            Ok(serde_json::to_value(&node)?)
        }
        Command::DeleteNode { id } => {
            let node = repository
                .find_node(id)
                .await?
                .ok_or(StoreError::NotFound {
                    entity: Node::NAME,
                    id,
                })?;
            repository.delete_node(&node).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}
