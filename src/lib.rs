pub mod commands;
pub mod config;
pub mod logging;
pub mod model;
pub mod store;

pub use commands::{execute, Command};
pub use config::Config;
pub use model::{
    validate_document_set, Document, DocumentSet, DocumentSetRef, Entity, EntitySet, Identity,
    ModelError, Node, Shared, Tag, ValidationError,
};
pub use store::{InMemoryStore, Repository, StoreError};
