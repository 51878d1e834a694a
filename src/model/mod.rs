pub mod document;
pub mod document_set;
pub mod error;
pub mod identity;
pub mod node;
pub mod tag;
pub mod validation;

pub use document::Document;
pub use document_set::{DocumentSet, DocumentSetRef};
pub use error::{ModelError, ValidationError};
pub use identity::{Entity, EntitySet, Identity, Shared};
pub use node::Node;
pub use tag::Tag;
pub use validation::validate_document_set;
