use thiserror::Error;

use crate::model::ValidationError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0} must be saved first")]
    NotPersisted(&'static str),

    #[error("No ids left for {0}")]
    SequenceExhausted(&'static str),

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot format error: {0}")]
    Serialization(#[from] serde_json::Error),
}
