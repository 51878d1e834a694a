use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{entity}.{field} is required")]
    Required {
        entity: &'static str,
        field: &'static str,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{0} has not been persisted yet")]
    NotPersisted(&'static str),
}
