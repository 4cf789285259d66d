use thiserror::Error;

/// Raised by entity callbacks to stop a save or delete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CallbackError(pub String);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity {id} not found in {path}")]
    NotFound { path: String, id: String },

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("save stopped by pre-save callback: {0}")]
    PreSaveRejected(#[source] CallbackError),

    #[error("delete stopped by pre-delete callback: {0}")]
    PreDeleteRejected(#[source] CallbackError),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
