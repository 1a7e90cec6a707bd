//! Error types for reno-storage

use reno_core::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timestamp out of range: {0}")]
    Timestamp(#[from] time::error::ComponentRange),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A guarded update matched no row.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => CoreError::NotFound(what),
            StorageError::Conflict(reason) => CoreError::StateConflict(reason),
            StorageError::Core(inner) => inner,
            other => CoreError::Database(other.to_string()),
        }
    }
}
