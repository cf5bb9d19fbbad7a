//! Storage error types shared by the cache, version store, and execution
//! history backends.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("entry not found: {0}")]
    NotFound(String),

    #[error("plan '{0}' already has a version {1}, save never overwrites")]
    VersionConflict(String, u32),

    #[error("object-store backend is selected but no credentials are configured")]
    ObjectStoreNotConfigured,

    #[error("unknown storage backend '{0}'")]
    UnknownBackend(String),
}
