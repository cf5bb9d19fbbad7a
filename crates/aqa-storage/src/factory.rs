//! Backend selection: explicit name wins, then `AQA_STORAGE_BACKEND`,
//! then the presence of `AQA_S3_BUCKET` as a hint the operator wants the
//! object-store backend, falling back to the embedded DB. Plain
//! `std::env::var(...).unwrap_or_else(...)` reads rather than a
//! config-file/builder crate.

use std::path::PathBuf;

use crate::error::StorageError;
use crate::history::HistoryStore;
use crate::history_filetree::FileTreeHistoryStore;
use crate::history_objectstore::ObjectStoreHistoryStore;
use crate::history_sqlite::SqliteHistoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBackendKind {
    EmbeddedDb,
    FileTree,
    ObjectStore,
}

impl HistoryBackendKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "embedded_db" | "sqlite" => Some(HistoryBackendKind::EmbeddedDb),
            "file_tree" | "filetree" => Some(HistoryBackendKind::FileTree),
            "object_store" | "s3" => Some(HistoryBackendKind::ObjectStore),
            _ => None,
        }
    }
}

/// Resolves which backend to use: `explicit` > `AQA_STORAGE_BACKEND` >
/// presence of `AQA_S3_BUCKET` > embedded DB default.
pub fn resolve_backend_kind(explicit: Option<&str>) -> HistoryBackendKind {
    if let Some(name) = explicit {
        if let Some(kind) = HistoryBackendKind::from_name(name) {
            return kind;
        }
    }
    if let Ok(name) = std::env::var("AQA_STORAGE_BACKEND") {
        if let Some(kind) = HistoryBackendKind::from_name(&name) {
            return kind;
        }
    }
    if std::env::var("AQA_S3_BUCKET").is_ok() {
        return HistoryBackendKind::ObjectStore;
    }
    HistoryBackendKind::EmbeddedDb
}

/// Builds the concrete `HistoryStore` for the resolved backend kind.
/// `AQA_STORAGE_PATH` governs the embedded-DB file location and the
/// file-tree root; `AQA_S3_BUCKET` is passed through to the object-store
/// stub for observability even though it can't actually connect anywhere.
pub fn build_history_store(explicit: Option<&str>) -> Result<Box<dyn HistoryStore>, StorageError> {
    let kind = resolve_backend_kind(explicit);
    let storage_path = std::env::var("AQA_STORAGE_PATH").unwrap_or_else(|_| "./.aqa/storage".to_string());

    match kind {
        HistoryBackendKind::EmbeddedDb => {
            let mut db_path = PathBuf::from(&storage_path);
            std::fs::create_dir_all(&db_path)?;
            db_path.push("history.sqlite3");
            Ok(Box::new(SqliteHistoryStore::open(db_path.to_string_lossy().as_ref())?))
        }
        HistoryBackendKind::FileTree => {
            let root = PathBuf::from(&storage_path).join("history");
            Ok(Box::new(FileTreeHistoryStore::new(root)?))
        }
        HistoryBackendKind::ObjectStore => {
            let bucket = std::env::var("AQA_S3_BUCKET").ok();
            Ok(Box::new(ObjectStoreHistoryStore::new(bucket)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_name_wins_over_everything() {
        assert_eq!(resolve_backend_kind(Some("file_tree")), HistoryBackendKind::FileTree);
    }

    #[test]
    fn unset_env_defaults_to_embedded_db() {
        std::env::remove_var("AQA_STORAGE_BACKEND");
        std::env::remove_var("AQA_S3_BUCKET");
        assert_eq!(resolve_backend_kind(None), HistoryBackendKind::EmbeddedDb);
    }
}
