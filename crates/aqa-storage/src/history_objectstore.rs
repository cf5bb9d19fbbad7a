//! Object-store execution history backend stub.
//!
//! Cloud credential handling (S3/GCS auth, bucket lifecycle policy) is an
//! explicit non-goal, but the backend slot still needs to exist so the
//! factory's selection logic and any future implementation have a
//! concrete type to return for `AQA_STORAGE_BACKEND=object_store`.
//! Every operation fails with `StorageError::ObjectStoreNotConfigured`.

use crate::error::StorageError;
use crate::history::{ExecutionRecord, HistoryListFilter, HistoryStats, HistoryStore};

#[derive(Debug, Default)]
pub struct ObjectStoreHistoryStore {
    pub bucket: Option<String>,
}

impl ObjectStoreHistoryStore {
    pub fn new(bucket: Option<String>) -> Self {
        ObjectStoreHistoryStore { bucket }
    }
}

impl HistoryStore for ObjectStoreHistoryStore {
    fn save(&self, _record: &ExecutionRecord) -> Result<(), StorageError> {
        Err(StorageError::ObjectStoreNotConfigured)
    }

    fn get(&self, _id: &str) -> Result<ExecutionRecord, StorageError> {
        Err(StorageError::ObjectStoreNotConfigured)
    }

    fn list(&self, _filter: &HistoryListFilter) -> Result<Vec<ExecutionRecord>, StorageError> {
        Err(StorageError::ObjectStoreNotConfigured)
    }

    fn delete(&self, _id: &str) -> Result<bool, StorageError> {
        Err(StorageError::ObjectStoreNotConfigured)
    }

    fn stats(&self) -> Result<HistoryStats, StorageError> {
        Err(StorageError::ObjectStoreNotConfigured)
    }

    fn clear(&self) -> Result<u64, StorageError> {
        Err(StorageError::ObjectStoreNotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_reports_not_configured() {
        let store = ObjectStoreHistoryStore::new(Some("my-bucket".to_string()));
        assert!(matches!(store.stats(), Err(StorageError::ObjectStoreNotConfigured)));
        assert!(matches!(store.get("x"), Err(StorageError::ObjectStoreNotConfigured)));
    }
}
