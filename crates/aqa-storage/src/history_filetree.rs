//! The legacy file-tree execution history backend: one JSON blob per
//! record under `{root}/{YYYY-MM-DD}/{id}.json`, plus a flat `index.json`
//! mapping id -> relative path so `get`/`delete` avoid a directory walk.
//! Kept alongside the embedded-DB backend for migration and for
//! environments where a SQLite file isn't wanted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use dashmap::DashMap;

use crate::error::StorageError;
use crate::history::{matches_filter, ExecutionRecord, HistoryListFilter, HistoryStats, HistoryStore};

pub struct FileTreeHistoryStore {
    root: PathBuf,
    index: RwLock<HashMap<String, String>>,
    id_locks: DashMap<String, ()>,
}

impl FileTreeHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(FileTreeHistoryStore {
            index: RwLock::new(Self::load_index(&root)?),
            root,
            id_locks: DashMap::new(),
        })
    }

    fn index_path(root: &Path) -> PathBuf {
        root.join("index.json")
    }

    fn load_index(root: &Path) -> Result<HashMap<String, String>, StorageError> {
        let path = Self::index_path(root);
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    fn save_index(&self, index: &HashMap<String, String>) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(index)?;
        std::fs::write(Self::index_path(&self.root), text)?;
        Ok(())
    }

    fn day_dir(timestamp: &str) -> String {
        timestamp.get(0..10).unwrap_or("unknown").to_string()
    }

    fn record_path(&self, record: &ExecutionRecord) -> PathBuf {
        self.root.join(Self::day_dir(&record.timestamp)).join(format!("{}.json", record.id))
    }

    fn read_all(&self) -> Result<Vec<ExecutionRecord>, StorageError> {
        let index = self.index.read().unwrap();
        let mut out = Vec::with_capacity(index.len());
        for rel in index.values() {
            let path = self.root.join(rel);
            if let Ok(text) = std::fs::read_to_string(&path) {
                if let Ok(record) = serde_json::from_str(&text) {
                    out.push(record);
                }
            }
        }
        out.sort_by(|a: &ExecutionRecord, b: &ExecutionRecord| b.timestamp.cmp(&a.timestamp));
        Ok(out)
    }
}

impl HistoryStore for FileTreeHistoryStore {
    fn save(&self, record: &ExecutionRecord) -> Result<(), StorageError> {
        let _guard = self.id_locks.entry(record.id.clone()).or_insert(());
        let path = self.record_path(record);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_vec_pretty(record)?)?;

        let rel = path
            .strip_prefix(&self.root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let mut index = self.index.write().unwrap();
        index.insert(record.id.clone(), rel);
        self.save_index(&index)?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<ExecutionRecord, StorageError> {
        let rel = {
            let index = self.index.read().unwrap();
            index.get(id).cloned().ok_or_else(|| StorageError::NotFound(id.to_string()))?
        };
        let text = std::fs::read_to_string(self.root.join(rel))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn list(&self, filter: &HistoryListFilter) -> Result<Vec<ExecutionRecord>, StorageError> {
        let all = self.read_all()?;
        Ok(all
            .into_iter()
            .filter(|r| matches_filter(r, filter))
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut index = self.index.write().unwrap();
        match index.remove(id) {
            Some(rel) => {
                let _ = std::fs::remove_file(self.root.join(rel));
                self.save_index(&index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn stats(&self) -> Result<HistoryStats, StorageError> {
        let all = self.read_all()?;
        let success_count = all.iter().filter(|r| r.status == crate::history::ExecutionStatus::Success).count() as u64;
        let failure_count = all.iter().filter(|r| r.status == crate::history::ExecutionStatus::Failure).count() as u64;
        let error_count = all.iter().filter(|r| r.status == crate::history::ExecutionStatus::Error).count() as u64;
        Ok(HistoryStats {
            backend: "file_tree".to_string(),
            total: all.len() as u64,
            success_count,
            failure_count,
            error_count,
            oldest: all.last().map(|r| r.timestamp.clone()),
            newest: all.first().map(|r| r.timestamp.clone()),
            size_bytes: None,
        })
    }

    fn clear(&self) -> Result<u64, StorageError> {
        let mut index = self.index.write().unwrap();
        let count = index.len();
        for rel in index.values() {
            let _ = std::fs::remove_file(self.root.join(rel));
        }
        index.clear();
        self.save_index(&index)?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ExecutionStatus;

    fn sample(id: &str) -> ExecutionRecord {
        ExecutionRecord {
            id: id.to_string(),
            timestamp: "2024-03-02T10:00:00Z".to_string(),
            plan_file: "p.json".to_string(),
            plan_hash: None,
            plan_name: None,
            status: ExecutionStatus::Success,
            duration_ms: 10,
            total_steps: 1,
            passed_steps: 1,
            failed_steps: 0,
            runner_version: None,
            runner_report: None,
            tags: vec![],
            metadata: Default::default(),
            created_at: "2024-03-02T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn save_get_delete_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTreeHistoryStore::new(tmp.path()).unwrap();
        store.save(&sample("r1")).unwrap();
        assert_eq!(store.get("r1").unwrap().id, "r1");
        assert!(store.delete("r1").unwrap());
        assert!(store.get("r1").is_err());
    }

    #[test]
    fn list_respects_limit_and_offset() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTreeHistoryStore::new(tmp.path()).unwrap();
        store.save(&sample("a")).unwrap();
        store.save(&sample("b")).unwrap();
        store.save(&sample("c")).unwrap();
        let page = store
            .list(&HistoryListFilter { limit: 1, offset: 1, ..Default::default() })
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = FileTreeHistoryStore::new(tmp.path()).unwrap();
            store.save(&sample("r1")).unwrap();
        }
        let reopened = FileTreeHistoryStore::new(tmp.path()).unwrap();
        assert_eq!(reopened.get("r1").unwrap().id, "r1");
    }
}
