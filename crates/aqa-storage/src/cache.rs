//! The Plan Cache: one global lock over the hash->filename index, and
//! per-hash locks serializing access to individual entries.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aqa_core::Plan;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::hash::fingerprint;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    hash: String,
    created_at: String,
    summary: String,
    base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    plan: Plan,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
}

/// Generation-cache contract consumed by the Generator.
pub trait CacheStore: Send + Sync {
    fn get(
        &self,
        requirement: &str,
        base_url: &str,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<Option<Plan>, StorageError>;

    fn store(
        &self,
        requirement: &str,
        base_url: &str,
        plan: &Plan,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, StorageError>;

    fn invalidate(&self, hash: &str) -> Result<bool, StorageError>;
    fn clear(&self) -> Result<usize, StorageError>;
    fn stats(&self) -> CacheStats;
}

/// File-backed cache: each entry is one (optionally gzipped) JSON blob,
/// indexed by `index.json` mapping hash -> blob filename.
pub struct FileCacheStore {
    dir: PathBuf,
    enabled: bool,
    gzip: bool,
    ttl: Option<Duration>,
    index: RwLock<HashMap<String, String>>,
    hash_locks: DashMap<String, ()>,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Result<Self, StorageError> {
        let dir = dir.into();
        if enabled {
            std::fs::create_dir_all(&dir)?;
        }
        let store = FileCacheStore {
            index: RwLock::new(Self::load_index(&dir)?),
            dir,
            enabled,
            gzip: false,
            ttl: None,
            hash_locks: DashMap::new(),
        };
        Ok(store)
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    fn load_index(dir: &Path) -> Result<HashMap<String, String>, StorageError> {
        let path = dir.join("index.json");
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    fn save_index(&self, index: &HashMap<String, String>) -> Result<(), StorageError> {
        let path = self.dir.join("index.json");
        let text = serde_json::to_string_pretty(index)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    fn blob_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    fn write_blob(&self, filename: &str, entry: &CacheEntry) -> Result<(), StorageError> {
        let json = serde_json::to_vec(entry)?;
        let path = self.blob_path(filename);
        if self.gzip {
            let file = std::fs::File::create(path)?;
            let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            encoder.write_all(&json)?;
            encoder.finish()?;
        } else {
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn read_blob(&self, filename: &str) -> Result<CacheEntry, StorageError> {
        let path = self.blob_path(filename);
        let bytes = if self.gzip || filename.ends_with(".gz") {
            let file = std::fs::File::open(&path)?;
            let mut decoder = flate2::read::GzDecoder::new(file);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            out
        } else {
            std::fs::read(&path)?
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        let Some(ttl) = self.ttl else { return false };
        let Ok(created) = chrono::DateTime::parse_from_rfc3339(&entry.created_at) else {
            return false;
        };
        let age = Utc::now().signed_duration_since(created.with_timezone(&Utc));
        age.to_std().map(|age| age > ttl).unwrap_or(false)
    }
}

impl CacheStore for FileCacheStore {
    fn get(
        &self,
        requirement: &str,
        base_url: &str,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<Option<Plan>, StorageError> {
        if !self.enabled {
            return Ok(None);
        }
        let hash = fingerprint(requirement, base_url, provider, model);
        let _guard = self.hash_locks.entry(hash.clone()).or_insert(());

        let filename = {
            let index = self.index.read().unwrap();
            match index.get(&hash) {
                Some(f) => f.clone(),
                None => return Ok(None),
            }
        };

        if !self.blob_path(&filename).exists() {
            let mut index = self.index.write().unwrap();
            index.remove(&hash);
            self.save_index(&index)?;
            return Ok(None);
        }

        match self.read_blob(&filename) {
            Ok(entry) if self.is_expired(&entry) => Ok(None),
            Ok(entry) => Ok(Some(entry.plan)),
            Err(_) => Ok(None),
        }
    }

    fn store(
        &self,
        requirement: &str,
        base_url: &str,
        plan: &Plan,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, StorageError> {
        if !self.enabled {
            return Ok(String::new());
        }
        let hash = fingerprint(requirement, base_url, provider, model);
        let _guard = self.hash_locks.entry(hash.clone()).or_insert(());

        let ext = if self.gzip { "json.gz" } else { "json" };
        let filename = format!("{hash}.{ext}");

        let entry = CacheEntry {
            hash: hash.clone(),
            created_at: Utc::now().to_rfc3339(),
            summary: requirement.chars().take(120).collect(),
            base_url: base_url.to_string(),
            provider: provider.map(|s| s.to_string()),
            model: model.map(|s| s.to_string()),
            plan: plan.clone(),
        };
        self.write_blob(&filename, &entry)?;

        let mut index = self.index.write().unwrap();
        index.insert(hash.clone(), filename);
        self.save_index(&index)?;

        Ok(hash)
    }

    fn invalidate(&self, hash: &str) -> Result<bool, StorageError> {
        let mut index = self.index.write().unwrap();
        match index.remove(hash) {
            Some(filename) => {
                let _ = std::fs::remove_file(self.blob_path(&filename));
                self.save_index(&index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&self) -> Result<usize, StorageError> {
        let mut index = self.index.write().unwrap();
        let count = index.len();
        for filename in index.values() {
            let _ = std::fs::remove_file(self.blob_path(filename));
        }
        index.clear();
        self.save_index(&index)?;
        Ok(count)
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            entries: self.index.read().unwrap().len(),
        }
    }
}

#[allow(dead_code)]
fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqa_core::{Config, Meta};

    fn sample_plan() -> Plan {
        Plan {
            spec_version: aqa_core::SPEC_VERSION.to_string(),
            meta: Meta::generated("p").unwrap(),
            config: Config::new("http://h", 1000).unwrap(),
            steps: vec![],
        }
    }

    #[test]
    fn store_then_get_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(tmp.path(), true).unwrap();
        let plan = sample_plan();
        store.store("do a thing", "http://h", &plan, None, None).unwrap();
        let found = store.get("Do A Thing", "HTTP://H", None, None).unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn provider_model_partition_cache_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(tmp.path(), true).unwrap();
        let plan = sample_plan();
        store.store("req", "url", &plan, Some("openai"), Some("gpt-5")).unwrap();
        assert!(store.get("req", "url", None, None).unwrap().is_none());
        assert!(store.get("req", "url", Some("openai"), Some("gpt-5")).unwrap().is_some());
    }

    #[test]
    fn disabled_cache_always_misses() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(tmp.path(), false).unwrap();
        let plan = sample_plan();
        store.store("req", "url", &plan, None, None).unwrap();
        assert!(store.get("req", "url", None, None).unwrap().is_none());
    }

    #[test]
    fn invalidate_removes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(tmp.path(), true).unwrap();
        let plan = sample_plan();
        let hash = store.store("req", "url", &plan, None, None).unwrap();
        assert!(store.invalidate(&hash).unwrap());
        assert!(store.get("req", "url", None, None).unwrap().is_none());
    }

    #[test]
    fn gzip_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(tmp.path(), true).unwrap().with_gzip(true);
        let plan = sample_plan();
        store.store("req", "url", &plan, None, None).unwrap();
        assert!(store.get("req", "url", None, None).unwrap().is_some());
    }
}
