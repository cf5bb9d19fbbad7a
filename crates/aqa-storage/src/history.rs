//! Execution History / Storage: a backend-agnostic trait plus
//! concrete embedded-DB, file-tree, and object-store implementations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failure,
    Error,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failure => "failure",
            ExecutionStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub timestamp: String,
    pub plan_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    pub status: ExecutionStatus,
    pub duration_ms: u64,
    pub total_steps: u32,
    pub passed_steps: u32,
    pub failed_steps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_report: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryListFilter {
    pub limit: usize,
    pub offset: usize,
    pub status: Option<ExecutionStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryStats {
    pub backend: String,
    pub total: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub error_count: u64,
    pub oldest: Option<String>,
    pub newest: Option<String>,
    pub size_bytes: Option<u64>,
}

/// Backend-agnostic execution history contract.
///
/// `save` is an upsert on `id`; `list` returns most-recent-first and
/// applies every supplied filter as an AND.
pub trait HistoryStore: Send + Sync {
    fn save(&self, record: &ExecutionRecord) -> Result<(), StorageError>;
    fn get(&self, id: &str) -> Result<ExecutionRecord, StorageError>;
    fn list(&self, filter: &HistoryListFilter) -> Result<Vec<ExecutionRecord>, StorageError>;
    fn delete(&self, id: &str) -> Result<bool, StorageError>;
    fn stats(&self) -> Result<HistoryStats, StorageError>;
    fn clear(&self) -> Result<u64, StorageError>;

    fn search(&self, text: &str) -> Result<Vec<ExecutionRecord>, StorageError> {
        let all = self.list(&HistoryListFilter {
            limit: usize::MAX,
            ..Default::default()
        })?;
        let needle = text.to_ascii_lowercase();
        Ok(all
            .into_iter()
            .filter(|r| {
                r.plan_file.to_ascii_lowercase().contains(&needle)
                    || r.plan_name.as_deref().unwrap_or_default().to_ascii_lowercase().contains(&needle)
            })
            .collect())
    }

    fn get_by_plan_hash(&self, hash: &str) -> Result<Vec<ExecutionRecord>, StorageError> {
        let all = self.list(&HistoryListFilter {
            limit: usize::MAX,
            ..Default::default()
        })?;
        Ok(all.into_iter().filter(|r| r.plan_hash.as_deref() == Some(hash)).collect())
    }

    fn get_latest(&self) -> Result<Option<ExecutionRecord>, StorageError> {
        let mut all = self.list(&HistoryListFilter {
            limit: 1,
            ..Default::default()
        })?;
        Ok(if all.is_empty() { None } else { Some(all.remove(0)) })
    }
}

pub(crate) fn matches_filter(record: &ExecutionRecord, filter: &HistoryListFilter) -> bool {
    if let Some(status) = filter.status {
        if record.status != status {
            return false;
        }
    }
    if let Some(start) = &filter.start_date {
        if record.timestamp.as_str() < start.as_str() {
            return false;
        }
    }
    if let Some(end) = &filter.end_date {
        if record.timestamp.as_str() > end.as_str() {
            return false;
        }
    }
    if !filter.tags.is_empty() && !filter.tags.iter().all(|t| record.tags.contains(t)) {
        return false;
    }
    true
}
