//! The Plan Version Store: monotonic per-name versions, each `save`
//! an append, `rollback` writing a new version rather than touching old
//! ones.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use aqa_core::Plan;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanVersion {
    pub name: String,
    pub version: u32,
    pub plan: Plan,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldChange {
    pub key: String,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepChange {
    pub id: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepModification {
    pub id: String,
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanDiff {
    pub steps_added: Vec<StepChange>,
    pub steps_removed: Vec<StepChange>,
    pub steps_modified: Vec<StepModification>,
    pub config_changes: Vec<FieldChange>,
    pub meta_changes: Vec<FieldChange>,
    pub has_changes: bool,
    pub summary: String,
}

pub trait VersionStore: Send + Sync {
    fn list_plans(&self) -> Result<Vec<String>, StorageError>;
    fn list_versions(&self, name: &str) -> Result<Vec<u32>, StorageError>;
    fn get_version(&self, name: &str, version: Option<u32>) -> Result<PlanVersion, StorageError>;

    #[allow(clippy::too_many_arguments)]
    fn save(
        &self,
        name: &str,
        plan: &Plan,
        source: &str,
        description: Option<&str>,
        tags: Vec<String>,
        llm_provider: Option<&str>,
        llm_model: Option<&str>,
    ) -> Result<PlanVersion, StorageError>;

    fn diff(&self, name: &str, a: u32, b: Option<u32>) -> Result<PlanDiff, StorageError>;
    fn rollback(&self, name: &str, version: u32, description: Option<&str>) -> Result<PlanVersion, StorageError>;
}

/// File-tree backed version store: `{root}/{name}/{version}.json`. A
/// per-name mutex serializes the read-max-then-write-next sequence so two
/// concurrent `save` calls for the same plan name never collide on a
/// version number.
pub struct FileVersionStore {
    root: PathBuf,
    name_locks: DashMap<String, ()>,
    global: Mutex<()>,
}

impl FileVersionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileVersionStore {
            root: root.into(),
            name_locks: DashMap::new(),
            global: Mutex::new(()),
        }
    }

    fn plan_dir(&self, name: &str) -> PathBuf {
        self.root.join(sanitize(name))
    }

    fn version_path(&self, name: &str, version: u32) -> PathBuf {
        self.plan_dir(name).join(format!("{version}.json"))
    }

    fn existing_versions(&self, name: &str) -> Result<Vec<u32>, StorageError> {
        let dir = self.plan_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if let Ok(v) = stem.parse::<u32>() {
                    versions.push(v);
                }
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl VersionStore for FileVersionStore {
    fn list_plans(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn list_versions(&self, name: &str) -> Result<Vec<u32>, StorageError> {
        self.existing_versions(name)
    }

    fn get_version(&self, name: &str, version: Option<u32>) -> Result<PlanVersion, StorageError> {
        let versions = self.existing_versions(name)?;
        let target = match version {
            Some(v) => v,
            None => *versions
                .last()
                .ok_or_else(|| StorageError::NotFound(format!("no versions for plan '{name}'")))?,
        };
        let path = self.version_path(name, target);
        let text = std::fs::read_to_string(&path)
            .map_err(|_| StorageError::NotFound(format!("plan '{name}' version {target}")))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save(
        &self,
        name: &str,
        plan: &Plan,
        source: &str,
        description: Option<&str>,
        tags: Vec<String>,
        llm_provider: Option<&str>,
        llm_model: Option<&str>,
    ) -> Result<PlanVersion, StorageError> {
        let _global = self.global.lock().unwrap();
        let _guard = self.name_locks.entry(name.to_string()).or_insert(());

        std::fs::create_dir_all(self.plan_dir(name))?;
        let next_version = self.existing_versions(name)?.last().map(|v| v + 1).unwrap_or(1);

        let version = PlanVersion {
            name: name.to_string(),
            version: next_version,
            plan: plan.clone(),
            source: source.to_string(),
            description: description.map(|s| s.to_string()),
            tags,
            llm_provider: llm_provider.map(|s| s.to_string()),
            llm_model: llm_model.map(|s| s.to_string()),
            created_at: Utc::now().to_rfc3339(),
        };

        let path = self.version_path(name, next_version);
        std::fs::write(path, serde_json::to_string_pretty(&version)?)?;
        Ok(version)
    }

    fn diff(&self, name: &str, a: u32, b: Option<u32>) -> Result<PlanDiff, StorageError> {
        let va = self.get_version(name, Some(a))?;
        let vb = self.get_version(name, b)?;
        Ok(compute_diff(&va.plan, &vb.plan))
    }

    fn rollback(&self, name: &str, version: u32, description: Option<&str>) -> Result<PlanVersion, StorageError> {
        let source_version = self.get_version(name, Some(version))?;
        let description = description
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("rollback to version {version}"));
        self.save(
            name,
            &source_version.plan,
            "manual",
            Some(&description),
            source_version.tags.clone(),
            source_version.llm_provider.as_deref(),
            source_version.llm_model.as_deref(),
        )
    }
}

fn compute_diff(a: &Plan, b: &Plan) -> PlanDiff {
    let steps_a: BTreeMap<String, serde_json::Value> = a
        .steps
        .iter()
        .map(|s| (s.id.as_str().to_string(), serde_json::to_value(s).unwrap()))
        .collect();
    let steps_b: BTreeMap<String, serde_json::Value> = b
        .steps
        .iter()
        .map(|s| (s.id.as_str().to_string(), serde_json::to_value(s).unwrap()))
        .collect();

    let mut steps_added = Vec::new();
    let mut steps_removed = Vec::new();
    let mut steps_modified = Vec::new();

    for (id, payload) in &steps_b {
        if !steps_a.contains_key(id) {
            steps_added.push(StepChange {
                id: id.clone(),
                payload: payload.clone(),
            });
        }
    }
    for (id, payload) in &steps_a {
        if !steps_b.contains_key(id) {
            steps_removed.push(StepChange {
                id: id.clone(),
                payload: payload.clone(),
            });
        }
    }
    for (id, before) in &steps_a {
        if let Some(after) = steps_b.get(id) {
            if before != after {
                steps_modified.push(StepModification {
                    id: id.clone(),
                    before: before.clone(),
                    after: after.clone(),
                });
            }
        }
    }

    let config_changes = diff_object(
        &serde_json::to_value(&a.config).unwrap(),
        &serde_json::to_value(&b.config).unwrap(),
    );
    let meta_changes = diff_object(
        &serde_json::to_value(&a.meta).unwrap(),
        &serde_json::to_value(&b.meta).unwrap(),
    );

    let has_changes = !steps_added.is_empty()
        || !steps_removed.is_empty()
        || !steps_modified.is_empty()
        || !config_changes.is_empty()
        || !meta_changes.is_empty();

    let summary = format!(
        "{} added, {} removed, {} modified, {} config change(s), {} meta change(s)",
        steps_added.len(),
        steps_removed.len(),
        steps_modified.len(),
        config_changes.len(),
        meta_changes.len()
    );

    PlanDiff {
        steps_added,
        steps_removed,
        steps_modified,
        config_changes,
        meta_changes,
        has_changes,
        summary,
    }
}

fn diff_object(a: &serde_json::Value, b: &serde_json::Value) -> Vec<FieldChange> {
    let (Some(a), Some(b)) = (a.as_object(), b.as_object()) else {
        return Vec::new();
    };
    let mut keys: Vec<&String> = a.keys().chain(b.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let before = a.get(key);
            let after = b.get(key);
            if before == after {
                None
            } else {
                Some(FieldChange {
                    key: key.clone(),
                    before: before.cloned(),
                    after: after.cloned(),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqa_core::{Config, Meta, Step, StepId};

    fn plan_with_steps(ids: &[&str]) -> Plan {
        Plan {
            spec_version: aqa_core::SPEC_VERSION.to_string(),
            meta: Meta::generated("p").unwrap(),
            config: Config::new("http://h", 1000).unwrap(),
            steps: ids
                .iter()
                .map(|id| Step {
                    id: StepId::new(*id),
                    action: "http_request".to_string(),
                    description: None,
                    depends_on: vec![],
                    params: Default::default(),
                    assertions: vec![],
                    extract: vec![],
                    recovery_policy: None,
                })
                .collect(),
        }
    }

    #[test]
    fn save_assigns_monotonic_versions() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileVersionStore::new(tmp.path());
        let plan = plan_with_steps(&["a"]);
        let v1 = store.save("p", &plan, "manual", None, vec![], None, None).unwrap();
        let v2 = store.save("p", &plan, "manual", None, vec![], None, None).unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
    }

    #[test]
    fn get_version_none_returns_latest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileVersionStore::new(tmp.path());
        let plan = plan_with_steps(&["a"]);
        store.save("p", &plan, "manual", None, vec![], None, None).unwrap();
        store.save("p", &plan, "manual", None, vec![], None, None).unwrap();
        assert_eq!(store.get_version("p", None).unwrap().version, 2);
    }

    #[test]
    fn diff_detects_added_removed_and_modified_steps() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileVersionStore::new(tmp.path());
        store.save("p", &plan_with_steps(&["a", "b"]), "manual", None, vec![], None, None).unwrap();
        store.save("p", &plan_with_steps(&["b", "c"]), "manual", None, vec![], None, None).unwrap();

        let diff = store.diff("p", 1, Some(2)).unwrap();
        assert_eq!(diff.steps_added.len(), 1);
        assert_eq!(diff.steps_added[0].id, "c");
        assert_eq!(diff.steps_removed.len(), 1);
        assert_eq!(diff.steps_removed[0].id, "a");
        assert!(diff.has_changes);
    }

    #[test]
    fn rollback_creates_a_new_version_without_touching_old_ones() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileVersionStore::new(tmp.path());
        store.save("p", &plan_with_steps(&["a"]), "generator", None, vec![], None, None).unwrap();
        store.save("p", &plan_with_steps(&["a", "b"]), "generator", None, vec![], None, None).unwrap();

        let rolled_back = store.rollback("p", 1, None).unwrap();
        assert_eq!(rolled_back.version, 3);
        assert_eq!(rolled_back.source, "manual");
        assert_eq!(rolled_back.plan.steps.len(), 1);
        assert_eq!(store.get_version("p", Some(1)).unwrap().plan.steps.len(), 1);
    }

    #[test]
    fn no_changes_yields_empty_diff() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileVersionStore::new(tmp.path());
        let plan = plan_with_steps(&["a"]);
        store.save("p", &plan, "manual", None, vec![], None, None).unwrap();
        store.save("p", &plan, "manual", None, vec![], None, None).unwrap();
        let diff = store.diff("p", 1, Some(2)).unwrap();
        assert!(!diff.has_changes);
    }
}
