//! The UTDL plan data model: [`Plan`], [`Meta`], [`Config`], [`Step`],
//! [`Assertion`], [`Extraction`], [`RecoveryPolicy`].
//!
//! This module is the validation boundary for per-field constraints only
//! (types, ranges, enums). Cross-entity constraints -- unique step ids,
//! `depends_on` reference integrity, DAG acyclicity -- are enforced by
//! `aqa_validate::Validator`, not here.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::id::StepId;
use crate::value::Value;

/// The only `spec_version` this implementation accepts.
pub const SPEC_VERSION: &str = "0.1";

/// Action kinds known to the validator well enough to skip the "unknown
/// action" warning. Frozen per spec_version "0.1".
pub const KNOWN_ACTIONS: &[&str] = &["http_request", "wait", "sleep"];

/// Root object of a UTDL plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub spec_version: String,
    pub meta: Meta,
    pub config: Config,
    pub steps: Vec<Step>,
}

impl Plan {
    /// Returns the set of declared step ids, in declaration order.
    pub fn step_ids(&self) -> Vec<&StepId> {
        self.steps.iter().map(|s| &s.id).collect()
    }

    /// Looks up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id.as_str() == id)
    }
}

/// Plan-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Meta {
    /// Builds metadata for a newly generated plan, filling in an id and
    /// timestamp the way the Generator does for LLM output that omits them.
    pub fn generated(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::EmptyPlanName);
        }
        Ok(Meta {
            id: Uuid::new_v4().to_string(),
            name,
            description: None,
            tags: BTreeSet::new(),
            created_at: Utc::now(),
        })
    }
}

/// Plan-level execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Insertion order is preserved (an `IndexMap`, not a `BTreeMap`) since
    /// header order is part of a deterministic request replay.
    #[serde(default)]
    pub global_headers: IndexMap<String, String>,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
}

impl Config {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, CoreError> {
        if timeout_ms < 100 {
            return Err(CoreError::TimeoutTooLow(timeout_ms));
        }
        Ok(Config {
            base_url: base_url.into(),
            timeout_ms,
            global_headers: IndexMap::new(),
            variables: BTreeMap::new(),
        })
    }
}

/// A single executor action within a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<StepId>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    #[serde(default)]
    pub extract: Vec<Extraction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_policy: Option<RecoveryPolicy>,
}

impl Step {
    /// True if `action` is outside the frozen known-good set (triggers a
    /// validator warning, never an error).
    pub fn has_unknown_action(&self) -> bool {
        !KNOWN_ACTIONS.contains(&self.action.as_str())
    }
}

/// The kind of assertion type checked against a step's executed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionType {
    StatusCode,
    JsonBody,
    Header,
    Latency,
    /// Derived negative/robustness cases assert a coarse status class
    /// (e.g. "4xx") rather than an exact code -- a first-class variant,
    /// not a pair of bounds tacked onto `StatusCode`.
    StatusRange,
}

/// The comparison operator an assertion applies between actual and `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Gt,
    Contains,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(rename = "type")]
    pub kind: AssertionType,
    pub operator: Operator,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Body,
    Header,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub source: ExtractionSource,
    pub path: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    Retry,
    FailFast,
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    pub strategy: RecoveryStrategy,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub backoff_factor: f64,
}

impl RecoveryPolicy {
    pub fn new(
        strategy: RecoveryStrategy,
        max_attempts: u32,
        backoff_ms: u64,
        backoff_factor: f64,
    ) -> Result<Self, CoreError> {
        if !(1..=10).contains(&max_attempts) {
            return Err(CoreError::MaxAttemptsOutOfRange(max_attempts));
        }
        if backoff_factor < 1.0 {
            return Err(CoreError::BackoffFactorTooLow(backoff_factor));
        }
        Ok(RecoveryPolicy {
            strategy,
            max_attempts,
            backoff_ms,
            backoff_factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_meta_rejects_empty_name() {
        assert!(Meta::generated("").is_err());
        assert!(Meta::generated("  ").is_err());
    }

    #[test]
    fn config_rejects_low_timeout() {
        assert!(Config::new("http://h", 99).is_err());
        assert!(Config::new("http://h", 100).is_ok());
    }

    #[test]
    fn recovery_policy_validates_bounds() {
        assert!(RecoveryPolicy::new(RecoveryStrategy::Retry, 0, 0, 2.0).is_err());
        assert!(RecoveryPolicy::new(RecoveryStrategy::Retry, 11, 0, 2.0).is_err());
        assert!(RecoveryPolicy::new(RecoveryStrategy::Retry, 3, 0, 0.5).is_err());
        assert!(RecoveryPolicy::new(RecoveryStrategy::Retry, 3, 500, 2.0).is_ok());
    }

    #[test]
    fn unknown_action_is_detected() {
        let step = Step {
            id: StepId::new("s"),
            action: "custom_thing".to_string(),
            description: None,
            depends_on: vec![],
            params: BTreeMap::new(),
            assertions: vec![],
            extract: vec![],
            recovery_policy: None,
        };
        assert!(step.has_unknown_action());
    }

    #[test]
    fn plan_json_roundtrip() {
        let json = serde_json::json!({
            "spec_version": "0.1",
            "meta": {"id": "p1", "name": "x", "created_at": "2024-01-01T00:00:00Z"},
            "config": {"base_url": "http://h", "timeout_ms": 1000},
            "steps": [{"id": "a", "action": "http_request", "params": {"method": "GET", "path": "/"}}]
        });
        let plan: Plan = serde_json::from_value(json).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.step("a").unwrap().action, "http_request");
    }
}
