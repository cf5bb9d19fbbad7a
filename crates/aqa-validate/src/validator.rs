//! The plan validator: shape -> spec version -> uniqueness -> dependency
//! integrity -> DAG acyclicity -> action sanity -> execution limits ->
//! empty-plan check.

use std::collections::{HashMap, HashSet};

use aqa_core::Plan;
use serde::Serialize;

use crate::codes;
use crate::dag::{self, DagResult};
use crate::diagnostics::Diagnostic;
use crate::limits::ExecutionLimits;
use crate::modes::ValidationMode;
use crate::codes::Severity;

/// Summary counters surfaced alongside a successful validation (used by the
/// `/validate` control-API endpoint).
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanStats {
    pub steps: usize,
    pub assertions: usize,
    pub extractions: usize,
}

/// Outcome of running the validator over a candidate plan.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub ok: bool,
    pub plan: Option<Plan>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub stats: Option<PlanStats>,
}

pub struct Validator {
    pub mode: ValidationMode,
    pub limits: ExecutionLimits,
}

impl Validator {
    pub fn new(mode: ValidationMode) -> Self {
        Validator {
            mode,
            limits: ExecutionLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parses `text` as JSON, then validates it as a UTDL plan.
    pub fn validate_json(&self, text: &str) -> ValidationResult {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(raw) => self.validate(&raw),
            Err(e) => {
                let mut result = ValidationResult {
                    ok: false,
                    plan: None,
                    errors: vec![Diagnostic::new(
                        codes::SHAPE_ERROR,
                        format!("invalid JSON: {e}"),
                    )
                    .with_pointer("")],
                    warnings: Vec::new(),
                    stats: None,
                };
                self.finalize(&mut result);
                result
            }
        }
    }

    /// Validates a plan already parsed into a generic JSON value.
    pub fn validate(&self, raw: &serde_json::Value) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let obj = match raw.as_object() {
            Some(o) => o,
            None => {
                errors.push(
                    Diagnostic::new(codes::SHAPE_ERROR, "plan root must be a JSON object")
                        .with_pointer(""),
                );
                let mut result = ValidationResult {
                    ok: false,
                    plan: None,
                    errors,
                    warnings,
                    stats: None,
                };
                self.finalize(&mut result);
                return result;
            }
        };

        for (key, pointer) in [
            ("spec_version", "/spec_version"),
            ("meta", "/meta"),
            ("config", "/config"),
            ("steps", "/steps"),
        ] {
            if !obj.contains_key(key) {
                errors.push(
                    Diagnostic::new(codes::SHAPE_ERROR, format!("missing required field '{key}'"))
                        .with_pointer(pointer),
                );
            }
        }
        if self.mode == ValidationMode::Strict {
            let known: HashSet<&str> = ["spec_version", "meta", "config", "steps"].into();
            for key in obj.keys() {
                if !known.contains(key.as_str()) {
                    errors.push(
                        Diagnostic::new(
                            codes::UNSUPPORTED_ROOT_KEY,
                            format!("unexpected top-level key '{key}' in strict mode"),
                        )
                        .with_pointer(format!("/{key}")),
                    );
                }
            }
        }
        if !errors.is_empty() {
            let mut result = ValidationResult {
                ok: false,
                plan: None,
                errors,
                warnings,
                stats: None,
            };
            self.finalize(&mut result);
            return result;
        }

        let plan: Plan = match serde_json::from_value(raw.clone()) {
            Ok(p) => p,
            Err(e) => {
                errors.push(
                    Diagnostic::new(codes::SHAPE_ERROR, format!("plan does not match UTDL shape: {e}"))
                        .with_pointer(""),
                );
                let mut result = ValidationResult {
                    ok: false,
                    plan: None,
                    errors,
                    warnings,
                    stats: None,
                };
                self.finalize(&mut result);
                return result;
            }
        };

        self.validate_plan(plan, errors, warnings)
    }

    fn validate_plan(
        &self,
        plan: Plan,
        mut errors: Vec<Diagnostic>,
        mut warnings: Vec<Diagnostic>,
    ) -> ValidationResult {
        // 2. Spec version.
        if plan.spec_version != aqa_core::SPEC_VERSION {
            errors.push(
                Diagnostic::new(
                    codes::UNSUPPORTED_SPEC_VERSION,
                    format!(
                        "unsupported spec_version '{}', only \"{}\" is accepted",
                        plan.spec_version,
                        aqa_core::SPEC_VERSION
                    ),
                )
                .with_pointer("/spec_version"),
            );
        }

        // 3. Unique, non-empty step ids.
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, step) in plan.steps.iter().enumerate() {
            if step.id.as_str().trim().is_empty() {
                errors.push(
                    Diagnostic::new(codes::EMPTY_STEP_ID, "step id must be non-empty and not all whitespace")
                        .with_pointer(format!("/steps/{i}/id")),
                );
            }
            if let Some(&first) = seen.get(step.id.as_str()) {
                errors.push(
                    Diagnostic::new(
                        codes::DUPLICATE_STEP_ID,
                        format!(
                            "step id '{}' duplicated at indices {} and {}",
                            step.id, first, i
                        ),
                    )
                    .with_pointer(format!("/steps/{i}/id")),
                );
            } else {
                seen.insert(step.id.as_str(), i);
            }
        }

        let known_ids: Vec<String> = plan.steps.iter().map(|s| s.id.0.clone()).collect();
        let known_set: HashSet<&str> = known_ids.iter().map(|s| s.as_str()).collect();

        // 4. Dependency integrity.
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for (i, step) in plan.steps.iter().enumerate() {
            let mut edges = Vec::new();
            for (j, dep) in step.depends_on.iter().enumerate() {
                if dep.as_str() == step.id.as_str() {
                    errors.push(
                        Diagnostic::new(
                            codes::SELF_DEPENDENCY,
                            format!("step '{}' lists itself in depends_on", step.id),
                        )
                        .with_pointer(format!("/steps/{i}/depends_on/{j}")),
                    );
                    continue;
                }
                if !known_set.contains(dep.as_str()) {
                    let suggestion = dag::nearest_ids(dep.as_str(), &known_ids, 3);
                    let mut d = Diagnostic::new(
                        codes::UNKNOWN_DEPENDENCY,
                        format!("step '{}' depends on unknown step '{}'", step.id, dep),
                    )
                    .with_pointer(format!("/steps/{i}/depends_on/{j}"));
                    if !suggestion.is_empty() {
                        d = d.with_suggestion(format!("did you mean: {}", suggestion.join(", ")));
                    }
                    if self.mode == ValidationMode::Lenient {
                        d = d.with_severity(Severity::Warning);
                    }
                    errors.push(d);
                    continue;
                }
                edges.push(dep.0.clone());
            }
            adjacency.insert(step.id.0.clone(), edges);
        }

        // 5. Acyclic DAG (only over known-good edges; unknown/self already
        // reported above).
        if let DagResult::Cycle(path) = dag::find_cycle(&known_ids, &adjacency) {
            errors.push(Diagnostic::new(
                codes::CYCLE_DETECTED,
                format!("dependency cycle detected: {}", path.join(" -> ")),
            )
            .with_pointer("/steps"));
        }

        // 6. Action sanity.
        for (i, step) in plan.steps.iter().enumerate() {
            if step.has_unknown_action() {
                warnings.push(
                    Diagnostic::new(
                        codes::UNKNOWN_ACTION,
                        format!("step '{}' uses non-standard action '{}'", step.id, step.action),
                    )
                    .with_severity(Severity::Warning)
                    .with_pointer(format!("/steps/{i}/action")),
                );
            }
        }

        // 7. Execution limits.
        if plan.steps.len() > self.limits.max_steps {
            errors.push(Diagnostic::new(
                codes::EXCEEDS_MAX_STEPS,
                format!(
                    "plan has {} steps, exceeding the configured limit of {}",
                    plan.steps.len(),
                    self.limits.max_steps
                ),
            )
            .with_pointer("/steps"));
        }
        let total_retries: u32 = plan
            .steps
            .iter()
            .map(|s| s.recovery_policy.as_ref().map(|p| p.max_attempts).unwrap_or(1))
            .sum();
        if total_retries > self.limits.retry_budget {
            errors.push(Diagnostic::new(
                codes::EXCEEDS_RETRY_BUDGET,
                format!(
                    "plan's total retry budget {} exceeds the configured limit of {}",
                    total_retries, self.limits.retry_budget
                ),
            )
            .with_pointer("/steps"));
        }
        if plan.config.timeout_ms > self.limits.step_timeout_ms {
            errors.push(Diagnostic::new(
                codes::EXCEEDS_STEP_TIMEOUT,
                format!(
                    "config.timeout_ms {} exceeds the configured per-step limit of {}",
                    plan.config.timeout_ms, self.limits.step_timeout_ms
                ),
            )
            .with_pointer("/config/timeout_ms"));
        }

        // 8. Empty plan.
        if plan.steps.is_empty() {
            let mut d = Diagnostic::new(codes::EMPTY_PLAN, "plan has no steps");
            if self.mode == ValidationMode::Lenient {
                d = d.with_severity(Severity::Warning);
            }
            errors.push(d);
        }

        let stats = PlanStats {
            steps: plan.steps.len(),
            assertions: plan.steps.iter().map(|s| s.assertions.len()).sum(),
            extractions: plan.steps.iter().map(|s| s.extract.len()).sum(),
        };

        let mut result = ValidationResult {
            ok: true,
            plan: Some(plan),
            errors,
            warnings,
            stats: Some(stats),
        };
        self.finalize(&mut result);
        result
    }

    /// Splits mixed-severity diagnostics into `errors`/`warnings`, applying
    /// strict-mode promotion, and sets `ok` accordingly.
    fn finalize(&self, result: &mut ValidationResult) {
        let mut all = std::mem::take(&mut result.errors);
        all.append(&mut result.warnings);

        if self.mode == ValidationMode::Strict {
            for d in all.iter_mut() {
                d.severity = Severity::Error;
            }
        }

        let (errors, warnings): (Vec<_>, Vec<_>) = all.into_iter().partition(|d| d.is_error());
        result.ok = errors.is_empty();
        result.errors = errors;
        result.warnings = warnings;
        if !result.ok {
            result.plan = None;
            result.stats = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator(mode: ValidationMode) -> Validator {
        Validator::new(mode)
    }

    fn happy_path() -> serde_json::Value {
        json!({
            "spec_version": "0.1",
            "meta": {"id": "p1", "name": "x", "created_at": "2024-01-01T00:00:00Z"},
            "config": {"base_url": "http://h", "timeout_ms": 1000},
            "steps": [{"id": "a", "action": "http_request", "params": {"method": "GET", "path": "/"}}]
        })
    }

    #[test]
    fn s1_happy_path_validates_clean() {
        let result = validator(ValidationMode::Default).validate(&happy_path());
        assert!(result.ok);
        assert!(result.errors.is_empty());
        let stats = result.stats.unwrap();
        assert_eq!(stats.steps, 1);
        assert_eq!(stats.assertions, 0);
        assert_eq!(stats.extractions, 0);
    }

    #[test]
    fn s2_cycle_is_rejected_with_path() {
        let mut plan = happy_path();
        plan["steps"] = json!([
            {"id": "a", "action": "http_request", "depends_on": ["b"], "params": {}},
            {"id": "b", "action": "http_request", "depends_on": ["a"], "params": {}},
        ]);
        let result = validator(ValidationMode::Default).validate(&plan);
        assert!(!result.ok);
        let cycle = result.errors.iter().find(|e| e.code == codes::CYCLE_DETECTED).unwrap();
        assert!(cycle.message.contains("a -> b -> a") || cycle.message.contains("b -> a -> b"));
        assert_eq!(cycle.pointer.as_deref(), Some("/steps"));
    }

    #[test]
    fn s3_unknown_dependency_default_vs_lenient() {
        let mut plan = happy_path();
        plan["steps"] = json!([
            {"id": "a", "action": "http_request", "depends_on": ["ghost"], "params": {}},
        ]);

        let strict_like = validator(ValidationMode::Default).validate(&plan);
        assert!(!strict_like.ok);

        let lenient = validator(ValidationMode::Lenient).validate(&plan);
        assert!(lenient.ok);
        assert_eq!(lenient.warnings.len(), 1);
        assert!(lenient.warnings[0].suggestion.is_some());
    }

    #[test]
    fn self_dependency_is_always_an_error() {
        let mut plan = happy_path();
        plan["steps"] = json!([
            {"id": "a", "action": "http_request", "depends_on": ["a"], "params": {}},
        ]);
        let result = validator(ValidationMode::Lenient).validate(&plan);
        assert!(!result.ok);
        assert!(result.errors.iter().any(|e| e.code == codes::SELF_DEPENDENCY));
    }

    #[test]
    fn strict_mode_promotes_warnings_to_errors() {
        let mut plan = happy_path();
        plan["steps"][0]["action"] = json!("custom_action");
        let lenient = validator(ValidationMode::Default).validate(&plan);
        assert!(lenient.ok);

        let strict = validator(ValidationMode::Strict).validate(&plan);
        assert!(!strict.ok);
    }

    #[test]
    fn empty_plan_errors_by_default_warns_when_lenient() {
        let mut plan = happy_path();
        plan["steps"] = json!([]);
        assert!(!validator(ValidationMode::Default).validate(&plan).ok);
        assert!(validator(ValidationMode::Lenient).validate(&plan).ok);
    }

    #[test]
    fn rejects_non_object_root() {
        let result = validator(ValidationMode::Default).validate(&json!([1, 2, 3]));
        assert!(!result.ok);
        assert_eq!(result.errors[0].code, codes::SHAPE_ERROR);
    }

    #[test]
    fn blank_and_whitespace_step_ids_are_rejected() {
        let mut plan = happy_path();
        plan["steps"] = json!([
            {"id": "", "action": "http_request", "params": {}},
            {"id": "   ", "action": "http_request", "params": {}},
        ]);
        let result = validator(ValidationMode::Default).validate(&plan);
        assert!(!result.ok);
        let empty_id_errors: Vec<_> = result.errors.iter().filter(|e| e.code == codes::EMPTY_STEP_ID).collect();
        assert_eq!(empty_id_errors.len(), 2);
        assert_eq!(empty_id_errors[0].pointer.as_deref(), Some("/steps/0/id"));
        assert_eq!(empty_id_errors[1].pointer.as_deref(), Some("/steps/1/id"));
    }
}
