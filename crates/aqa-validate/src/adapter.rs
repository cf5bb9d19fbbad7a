//! The Format Adapter: normalizes near-miss plan shapes (alternate root
//! keys, alternate assertion/extraction/param field names) into strict
//! UTDL before they reach the [`crate::validator::Validator`], via a fixed
//! alias table.

use serde_json::{json, Map, Value};

use crate::codes;
use crate::diagnostics::Diagnostic;

const ROOT_ALIASES: &[(&str, &str)] = &[("tests", "steps"), ("scenarios", "steps"), ("cases", "steps")];

const ASSERTION_TYPE_ALIASES: &[(&str, &str)] = &[
    ("status", "status_code"),
    ("code", "status_code"),
    ("body", "json_body"),
    ("response_body", "json_body"),
];

const ASSERTION_FIELD_ALIASES: &[(&str, &str)] = &[("expected", "value"), ("expect", "value")];

const EXTRACTION_FIELD_ALIASES: &[(&str, &str)] =
    &[("from", "source"), ("name", "target"), ("as", "target")];

const STEP_EXTRACT_ALIASES: &[&str] = &["exports"];

const HTTP_PARAM_ALIASES: &[(&str, &str)] = &[("url", "path"), ("endpoint", "path")];

/// Outcome of running the adapter: the normalized JSON value plus a record
/// of every rewrite applied, surfaced as `info`-level diagnostics so a
/// caller can see what was silently fixed up.
pub struct AdaptResult {
    pub value: Value,
    pub notes: Vec<Diagnostic>,
}

/// Normalizes `raw` into strict UTDL shape, or fails with [`codes::ADAPTER_NO_STEPS`]
/// if no step-like array can be found at all.
pub fn adapt(raw: &Value) -> Result<AdaptResult, Diagnostic> {
    let mut notes = Vec::new();
    let mut obj = match raw.as_object() {
        Some(o) => o.clone(),
        None => {
            return Err(Diagnostic::new(
                codes::ADAPTER_NO_STEPS,
                "plan root is not a JSON object; nothing to adapt",
            ))
        }
    };

    rename_root_alias(&mut obj, &mut notes);

    if !obj.contains_key("steps") {
        return Err(Diagnostic::new(
            codes::ADAPTER_NO_STEPS,
            "no 'steps', 'tests', 'scenarios', or 'cases' array found in plan",
        ));
    }

    if !obj.contains_key("spec_version") {
        obj.insert("spec_version".to_string(), json!(aqa_core::SPEC_VERSION));
        notes.push(Diagnostic::new(
            codes::ADAPTER_NO_STEPS,
            "synthesized missing spec_version",
        ));
    }

    if !obj.contains_key("meta") || !obj["meta"].is_object() {
        let id = uuid::Uuid::new_v4().to_string();
        obj.insert(
            "meta".to_string(),
            json!({
                "id": id,
                "name": "generated-plan",
                "created_at": chrono::Utc::now().to_rfc3339(),
            }),
        );
        notes.push(Diagnostic::new(codes::ADAPTER_NO_STEPS, "synthesized missing meta"));
    } else {
        let meta = obj.get_mut("meta").unwrap().as_object_mut().unwrap();
        if !meta.contains_key("id") {
            meta.insert("id".to_string(), json!(uuid::Uuid::new_v4().to_string()));
        }
        if !meta.contains_key("name") {
            meta.insert("name".to_string(), json!("generated-plan"));
        }
        if !meta.contains_key("created_at") {
            meta.insert("created_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
        }
    }

    let top_level_base_url = obj.get("base_url").and_then(Value::as_str).map(str::to_string);

    if !obj.contains_key("config") || !obj["config"].is_object() {
        let base_url = top_level_base_url.clone().unwrap_or_else(|| "http://localhost".to_string());
        obj.insert(
            "config".to_string(),
            json!({"base_url": base_url, "timeout_ms": 30_000}),
        );
        notes.push(Diagnostic::new(codes::ADAPTER_NO_STEPS, "synthesized missing config"));
    } else {
        let config = obj.get_mut("config").unwrap().as_object_mut().unwrap();
        if !config.contains_key("base_url") {
            let base_url = top_level_base_url.clone().unwrap_or_else(|| "http://localhost".to_string());
            config.insert("base_url".to_string(), json!(base_url));
        }
        if !config.contains_key("timeout_ms") {
            config.insert("timeout_ms".to_string(), json!(30_000));
        }
    }

    if let Some(Value::Array(steps)) = obj.get_mut("steps") {
        for step in steps.iter_mut() {
            normalize_step(step);
        }
        if steps.is_empty() {
            return Err(Diagnostic::new(
                codes::ADAPTER_NO_STEPS,
                "plan contains a steps array but it is empty",
            ));
        }
    } else {
        return Err(Diagnostic::new(
            codes::ADAPTER_NO_STEPS,
            "'steps' field is present but is not an array",
        ));
    }

    Ok(AdaptResult {
        value: Value::Object(obj),
        notes,
    })
}

fn rename_root_alias(obj: &mut Map<String, Value>, notes: &mut Vec<Diagnostic>) {
    if obj.contains_key("steps") {
        return;
    }
    for (alias, canonical) in ROOT_ALIASES {
        if let Some(v) = obj.remove(*alias) {
            obj.insert(canonical.to_string(), v);
            notes.push(Diagnostic::new(
                codes::ADAPTER_NO_STEPS,
                format!("renamed root field '{alias}' to '{canonical}'"),
            ));
            return;
        }
    }
}

fn normalize_step(step: &mut Value) {
    let Some(step) = step.as_object_mut() else { return };

    if !step.contains_key("id") {
        step.insert("id".to_string(), json!(uuid::Uuid::new_v4().to_string()));
    }
    if !step.contains_key("action") {
        step.insert("action".to_string(), json!("http_request"));
    }

    if let Some(params) = step.get_mut("params").and_then(|p| p.as_object_mut()) {
        rename_aliases(params, HTTP_PARAM_ALIASES);
    }

    rename_key(step, STEP_EXTRACT_ALIASES, "extract");

    if let Some(Value::Array(assertions)) = step.get_mut("assertions") {
        for a in assertions.iter_mut() {
            normalize_assertion(a);
        }
    }
    if let Some(Value::Array(extracts)) = step.get_mut("extract") {
        for e in extracts.iter_mut() {
            normalize_extraction(e);
        }
    }
}

fn normalize_assertion(assertion: &mut Value) {
    let Some(a) = assertion.as_object_mut() else { return };
    rename_aliases(a, ASSERTION_FIELD_ALIASES);

    if let Some(Value::String(t)) = a.get("type").cloned().as_ref() {
        for (alias, canonical) in ASSERTION_TYPE_ALIASES {
            if t == alias {
                a.insert("type".to_string(), json!(canonical));
                break;
            }
        }
    } else {
        for (alias, canonical) in ASSERTION_TYPE_ALIASES {
            if let Some(v) = a.remove(*alias) {
                a.insert("type".to_string(), json!(canonical));
                a.insert("value".to_string(), v);
                break;
            }
        }
    }
}

fn normalize_extraction(extraction: &mut Value) {
    let Some(e) = extraction.as_object_mut() else { return };
    rename_aliases(e, EXTRACTION_FIELD_ALIASES);
}

fn rename_aliases(obj: &mut Map<String, Value>, aliases: &[(&str, &str)]) {
    for (alias, canonical) in aliases {
        if obj.contains_key(*canonical) {
            continue;
        }
        if let Some(v) = obj.remove(*alias) {
            obj.insert(canonical.to_string(), v);
        }
    }
}

fn rename_key(obj: &mut Map<String, Value>, aliases: &[&str], canonical: &str) {
    if obj.contains_key(canonical) {
        return;
    }
    for alias in aliases {
        if let Some(v) = obj.remove(*alias) {
            obj.insert(canonical.to_string(), v);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_root_alias_to_steps() {
        let raw = json!({"tests": [{"action": "http_request"}]});
        let result = adapt(&raw).unwrap();
        assert!(result.value.get("steps").is_some());
        assert!(result.value.get("tests").is_none());
    }

    #[test]
    fn synthesizes_missing_meta_and_config() {
        let raw = json!({"steps": [{"action": "http_request"}]});
        let result = adapt(&raw).unwrap();
        assert!(result.value["meta"]["id"].is_string());
        assert_eq!(result.value["config"]["base_url"], "http://localhost");
    }

    #[test]
    fn normalizes_assertion_type_aliases() {
        let raw = json!({
            "steps": [{
                "action": "http_request",
                "assertions": [{"status": 200, "expected": 200}]
            }]
        });
        let result = adapt(&raw).unwrap();
        let assertion = &result.value["steps"][0]["assertions"][0];
        assert_eq!(assertion["type"], "status_code");
        assert_eq!(assertion["value"], 200);
    }

    #[test]
    fn normalizes_assertion_field_alias_with_explicit_type() {
        let raw = json!({
            "steps": [{
                "action": "http_request",
                "assertions": [{"type": "status", "expect": 200}]
            }]
        });
        let result = adapt(&raw).unwrap();
        let assertion = &result.value["steps"][0]["assertions"][0];
        assert_eq!(assertion["type"], "status_code");
        assert_eq!(assertion["value"], 200);
    }

    #[test]
    fn normalizes_extraction_aliases() {
        let raw = json!({
            "steps": [{
                "action": "http_request",
                "exports": [{"from": "body", "name": "token"}]
            }]
        });
        let result = adapt(&raw).unwrap();
        let extraction = &result.value["steps"][0]["extract"][0];
        assert_eq!(extraction["source"], "body");
        assert_eq!(extraction["target"], "token");
    }

    #[test]
    fn normalizes_http_param_url_alias() {
        let raw = json!({
            "steps": [{"action": "http_request", "params": {"url": "/login"}}]
        });
        let result = adapt(&raw).unwrap();
        assert_eq!(result.value["steps"][0]["params"]["path"], "/login");
    }

    #[test]
    fn synthesizes_config_base_url_from_top_level_base_url() {
        let raw = json!({
            "steps": [{"action": "http_request"}],
            "base_url": "http://custom.example.com"
        });
        let result = adapt(&raw).unwrap();
        assert_eq!(result.value["config"]["base_url"], "http://custom.example.com");
    }

    #[test]
    fn empty_steps_array_is_rejected() {
        let raw = json!({"steps": []});
        assert!(adapt(&raw).is_err());
    }

    #[test]
    fn non_object_root_is_rejected() {
        let raw = json!([1, 2, 3]);
        assert!(adapt(&raw).is_err());
    }

    #[test]
    fn idempotent_on_already_normalized_plan() {
        let raw = json!({
            "spec_version": "0.1",
            "meta": {"id": "p1", "name": "x", "created_at": "2024-01-01T00:00:00Z"},
            "config": {"base_url": "http://h", "timeout_ms": 1000},
            "steps": [{"id": "a", "action": "http_request", "params": {"path": "/x"}}]
        });
        let once = adapt(&raw).unwrap().value;
        let twice = adapt(&once).unwrap().value;
        assert_eq!(once, twice);
    }
}
