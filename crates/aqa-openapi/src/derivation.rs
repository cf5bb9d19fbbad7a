//! Deterministic test-case derivation from a flattened OpenAPI [`Spec`]:
//! negative cases, robustness cases, and latency SLA injection.

use std::collections::BTreeMap;

use aqa_core::{Assertion, AssertionType, Operator, Step, StepId, Value};

use crate::types::{Endpoint, FieldSchema, JsonType, Spec};

/// Bounds applied by the caller before generation (per-field case cap and
/// excluded path prefixes).
#[derive(Debug, Clone, Default)]
pub struct DerivationOptions {
    pub max_cases_per_field: Option<usize>,
    pub exclude_paths: Vec<String>,
    /// Only these case kinds run when non-empty: `"negative"`, `"robustness"`,
    /// `"latency"`.
    pub case_kinds: Vec<String>,
}

impl DerivationOptions {
    fn wants(&self, kind: &str) -> bool {
        self.case_kinds.is_empty() || self.case_kinds.iter().any(|k| k == kind)
    }

    fn excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

fn status_range_4xx_assertion() -> Assertion {
    Assertion {
        kind: AssertionType::StatusRange,
        operator: Operator::Eq,
        value: Value::String("4xx".to_string()),
        path: None,
    }
}

fn status_code_assertion(code: u16) -> Assertion {
    Assertion {
        kind: AssertionType::StatusCode,
        operator: Operator::Eq,
        value: Value::Number(code as f64),
        path: None,
    }
}

fn base_step(id: String, endpoint: &Endpoint, params: BTreeMap<String, Value>) -> Step {
    Step {
        id: StepId::new(id),
        action: "http_request".to_string(),
        description: None,
        depends_on: Vec::new(),
        params,
        assertions: Vec::new(),
        extract: Vec::new(),
        recovery_policy: None,
    }
}

fn request_params(endpoint: &Endpoint, body: Option<Value>) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    params.insert("method".to_string(), Value::String(endpoint.method.clone()));
    params.insert("path".to_string(), Value::String(endpoint.path.clone()));
    if let Some(body) = body {
        params.insert("body".to_string(), body);
    }
    params
}

/// Generates negative cases: one field-mutation-derived step per violation,
/// for every POST/PUT/PATCH endpoint carrying a JSON body schema.
pub fn derive_negative_cases(spec: &Spec, opts: &DerivationOptions) -> Vec<Step> {
    if !opts.wants("negative") {
        return Vec::new();
    }
    let mut steps = Vec::new();
    for endpoint in &spec.endpoints {
        if !endpoint.is_mutating() || opts.excluded(&endpoint.path) {
            continue;
        }
        let Some(body) = &endpoint.request_body else { continue };

        for field in &body.fields {
            let mutations = field_mutations(field);
            let capped: Vec<_> = match opts.max_cases_per_field {
                Some(n) => mutations.into_iter().take(n).collect(),
                None => mutations,
            };
            for (suffix, mutated_body, expected_code) in capped {
                let id = format!(
                    "negative__{}__{}__{}__{}",
                    endpoint.method.to_ascii_lowercase(),
                    sanitize(&endpoint.path),
                    field.name,
                    suffix
                );
                let mut step = base_step(id, endpoint, request_params(endpoint, Some(mutated_body)));
                step.assertions.push(match expected_code {
                    Some(code) => status_code_assertion(code),
                    None => status_range_4xx_assertion(),
                });
                steps.push(step);
            }
        }
    }
    steps
}

/// Returns `(case_suffix, mutated_body_object, expected_status_code)` for a
/// single field's set of invalid mutations, against a body consisting of
/// that field set to a valid-looking placeholder plus the mutation.
fn field_mutations(field: &FieldSchema) -> Vec<(String, Value, Option<u16>)> {
    let mut out = Vec::new();

    if field.required {
        out.push(("omit_required".to_string(), object_without(field), None));
    }

    out.push(("wrong_type".to_string(), object_with(field, wrong_type_value(field)), None));
    out.push(("empty_or_null".to_string(), object_with(field, Value::Null), None));

    if let Some(format) = &field.format {
        if matches!(format.as_str(), "email" | "uuid" | "date" | "date-time" | "uri") {
            out.push((
                format!("format_violation_{format}"),
                object_with(field, Value::String("not-a-valid-value".to_string())),
                None,
            ));
        }
    }

    if !field.enum_values.is_empty() {
        let wrong_case = field.enum_values[0].to_ascii_uppercase();
        out.push((
            "enum_wrong_case".to_string(),
            object_with(field, Value::String(wrong_case)),
            None,
        ));
        out.push((
            "enum_out_of_set".to_string(),
            object_with(field, Value::String("__not_a_member__".to_string())),
            None,
        ));
    }

    if field.minimum.is_some() || field.maximum.is_some() {
        if let Some(min) = field.minimum {
            let v = if field.exclusive_minimum { min } else { min - 1.0 };
            out.push(("numeric_lower_bound".to_string(), object_with(field, Value::Number(v)), None));
        }
        if let Some(max) = field.maximum {
            let v = if field.exclusive_maximum { max } else { max + 1.0 };
            out.push(("numeric_upper_bound".to_string(), object_with(field, Value::Number(v)), None));
        }
    }

    if field.min_length.is_some() || field.max_length.is_some() {
        if let Some(min_len) = field.min_length {
            if min_len > 0 {
                out.push((
                    "length_too_short".to_string(),
                    object_with(field, Value::String("a".repeat((min_len - 1) as usize))),
                    None,
                ));
            }
        }
        if let Some(max_len) = field.max_length {
            out.push((
                "length_too_long".to_string(),
                object_with(field, Value::String("a".repeat((max_len + 1) as usize))),
                None,
            ));
        }
    }

    out
}

fn wrong_type_value(field: &FieldSchema) -> Value {
    match field.json_type {
        JsonType::String => Value::Number(1.0),
        JsonType::Number | JsonType::Integer => Value::String("not-a-number".to_string()),
        JsonType::Boolean => Value::String("not-a-bool".to_string()),
        JsonType::Array => Value::Object(Default::default()),
        JsonType::Object => Value::Array(vec![]),
    }
}

fn placeholder_value(json_type: JsonType) -> Value {
    match json_type {
        JsonType::String => Value::String("placeholder".to_string()),
        JsonType::Number | JsonType::Integer => Value::Number(1.0),
        JsonType::Boolean => Value::Bool(true),
        JsonType::Array => Value::Array(vec![]),
        JsonType::Object => Value::Object(Default::default()),
    }
}

fn object_with(field: &FieldSchema, value: Value) -> Value {
    let mut map = indexmap::IndexMap::new();
    map.insert(field.name.clone(), value);
    Value::Object(map)
}

fn object_without(field: &FieldSchema) -> Value {
    let _ = field;
    Value::Object(indexmap::IndexMap::new())
}

/// Generates robustness cases for every non-GET endpoint: a malformed
/// Content-Type, an injected extra field (including `__proto__`), malformed
/// JSON bodies, and an oversized value.
pub fn derive_robustness_cases(spec: &Spec, opts: &DerivationOptions) -> Vec<Step> {
    if !opts.wants("robustness") {
        return Vec::new();
    }
    let mut steps = Vec::new();
    for endpoint in &spec.endpoints {
        if endpoint.method == "GET" || opts.excluded(&endpoint.path) {
            continue;
        }
        let sample_body = sample_body(endpoint);

        let mut invalid_header = request_params(endpoint, Some(sample_body.clone()));
        invalid_header.insert(
            "headers".to_string(),
            Value::Object(
                [("Content-Type".to_string(), Value::String("text/plain".to_string()))]
                    .into_iter()
                    .collect(),
            ),
        );
        steps.push(robustness_step(endpoint, "invalid_header", invalid_header));

        let mut extra_field_body = to_object(sample_body.clone());
        extra_field_body.insert("__proto__".to_string(), Value::Bool(true));
        extra_field_body.insert("__injected_extra_field__".to_string(), Value::String("x".to_string()));
        steps.push(robustness_step(
            endpoint,
            "extra_field",
            request_params(endpoint, Some(Value::Object(extra_field_body))),
        ));

        let mut malformed = request_params(endpoint, None);
        malformed.insert(
            "raw_body".to_string(),
            Value::String("{\"truncated\": tr".to_string()),
        );
        steps.push(robustness_step(endpoint, "malformed_json", malformed));

        let mut oversized_body = to_object(sample_body);
        if let Some((first_key, _)) = oversized_body.iter().next().map(|(k, v)| (k.clone(), v.clone())) {
            oversized_body.insert(first_key, Value::String("x".repeat(100 * 1024)));
        } else {
            oversized_body.insert("value".to_string(), Value::String("x".repeat(100 * 1024)));
        }
        steps.push(robustness_step(
            endpoint,
            "oversized_value",
            request_params(endpoint, Some(Value::Object(oversized_body))),
        ));
    }
    steps
}

fn sample_body(endpoint: &Endpoint) -> Value {
    let mut map = indexmap::IndexMap::new();
    if let Some(rb) = &endpoint.request_body {
        for field in &rb.fields {
            map.insert(field.name.clone(), placeholder_value(field.json_type));
        }
    }
    Value::Object(map)
}

fn to_object(value: Value) -> indexmap::IndexMap<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => indexmap::IndexMap::new(),
    }
}

fn robustness_step(endpoint: &Endpoint, kind: &str, params: BTreeMap<String, Value>) -> Step {
    let id = format!(
        "robustness__{}__{}__{}",
        endpoint.method.to_ascii_lowercase(),
        sanitize(&endpoint.path),
        kind
    );
    let mut step = base_step(id, endpoint, params);
    step.assertions.push(status_range_4xx_assertion());
    step
}

/// Latency SLA table: pattern matched against `METHOD PATH`, in priority
/// order, first match wins. Auth-like endpoints get a higher budget even
/// though they are POSTs.
const LATENCY_TABLE: &[(&str, u64)] = &[
    (r"(?i)^(POST|PUT|PATCH) .*(login|auth|token|session)", 2000),
    (r"(?i)^GET ", 500),
    (r"(?i)^(POST|PUT|PATCH) ", 1500),
    (r"(?i)^DELETE ", 1000),
];

/// Injects a `latency lt <ms>` assertion into each step whose endpoint
/// matches the SLA table, skipping steps that already assert latency.
pub fn inject_latency_assertions(spec: &Spec, steps: &mut [Step]) {
    let compiled: Vec<(regex::Regex, u64)> = LATENCY_TABLE
        .iter()
        .map(|(pat, ms)| (regex::Regex::new(pat).expect("latency table pattern is valid"), *ms))
        .collect();

    for step in steps.iter_mut() {
        if step.assertions.iter().any(|a| a.kind == AssertionType::Latency) {
            continue;
        }
        let Some(method) = step.params.get("method").and_then(|v| v.as_str()) else { continue };
        let Some(path) = step.params.get("path").and_then(|v| v.as_str()) else { continue };
        let key = format!("{method} {path}");

        let endpoint = spec
            .endpoints
            .iter()
            .find(|e| e.method == method && e.path == path);

        let budget = compiled.iter().find_map(|(re, ms)| {
            if re.is_match(&key) {
                Some(*ms)
            } else {
                None
            }
        });
        let budget = match (budget, endpoint.map(|e| e.is_auth_like())) {
            (Some(ms), Some(true)) => ms.max(2000),
            (Some(ms), _) => ms,
            (None, _) => continue,
        };

        step.assertions.push(Assertion {
            kind: AssertionType::Latency,
            operator: Operator::Lt,
            value: Value::Number(budget as f64),
            path: None,
        });
    }
}

fn sanitize(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Endpoint, FieldSchema, JsonType, RequestBodyInfo};

    fn login_spec() -> Spec {
        Spec {
            base_url: "http://h".to_string(),
            title: "t".to_string(),
            endpoints: vec![Endpoint {
                path: "/login".to_string(),
                method: "POST".to_string(),
                summary: None,
                description: None,
                parameters: vec![],
                request_body: Some(RequestBodyInfo {
                    required: true,
                    fields: vec![
                        FieldSchema {
                            name: "username".to_string(),
                            required: true,
                            json_type: JsonType::String,
                            format: None,
                            enum_values: vec![],
                            minimum: None,
                            maximum: None,
                            exclusive_minimum: false,
                            exclusive_maximum: false,
                            min_length: Some(1),
                            max_length: None,
                        },
                        FieldSchema {
                            name: "email".to_string(),
                            required: false,
                            json_type: JsonType::String,
                            format: Some("email".to_string()),
                            enum_values: vec![],
                            minimum: None,
                            maximum: None,
                            exclusive_minimum: false,
                            exclusive_maximum: false,
                            min_length: None,
                            max_length: None,
                        },
                    ],
                }),
                responses: [("200".to_string(), "ok".to_string())].into_iter().collect(),
            }],
        }
    }

    #[test]
    fn negative_cases_cover_required_type_and_format() {
        let spec = login_spec();
        let steps = derive_negative_cases(&spec, &DerivationOptions::default());
        assert!(steps.iter().any(|s| s.id.as_str().contains("omit_required")));
        assert!(steps.iter().any(|s| s.id.as_str().contains("wrong_type")));
        assert!(steps.iter().any(|s| s.id.as_str().contains("format_violation_email")));
        assert!(steps
            .iter()
            .all(|s| s.assertions.iter().any(|a| a.kind == AssertionType::StatusRange)));
    }

    #[test]
    fn max_cases_per_field_caps_output() {
        let spec = login_spec();
        let opts = DerivationOptions {
            max_cases_per_field: Some(1),
            ..Default::default()
        };
        let steps = derive_negative_cases(&spec, &opts);
        assert_eq!(steps.len(), 2); // 1 per field, 2 fields
    }

    #[test]
    fn exclude_paths_skips_matching_endpoints() {
        let spec = login_spec();
        let opts = DerivationOptions {
            exclude_paths: vec!["/login".to_string()],
            ..Default::default()
        };
        assert!(derive_negative_cases(&spec, &opts).is_empty());
    }

    #[test]
    fn robustness_cases_include_proto_pollution() {
        let spec = login_spec();
        let steps = derive_robustness_cases(&spec, &DerivationOptions::default());
        let extra = steps.iter().find(|s| s.id.as_str().contains("extra_field")).unwrap();
        let body = extra.params.get("body").unwrap();
        assert!(matches!(body, Value::Object(m) if m.contains_key("__proto__")));
    }

    #[test]
    fn latency_injection_gives_auth_endpoints_higher_budget() {
        let spec = login_spec();
        let mut steps = vec![base_step(
            "login_step".to_string(),
            &spec.endpoints[0],
            request_params(&spec.endpoints[0], None),
        )];
        inject_latency_assertions(&spec, &mut steps);
        let latency = steps[0].assertions.iter().find(|a| a.kind == AssertionType::Latency).unwrap();
        assert_eq!(latency.value.as_f64(), Some(2000.0));
    }

    #[test]
    fn latency_injection_is_idempotent() {
        let spec = login_spec();
        let mut step = base_step(
            "login_step".to_string(),
            &spec.endpoints[0],
            request_params(&spec.endpoints[0], None),
        );
        step.assertions.push(Assertion {
            kind: AssertionType::Latency,
            operator: Operator::Lt,
            value: Value::Number(42.0),
            path: None,
        });
        let mut steps = vec![step];
        inject_latency_assertions(&spec, &mut steps);
        assert_eq!(steps[0].assertions.len(), 1);
        assert_eq!(steps[0].assertions[0].value.as_f64(), Some(42.0));
    }
}
