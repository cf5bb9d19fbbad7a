//! Fixed prompt templates: system prompt, user prompt, and correction
//! prompt, composed with plain `format!` rather than a templating engine.

const SCHEMA_DESCRIPTION: &str = r#"UTDL plan schema (spec_version "0.1"):
{
  "spec_version": "0.1",
  "meta": {"id": string, "name": string, "description"?: string, "tags"?: [string], "created_at": RFC3339 timestamp},
  "config": {"base_url": string, "timeout_ms": integer >= 100, "global_headers"?: {string: string}, "variables"?: {string: any}},
  "steps": [
    {
      "id": string (unique),
      "action": "http_request" | "wait" | "sleep",
      "description"?: string,
      "depends_on"?: [string] (must reference earlier step ids, no cycles),
      "params": {string: any} (action-specific; http_request needs "method" and "path"),
      "assertions"?: [{"type": "status_code"|"json_body"|"header"|"latency"|"status_range", "operator": "eq"|"neq"|"lt"|"gt"|"contains", "value": any, "path"?: string}],
      "extract"?: [{"source": "body"|"header", "path": string, "target": string}],
      "recovery_policy"?: {"strategy": "retry"|"fail_fast"|"ignore", "max_attempts": integer 1-10, "backoff_ms": integer, "backoff_factor": float >= 1.0}
    }
  ]
}
Return ONLY the JSON object. No markdown fences, no commentary."#;

pub fn system_prompt() -> String {
    format!(
        "You are a senior API test engineer. You generate UTDL test plans \
that exercise an HTTP API thoroughly: happy paths, negative cases, and edge \
cases. Always produce a single JSON object that matches the schema below \
exactly. Never invent fields the schema doesn't list.\n\n{SCHEMA_DESCRIPTION}"
    )
}

pub fn user_prompt(requirement: &str, base_url: &str) -> String {
    format!(
        "Requirement:\n{requirement}\n\nBase URL under test: {base_url}\n\n\
Generate a UTDL plan covering this requirement."
    )
}

pub fn correction_prompt(diagnostics: &str, previous_json: &str) -> String {
    format!(
        "The previous plan failed validation. Fix ONLY what's necessary to \
satisfy every diagnostic below, keep everything else the same, and return \
the corrected plan as a single JSON object with no markdown fences.\n\n\
Validation diagnostics:\n{diagnostics}\n\nPrevious JSON:\n{previous_json}"
    )
}
