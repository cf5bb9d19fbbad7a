//! The executor report wire shape, parsed verbatim from the sibling
//! executor's `--output` JSON. Distinct from that executor's own internal
//! `protocol::ExecutionReport` (richer, serialization-only) -- this is
//! only the subset the orchestrator is contractually guaranteed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportPlanRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total_duration_ms: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepOutcome {
    pub step_id: String,
    pub status: StepStatus,
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutorReport {
    pub plan: ReportPlanRef,
    pub summary: ReportSummary,
    pub results: Vec<StepOutcome>,
}

/// Parses the report JSON produced at `--output <path>`, surfacing a
/// structured error (with the raw payload attached) rather than panicking
/// on malformed executor output.
pub fn parse_report(raw: &str) -> Result<ExecutorReport, crate::error::OrchestrateError> {
    serde_json::from_str(raw).map_err(|e| crate::error::OrchestrateError::UnparseableReport {
        message: e.to_string(),
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_report() {
        let raw = r#"{
            "plan": {"id": "p1", "name": "login"},
            "summary": {"total": 2, "passed": 1, "failed": 1, "skipped": 0, "total_duration_ms": 120.5},
            "results": [
                {"step_id": "a", "status": "passed", "duration_ms": 50.0},
                {"step_id": "b", "status": "failed", "duration_ms": 70.5, "error": "timeout"}
            ]
        }"#;
        let report = parse_report(raw).unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.results[1].error.as_deref(), Some("timeout"));
    }

    #[test]
    fn rejects_non_json_with_raw_payload_attached() {
        let err = parse_report("not json").unwrap_err();
        match err {
            crate::error::OrchestrateError::UnparseableReport { raw, .. } => {
                assert_eq!(raw, "not json");
            }
            other => panic!("expected UnparseableReport, got {other:?}"),
        }
    }
}
