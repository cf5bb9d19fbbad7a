//! Synthetic streaming events emitted around a one-shot executor
//! invocation: because the executor itself doesn't stream, the
//! orchestrator fabricates a step-by-step narrative around the single
//! blocking call so `/ws/execute` consumers see the same event vocabulary
//! a future streaming executor would produce.

use serde::Serialize;

use crate::report::{ExecutorReport, StepOutcome};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    ExecutionStarted { plan_id: String, plan_name: String, total_steps: usize },
    StepStarted { step_id: String, index: usize },
    StepCompleted { step_id: String, index: usize, status: String, duration_ms: f64 },
    Progress { completed: usize, total: usize },
    ExecutionCompleted { success: bool, total_duration_ms: f64, passed: u32, failed: u32, skipped: u32 },
}

/// Builds the full ordered event sequence for one report: `execution_started`
/// -> N x (`step_started`, `step_completed`, `progress`) ->
/// `execution_completed`.
pub fn events_for_report(declared_step_ids: &[String], report: &ExecutorReport) -> Vec<ExecutionEvent> {
    let mut events = Vec::with_capacity(declared_step_ids.len() * 3 + 2);
    events.push(ExecutionEvent::ExecutionStarted {
        plan_id: report.plan.id.clone(),
        plan_name: report.plan.name.clone(),
        total_steps: declared_step_ids.len(),
    });

    let outcomes: std::collections::HashMap<&str, &StepOutcome> =
        report.results.iter().map(|r| (r.step_id.as_str(), r)).collect();

    for (index, step_id) in declared_step_ids.iter().enumerate() {
        events.push(ExecutionEvent::StepStarted { step_id: step_id.clone(), index });
        if let Some(outcome) = outcomes.get(step_id.as_str()) {
            events.push(ExecutionEvent::StepCompleted {
                step_id: step_id.clone(),
                index,
                status: format!("{:?}", outcome.status).to_ascii_lowercase(),
                duration_ms: outcome.duration_ms,
            });
        }
        events.push(ExecutionEvent::Progress { completed: index + 1, total: declared_step_ids.len() });
    }

    events.push(ExecutionEvent::ExecutionCompleted {
        success: report.summary.failed == 0,
        total_duration_ms: report.summary.total_duration_ms,
        passed: report.summary.passed,
        failed: report.summary.failed,
        skipped: report.summary.skipped,
    });

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportPlanRef, ReportSummary, StepStatus};

    #[test]
    fn emits_events_in_spec_order() {
        let report = ExecutorReport {
            plan: ReportPlanRef { id: "p".to_string(), name: "n".to_string() },
            summary: ReportSummary { total: 1, passed: 1, failed: 0, skipped: 0, total_duration_ms: 10.0 },
            results: vec![StepOutcome {
                step_id: "a".to_string(),
                status: StepStatus::Passed,
                duration_ms: 10.0,
                error: None,
                extra: Default::default(),
            }],
        };
        let events = events_for_report(&["a".to_string()], &report);
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], ExecutionEvent::ExecutionStarted { .. }));
        assert!(matches!(events.last().unwrap(), ExecutionEvent::ExecutionCompleted { .. }));
    }
}
