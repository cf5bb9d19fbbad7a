//! `run_plan`: serialize plan to a temp file, locate and invoke the
//! executor binary with a wall-clock timeout, parse the report, and
//! guarantee both temp files are gone on every exit path, following the
//! sibling executor's own CLI contract (`execute --file <plan> --output
//! <report>`).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use aqa_core::Plan;
use tokio::process::Command;
use uuid::Uuid;

use crate::error::OrchestrateError;
use crate::locator::locate_executor;
use crate::report::{parse_report, ExecutorReport, StepStatus as ReportStepStatus};

#[derive(Debug, Clone, serde::Serialize)]
pub struct StepRunResult {
    pub step_id: String,
    pub status: String,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub assertions_results: Vec<serde_json::Value>,
    #[serde(default)]
    pub extractions: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunnerResult {
    pub success: bool,
    pub steps: Vec<StepRunResult>,
    pub total_duration_ms: f64,
    pub raw_report: ExecutorReport,
}

pub struct RunOptions {
    pub timeout: Duration,
    pub executor_override: Option<String>,
    pub work_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            timeout: Duration::from_secs(30),
            executor_override: None,
            work_dir: std::env::temp_dir(),
        }
    }
}

pub async fn run_plan(plan: &Plan, options: &RunOptions) -> Result<RunnerResult, OrchestrateError> {
    let run_id = Uuid::new_v4();
    let plan_path = options.work_dir.join(format!("aqa-plan-{run_id}.json"));
    let report_path = options.work_dir.join(format!("aqa-report-{run_id}.json"));

    let result = run_plan_inner(plan, options, &plan_path, &report_path).await;

    let _ = tokio::fs::remove_file(&plan_path).await;
    let _ = tokio::fs::remove_file(&report_path).await;

    result
}

async fn run_plan_inner(
    plan: &Plan,
    options: &RunOptions,
    plan_path: &PathBuf,
    report_path: &PathBuf,
) -> Result<RunnerResult, OrchestrateError> {
    tokio::fs::write(plan_path, serde_json::to_vec_pretty(plan)?).await?;

    let executor = locate_executor(options.executor_override.as_deref())
        .map_err(OrchestrateError::ExecutorNotFound)?;

    let started = Instant::now();
    let mut command = Command::new(&executor);
    command
        .arg("execute")
        .arg("--file")
        .arg(plan_path)
        .arg("--output")
        .arg(report_path)
        .kill_on_drop(true);

    let mut child = command.spawn()?;

    let status = match tokio::time::timeout(options.timeout, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            let _ = child.kill().await;
            return Err(OrchestrateError::Timeout(options.timeout.as_millis() as u64));
        }
    };

    if !report_path.exists() {
        return Err(OrchestrateError::NoReport(
            status.code().map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()),
        ));
    }

    let raw = tokio::fs::read_to_string(report_path).await?;
    let report = parse_report(&raw)?;

    let steps = report
        .results
        .iter()
        .map(|outcome| StepRunResult {
            step_id: outcome.step_id.clone(),
            status: match outcome.status {
                ReportStepStatus::Passed => "passed",
                ReportStepStatus::Failed => "failed",
                ReportStepStatus::Skipped => "skipped",
            }
            .to_string(),
            duration_ms: outcome.duration_ms,
            error: outcome.error.clone(),
            assertions_results: outcome
                .extra
                .get("assertions_results")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
            extractions: outcome
                .extra
                .get("extractions")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        failed = report.summary.failed,
        "executor invocation finished"
    );

    Ok(RunnerResult {
        success: report.summary.failed == 0,
        steps,
        total_duration_ms: report.summary.total_duration_ms,
        raw_report: report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqa_core::{Config, Meta};

    fn sample_plan() -> Plan {
        Plan {
            spec_version: aqa_core::SPEC_VERSION.to_string(),
            meta: Meta::generated("p").unwrap(),
            config: Config::new("http://h", 1000).unwrap(),
            steps: vec![],
        }
    }

    #[tokio::test]
    async fn missing_executor_cleans_up_and_reports_every_path_tried() {
        let tmp = tempfile::tempdir().unwrap();
        std::env::remove_var("AQA_RUNNER_PATH");
        let options = RunOptions {
            executor_override: Some("/definitely/not/a/real/binary".to_string()),
            work_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };
        let err = run_plan(&sample_plan(), &options).await.unwrap_err();
        assert!(matches!(err, OrchestrateError::ExecutorNotFound(_)));

        let leftover = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftover, 0, "temp files must not survive a failed run");
    }

    #[tokio::test]
    async fn timeout_kills_the_subprocess_and_still_cleans_up_temp_files() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script_path = tmp.path().join("slow-executor.sh");
        std::fs::write(&script_path, "#!/bin/sh\nsleep 5\n").unwrap();
        let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script_path, perms).unwrap();

        let options = RunOptions {
            executor_override: Some(script_path.to_str().unwrap().to_string()),
            work_dir: tmp.path().to_path_buf(),
            timeout: Duration::from_millis(100),
        };

        let started = Instant::now();
        let err = run_plan(&sample_plan(), &options).await.unwrap_err();
        assert!(matches!(err, OrchestrateError::Timeout(_)));
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "run_plan must return once the subprocess is killed, not wait out the full sleep"
        );

        let leftover = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name() != "slow-executor.sh")
            .count();
        assert_eq!(leftover, 0, "temp files must not survive a timed-out run");
    }
}
