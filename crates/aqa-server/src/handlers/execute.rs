//! `POST /execute`: accepts an inline plan, a plan file path, or a
//! requirement (optionally generated first), validates it, then
//! either summarizes (`dry_run`) or hands it to the orchestrator.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use aqa_core::Plan;
use aqa_generate::GeneratorOptions;
use aqa_openapi::Source as OpenApiSource;
use aqa_orchestrate::{run_plan, RunnerResult};
use aqa_storage::{ExecutionRecord, ExecutionStatus};
use aqa_validate::{PlanStats, Validator};
use chrono::Utc;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub plan: Option<serde_json::Value>,
    #[serde(default)]
    pub plan_path: Option<String>,
    #[serde(default)]
    pub requirement: Option<String>,
    /// A local path to an OpenAPI document; flattened and rendered
    /// to requirement text, then handed to the Generator alongside
    /// `requirement` when both are present.
    #[serde(default)]
    pub openapi_path: Option<String>,
    #[serde(default)]
    pub openapi_strict: bool,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub save_report: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ExecuteBody {
    DryRun { plan_name: String, stats: Option<PlanStats> },
    Executed { plan_name: String, result: RunnerResult, history_id: Option<String> },
}

async fn resolve_plan(state: &AppState, req: &ExecuteRequest) -> Result<Plan, ApiError> {
    if let Some(raw) = &req.plan {
        return Ok(serde_json::from_value(raw.clone())
            .map_err(|e| ApiError::BadRequest(format!("invalid plan: {e}")))?);
    }
    if let Some(path) = &req.plan_path {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ApiError::BadRequest(format!("could not read plan file '{path}': {e}")))?;
        return Ok(serde_json::from_str(&text)
            .map_err(|e| ApiError::BadRequest(format!("invalid plan file '{path}': {e}")))?);
    }
    if req.requirement.is_some() || req.openapi_path.is_some() {
        let base_url = req
            .base_url
            .clone()
            .ok_or_else(|| ApiError::BadRequest("base_url is required when generating a plan".to_string()))?;

        let requirement = match (&req.requirement, &req.openapi_path) {
            (Some(text), None) => text.clone(),
            (requirement, Some(path)) => {
                let derived = derive_requirement_text(path.clone(), req.openapi_strict).await?;
                match requirement {
                    Some(text) => format!("{text}\n\n{derived}"),
                    None => derived,
                }
            }
            (None, None) => unreachable!(),
        };

        let result = state
            .generator
            .generate(&requirement, &base_url, &GeneratorOptions::default())
            .await?;
        return Ok(result.plan);
    }
    Err(ApiError::BadRequest(
        "one of plan, plan_path, requirement, openapi_path is required".to_string(),
    ))
}

/// Runs the blocking OpenAPI parse, which fetches over
/// `reqwest::blocking` for URL sources) off the async executor thread.
async fn derive_requirement_text(path: String, strict: bool) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || {
        let (spec, _warnings) = aqa_openapi::parse_openapi(OpenApiSource::Path(path.into()), true, strict)?;
        Ok::<_, aqa_openapi::OpenApiError>(aqa_openapi::spec_to_requirement_text(&spec))
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("openapi parsing task panicked: {e}")))?
    .map_err(ApiError::from)
}

pub async fn execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ApiResponse<ExecuteBody>>, ApiError> {
    let plan = resolve_plan(&state, &req).await?;

    let validator = Validator::new(state.default_validation_mode);
    let validation = validator.validate(&serde_json::to_value(&plan)?);
    if !validation.ok {
        return Err(ApiError::ValidationFailed(validation.errors));
    }

    if req.dry_run {
        return Ok(Json(ApiResponse::ok(ExecuteBody::DryRun {
            plan_name: plan.meta.name.clone(),
            stats: validation.stats,
        })));
    }

    let run_options = state.run_options();
    let result = run_plan(&plan, &run_options).await?;

    let history_id = if req.save_report {
        let id = uuid::Uuid::new_v4().to_string();
        let record = ExecutionRecord {
            id: id.clone(),
            timestamp: Utc::now().to_rfc3339(),
            plan_file: req.plan_path.clone().unwrap_or_else(|| "inline".to_string()),
            plan_hash: None,
            plan_name: Some(plan.meta.name.clone()),
            status: if result.success { ExecutionStatus::Success } else { ExecutionStatus::Failure },
            duration_ms: result.total_duration_ms as u64,
            total_steps: plan.steps.len() as u32,
            passed_steps: result.raw_report.summary.passed,
            failed_steps: result.raw_report.summary.failed,
            runner_version: None,
            runner_report: serde_json::to_value(&result.raw_report).ok(),
            tags: req.tags.clone(),
            metadata: Default::default(),
            created_at: Utc::now().to_rfc3339(),
        };
        state.history.save(&record)?;
        Some(id)
    } else {
        None
    };

    Ok(Json(ApiResponse::ok(ExecuteBody::Executed {
        plan_name: plan.meta.name,
        result,
        history_id,
    })))
}
