//! `POST /validate`: runs the validator over an inline plan and
//! returns the diagnostics list, severity counts, and plan statistics.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use aqa_validate::{Diagnostic, PlanStats, ValidationMode, Validator};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub plan: serde_json::Value,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateBody {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<PlanStats>,
}

pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ApiResponse<ValidateBody>>, ApiError> {
    let mode = match req.mode.as_deref() {
        Some("strict") => ValidationMode::Strict,
        Some("lenient") => ValidationMode::Lenient,
        Some("default") | None => state.default_validation_mode,
        Some(other) => return Err(ApiError::BadRequest(format!("unknown validation mode '{other}'"))),
    };

    let validator = Validator::new(mode);
    let result = validator.validate(&req.plan);

    Ok(Json(ApiResponse::ok(ValidateBody {
        valid: result.ok,
        error_count: result.errors.len(),
        warning_count: result.warnings.len(),
        errors: result.errors,
        warnings: result.warnings,
        stats: result.stats,
    })))
}
