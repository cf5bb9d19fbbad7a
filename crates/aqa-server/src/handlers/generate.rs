//! `POST /generate`: runs the Generator's bounded self-correction
//! loop and returns the produced plan plus generation metadata.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use aqa_generate::GeneratorOptions;
use aqa_validate::ValidationMode;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub requirement: String,
    pub base_url: String,
    #[serde(default)]
    pub skip_cache: bool,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_correction_attempts: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct GenerateBody {
    pub plan: aqa_core::Plan,
    pub cached: bool,
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    pub generation_time_ms: u64,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateBody>>, ApiError> {
    if req.requirement.trim().is_empty() {
        return Err(ApiError::BadRequest("requirement must not be empty".to_string()));
    }

    let validation_mode = match req.mode.as_deref() {
        Some("strict") => ValidationMode::Strict,
        Some("lenient") => ValidationMode::Lenient,
        Some("default") | None => state.default_validation_mode,
        Some(other) => return Err(ApiError::BadRequest(format!("unknown validation mode '{other}'"))),
    };

    let options = GeneratorOptions {
        skip_cache: req.skip_cache,
        max_correction_attempts: req
            .max_correction_attempts
            .unwrap_or(aqa_generate::DEFAULT_MAX_CORRECTION_ATTEMPTS),
        validation_mode,
        model: req.model.unwrap_or_else(|| "gpt-4".to_string()),
    };

    let result = state.generator.generate(&req.requirement, &req.base_url, &options).await?;

    Ok(Json(ApiResponse::ok(GenerateBody {
        plan: result.plan,
        cached: result.metadata.cached,
        provider: result.metadata.provider,
        model: result.metadata.model,
        tokens_used: result.metadata.tokens,
        generation_time_ms: result.metadata.elapsed_ms,
    })))
}
