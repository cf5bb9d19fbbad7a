//! `GET /plans`, `GET /plans/{name}`, `GET /plans/{name}/versions`,
//! `GET /plans/{name}/diff`, `POST /plans/{name}/versions/{v}/restore`,
//! backed by the `VersionStore`.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use aqa_storage::{PlanDiff, PlanVersion};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub async fn list_plans(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.versions.list_plans()?)))
}

#[derive(Debug, Deserialize)]
pub struct VersionQuery {
    pub version: Option<u32>,
}

pub async fn get_plan(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<ApiResponse<PlanVersion>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.versions.get_version(&name, query.version)?)))
}

pub async fn list_versions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<Vec<u32>>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.versions.list_versions(&name)?)))
}

#[derive(Debug, Deserialize)]
pub struct DiffQuery {
    pub a: u32,
    pub b: Option<u32>,
}

pub async fn diff_plan(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DiffQuery>,
) -> Result<Json<ApiResponse<PlanDiff>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.versions.diff(&name, query.a, query.b)?)))
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn restore_version(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, u32)>,
    Json(req): Json<RestoreRequest>,
) -> Result<Json<ApiResponse<PlanVersion>>, ApiError> {
    Ok(Json(ApiResponse::ok(
        state.versions.rollback(&name, version, req.description.as_deref())?,
    )))
}
