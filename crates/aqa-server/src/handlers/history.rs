//! `GET /history`, `GET /history/stats`, `GET /history/{id}`,
//! `DELETE /history/{id}`, backed by whichever backend
//! `AppState::from_env` resolved.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use aqa_storage::{ExecutionRecord, ExecutionStatus, HistoryListFilter, HistoryStats};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

fn parse_status(raw: &str) -> Result<ExecutionStatus, ApiError> {
    match raw {
        "success" => Ok(ExecutionStatus::Success),
        "failure" => Ok(ExecutionStatus::Failure),
        "error" => Ok(ExecutionStatus::Error),
        other => Err(ApiError::BadRequest(format!("unknown status '{other}'"))),
    }
}

pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<ExecutionRecord>>>, ApiError> {
    let filter = HistoryListFilter {
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
        status: query.status.as_deref().map(parse_status).transpose()?,
        start_date: None,
        end_date: None,
        tags: query
            .tags
            .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default(),
    };
    let records = state.history.list(&filter)?;
    Ok(Json(ApiResponse::ok(records)))
}

pub async fn history_stats(State(state): State<AppState>) -> Result<Json<ApiResponse<HistoryStats>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.history.stats()?)))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ExecutionRecord>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.history.get(&id)?)))
}

#[derive(Debug, Serialize)]
pub struct DeleteBody {
    pub deleted: bool,
}

pub async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteBody>>, ApiError> {
    let deleted = state.history.delete(&id)?;
    Ok(Json(ApiResponse::ok(DeleteBody { deleted })))
}
