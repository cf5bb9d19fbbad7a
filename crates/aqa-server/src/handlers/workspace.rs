//! `POST /workspace/init`, `GET /workspace/status`. This only creates the
//! directory layout the other components already read `AQA_STORAGE_PATH`
//! from.

use std::path::PathBuf;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WorkspaceInitRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct WorkspaceInitBody {
    pub workspace_path: String,
    pub created_files: Vec<String>,
    pub already_existed: bool,
}

pub async fn init_workspace(
    Json(req): Json<WorkspaceInitRequest>,
) -> Result<Json<ApiResponse<WorkspaceInitBody>>, ApiError> {
    let base = PathBuf::from(req.path.unwrap_or_else(|| ".".to_string())).join(".aqa");
    let already_existed = base.exists();
    if already_existed && !req.force {
        return Ok(Json(ApiResponse::ok(WorkspaceInitBody {
            workspace_path: base.to_string_lossy().to_string(),
            created_files: Vec::new(),
            already_existed: true,
        })));
    }

    let mut created = Vec::new();
    for dir in ["plans", "reports", "cache", "versions"] {
        let path = base.join(dir);
        std::fs::create_dir_all(&path)?;
        created.push(path.to_string_lossy().to_string());
    }

    Ok(Json(ApiResponse::ok(WorkspaceInitBody {
        workspace_path: base.to_string_lossy().to_string(),
        created_files: created,
        already_existed,
    })))
}

#[derive(Debug, Serialize)]
pub struct WorkspaceStatusBody {
    pub initialized: bool,
    pub workspace_path: Option<String>,
    pub plans_count: usize,
    pub history_count: u64,
}

pub async fn workspace_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WorkspaceStatusBody>>, ApiError> {
    let storage_path = std::env::var("AQA_STORAGE_PATH").unwrap_or_else(|_| "./.aqa/storage".to_string());
    let initialized = PathBuf::from(&storage_path).exists();
    let plans_count = state.versions.list_plans()?.len();
    let history_count = state.history.stats()?.total;

    Ok(Json(ApiResponse::ok(WorkspaceStatusBody {
        initialized,
        workspace_path: initialized.then_some(storage_path),
        plans_count,
        history_count,
    })))
}
