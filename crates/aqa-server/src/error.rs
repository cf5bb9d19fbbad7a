//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It
//! implements `axum::response::IntoResponse` to produce the structured
//! `{success:false, error:{code, message, details?}}` envelope, never a
//! stack trace.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use aqa_validate::Diagnostic;

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation failed")]
    ValidationFailed(Vec<Diagnostic>),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("generator exhausted correction attempts: {0}")]
    GeneratorExhausted(String),

    #[error("executor timed out: {0}")]
    ExecutorTimeout(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationFailed(_) => "E1xxx",
            ApiError::InternalError(_) => "E5001",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Configuration(_) => "E4001",
            ApiError::GeneratorExhausted(_) => "E6001",
            ApiError::ExecutorTimeout(_) => "E5002",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::GeneratorExhausted(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ExecutorTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            ApiError::ValidationFailed(diagnostics) => serde_json::to_value(diagnostics).ok(),
            _ => None,
        };
        let detail = ApiErrorDetail {
            code: self.code().to_string(),
            message: self.to_string(),
            details,
        };
        let body = serde_json::json!({
            "success": false,
            "error": detail,
        });
        (self.status(), axum::Json(body)).into_response()
    }
}

impl From<aqa_storage::StorageError> for ApiError {
    fn from(err: aqa_storage::StorageError) -> Self {
        match &err {
            aqa_storage::StorageError::NotFound(_) => ApiError::NotFound(err.to_string()),
            aqa_storage::StorageError::VersionConflict(..) => ApiError::Conflict(err.to_string()),
            aqa_storage::StorageError::ObjectStoreNotConfigured
            | aqa_storage::StorageError::UnknownBackend(_) => ApiError::Configuration(err.to_string()),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<aqa_openapi::OpenApiError> for ApiError {
    fn from(err: aqa_openapi::OpenApiError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<aqa_core::CoreError> for ApiError {
    fn from(err: aqa_core::CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<aqa_generate::GenerateError> for ApiError {
    fn from(err: aqa_generate::GenerateError) -> Self {
        match err {
            aqa_generate::GenerateError::ExhaustedRetries { .. } => {
                ApiError::GeneratorExhausted(err.to_string())
            }
            aqa_generate::GenerateError::Provider(msg) => ApiError::InternalError(msg),
            aqa_generate::GenerateError::Storage(e) => e.into(),
            aqa_generate::GenerateError::Core(e) => e.into(),
        }
    }
}

impl From<aqa_orchestrate::OrchestrateError> for ApiError {
    fn from(err: aqa_orchestrate::OrchestrateError) -> Self {
        match err {
            aqa_orchestrate::OrchestrateError::Timeout(_) => ApiError::ExecutorTimeout(err.to_string()),
            aqa_orchestrate::OrchestrateError::ExecutorNotFound(_) => ApiError::Configuration(err.to_string()),
            aqa_orchestrate::OrchestrateError::UnparseableReport { .. } => ApiError::InternalError(err.to_string()),
            aqa_orchestrate::OrchestrateError::Storage(e) => e.into(),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}
