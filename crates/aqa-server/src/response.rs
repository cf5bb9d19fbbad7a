//! The `{success, data, error, warnings}` response envelope every handler
//! returns.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse { success: true, data: Some(data), error: None, warnings: Vec::new() }
    }

    pub fn ok_with_warnings(data: T, warnings: Vec<String>) -> Self {
        ApiResponse { success: true, data: Some(data), error: None, warnings }
    }
}
