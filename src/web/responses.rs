//! JSON response envelopes, following `phantom-core-cve/src/web/responses.rs`'s
//! `ApiResponse`/`ErrorResponse` convention.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(error: ErrorResponse) -> ApiResponse<()> {
        ApiResponse { success: false, data: None, error: Some(error) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn not_found(message: &str) -> Self {
        Self { code: "NOT_FOUND".to_string(), message: message.to_string() }
    }

    pub fn validation_error(message: &str) -> Self {
        Self { code: "VALIDATION_ERROR".to_string(), message: message.to_string() }
    }

    pub fn timeout(message: &str) -> Self {
        Self { code: "TIMEOUT".to_string(), message: message.to_string() }
    }

    pub fn internal_error(message: &str) -> Self {
        Self { code: "INTERNAL_ERROR".to_string(), message: message.to_string() }
    }
}
