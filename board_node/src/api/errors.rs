//! API error handling for the board endpoints

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::config::ConfigError;

/// Error envelope: `{ok: false, error, status?, ...extra}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub code: u16,
    pub ok: bool,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiError {
    pub fn new(code: u16, message: String) -> Self {
        Self {
            code,
            ok: false,
            message,
            status: None,
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status: &'static str) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach an empty list under `field`, so list clients can render
    /// nothing instead of breaking.
    pub fn with_empty_list(mut self, field: &str) -> Self {
        self.extra.insert(field.to_string(), Value::Array(Vec::new()));
        self
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(400, message.to_string())
    }

    pub fn too_many_requests(message: &str) -> Self {
        Self::new(429, message.to_string())
    }

    pub fn internal_server_error(message: &str) -> Self {
        Self::new(500, message.to_string())
    }

    /// Submitted but not confirmed within the bounded wait.
    pub fn accepted_pending(message: &str) -> Self {
        Self::new(202, message.to_string()).with_status("submitted_or_pending")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Validation error details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub value: Option<Value>,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(&err.message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(&format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingPrivateKey => Self::internal_server_error("Server wallet not configured"),
            other => Self::internal_server_error(&other.to_string()),
        }
    }
}
