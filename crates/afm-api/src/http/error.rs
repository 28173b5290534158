//! Application error type mapping to HTTP status codes and the error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use afm_types::error::RunnerError;

/// Detail returned for every 500; internal messages are logged, not sent.
const INTERNAL_DETAIL: &str = "Internal server error";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request body, payload or input.
    BadRequest(String),
    /// Signature verification failed.
    Unauthorized(String),
    /// Unknown route target or failed hub verification.
    NotFound(String),
    /// Agent execution or other internal failure.
    Internal(String),
}

impl From<RunnerError> for AppError {
    fn from(e: RunnerError) -> Self {
        match e {
            RunnerError::InvalidInput(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, detail) = match self {
            AppError::BadRequest(msg) => ("BAD_REQUEST", msg),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg),
            AppError::NotFound(msg) => ("NOT_FOUND", msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                ("INTERNAL_ERROR", INTERNAL_DETAIL.to_string())
            }
        };

        let body = json!({
            "error": code,
            "detail": detail,
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
