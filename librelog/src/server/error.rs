//! Error responses for the HTTP API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

/// An [`Error`] rendered as `{"error": <reason>}` with a matching status.
///
/// Store and internal failures are logged and reported with a generic
/// message so storage details never reach a caller.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Storage(_) | Error::Encoding(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Caller-facing reason. Logs the underlying error for server failures.
    pub fn message(&self) -> String {
        match &self.0 {
            Error::Unauthorized => "invalid token".to_string(),
            Error::InvalidInput(msg) | Error::TooLarge(msg) | Error::NotFound(msg) => {
                msg.clone()
            }
            err => {
                tracing::error!("Request failed: {}", err);
                "internal error".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
