//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use probdesk_backup::BackupError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<BackupError> for ApiError {
    fn from(err: BackupError) -> Self {
        match &err {
            BackupError::MissingCredential
            | BackupError::MalformedArchive(_)
            | BackupError::Authentication => ApiError::BadRequest(err.to_string()),
            BackupError::Storage(_) if err.is_conflict() => ApiError::Conflict(err.to_string()),
            BackupError::Storage(_) | BackupError::Filesystem(_) | BackupError::Internal(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
