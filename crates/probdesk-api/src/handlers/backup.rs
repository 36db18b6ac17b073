//! Encrypted backup download and restore upload.

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use probdesk_backup::ImportSummary;

use crate::error::ApiError;
use crate::AppState;

/// Header naming the user an import is performed for.
pub const ACTING_USER_HEADER: &str = "x-acting-user";

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub passphrase: String,
}

/// Download every record as one encrypted blob.
///
/// An absent or unreadable body is treated as an empty passphrase.
pub async fn export_backup(
    State(state): State<AppState>,
    body: Option<Json<ExportRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let passphrase = body.map(|Json(req)| req.passphrase).unwrap_or_default();
    let output = state.backup.export(&passphrase).await?;

    info!(
        subsystem = "api",
        op = "export_backup",
        record_count = output.record_count,
        filename = %output.filename,
        "Backup download prepared"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output.filename),
            ),
        ],
        output.blob,
    ))
}

/// Restore an uploaded blob. Multipart fields: `passphrase` and `file`.
pub async fn import_backup(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    let acting_user = acting_user(&headers)?;

    let mut passphrase = String::new();
    let mut blob: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        match field.name() {
            Some("passphrase") => {
                passphrase = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read passphrase: {}", e)))?;
            }
            Some("file") => {
                blob = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    // A missing passphrase is reported ahead of a missing file.
    let blob = match blob {
        Some(blob) => blob,
        None if passphrase.is_empty() => Vec::new(),
        None => {
            return Err(ApiError::BadRequest(
                "No file uploaded. Use field name 'file'.".to_string(),
            ))
        }
    };

    let summary = state.backup.import(&passphrase, blob, acting_user).await?;
    Ok(Json(summary))
}

fn acting_user(headers: &HeaderMap) -> Result<Option<i64>, ApiError> {
    let Some(value) = headers.get(ACTING_USER_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(Some)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} header", ACTING_USER_HEADER)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_acting_user_absent() {
        assert_eq!(acting_user(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn test_acting_user_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTING_USER_HEADER, HeaderValue::from_static(" 9 "));
        assert_eq!(acting_user(&headers).unwrap(), Some(9));
    }

    #[test]
    fn test_acting_user_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTING_USER_HEADER, HeaderValue::from_static("admin"));
        assert!(matches!(acting_user(&headers), Err(ApiError::BadRequest(_))));
    }
}
