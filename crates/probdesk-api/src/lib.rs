//! # probdesk-api
//!
//! HTTP surface for encrypted backup and restore.
//!
//! | Route | Method | Body | Response |
//! |-------|--------|------|----------|
//! | `/health` | GET | | `{"status":"ok"}` |
//! | `/api/v1/backup/export` | POST | JSON `{"passphrase"}` | encrypted blob download |
//! | `/api/v1/backup/import` | POST | multipart `passphrase`, `file` | import summary |

pub mod config;
pub mod error;
pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use probdesk_backup::BackupService;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub backup: BackupService,
}

impl AppState {
    pub fn new(backup: BackupService) -> Self {
        Self { backup }
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/backup/export", post(handlers::backup::export_backup))
        .route("/api/v1/backup/import", post(handlers::backup::import_backup))
        .layer(TraceLayer::new_for_http())
        // Multipart reads honor DefaultBodyLimit, so lift it to the configured cap.
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}
