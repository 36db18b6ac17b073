//! # probdesk-backup
//!
//! Password-protected backup and restore of every problem record and its
//! attachment trees.
//!
//! ## Blob format
//!
//! ```text
//! nonce (12 bytes) ‖ AES-256-GCM( gzip( tar[ data.json, uploads/... ] ) ) ‖ tag (16 bytes)
//! ```
//!
//! There is no header or version field. Format evolution relies on the
//! manifest's per-field defaulting.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use probdesk_backup::{BackupConfig, BackupService};
//! use probdesk_crypto::Pbkdf2Kdf;
//! use probdesk_db::MemoryRecordStore;
//!
//! let service = BackupService::new(
//!     Arc::new(MemoryRecordStore::new()),
//!     Arc::new(Pbkdf2Kdf::default()),
//!     BackupConfig::new("/var/lib/probdesk/uploads"),
//! );
//! let output = service.export("p@ss").await?;
//! let summary = service.import("p@ss", output.blob, Some(1)).await?;
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod manifest;
pub mod service;

pub use config::BackupConfig;
pub use error::{BackupError, BackupResult, DECRYPTION_FAILED_MSG};
pub use exporter::{backup_filename, export, ExportOutput};
pub use importer::{import, ImportSummary};
pub use manifest::{Manifest, ManifestEntry, APP_VERSION};
pub use service::BackupService;
