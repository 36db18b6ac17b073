//! Export: store → manifest + attachment trees → archive → sealed blob.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use probdesk_core::defaults::BACKUP_FILENAME_PREFIX;
use probdesk_core::RecordStore;
use probdesk_crypto::{seal_blob, KeyDerivation};

use crate::archive::build_archive;
use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};
use crate::manifest::Manifest;

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// `nonce ‖ ciphertext‖tag`.
    pub blob: Vec<u8>,
    /// Suggested download name.
    pub filename: String,
    pub record_count: usize,
}

/// Suggested filename for a backup taken now.
pub fn backup_filename() -> String {
    format!(
        "{}_{}.bin",
        BACKUP_FILENAME_PREFIX,
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}

/// Export every record and its attachments as one sealed blob.
///
/// Read-only on the store. Nothing is returned unless every step succeeds.
pub async fn export(
    store: &dyn RecordStore,
    kdf: Arc<dyn KeyDerivation>,
    config: &BackupConfig,
    passphrase: &str,
) -> BackupResult<ExportOutput> {
    if passphrase.is_empty() {
        return Err(BackupError::MissingCredential);
    }
    let start = Instant::now();

    let records = store.list_all().await.map_err(|e| {
        warn!(
            subsystem = "backup",
            component = "exporter",
            op = "export",
            error = %e,
            "Failed to read records"
        );
        BackupError::Storage(e)
    })?;
    let record_count = records.len();

    let manifest = Manifest::from_records(&records)
        .to_bytes()
        .map_err(|e| BackupError::Internal(format!("Failed to serialize manifest: {}", e)))?;

    let uploads_root = config.uploads_root.clone();
    let passphrase = passphrase.to_string();
    let blob = tokio::task::spawn_blocking(move || -> BackupResult<Vec<u8>> {
        let archive = build_archive(&manifest, &uploads_root)?;
        Ok(seal_blob(kdf.as_ref(), &passphrase, &archive)?)
    })
    .await??;

    info!(
        subsystem = "backup",
        component = "exporter",
        op = "export",
        record_count,
        byte_len = blob.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Backup exported"
    );

    Ok(ExportOutput {
        blob,
        filename: backup_filename(),
        record_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_filename_shape() {
        let name = backup_filename();
        assert!(name.starts_with("problems_backup_"));
        assert!(name.ends_with(".bin"));
        // problems_backup_YYYYMMDD_HHMMSS.bin
        assert_eq!(name.len(), "problems_backup_".len() + 15 + ".bin".len());
    }
}
