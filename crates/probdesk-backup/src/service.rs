//! Store-bound entry point for export and import.

use std::sync::Arc;

use probdesk_core::RecordStore;
use probdesk_crypto::KeyDerivation;

use crate::config::BackupConfig;
use crate::error::BackupResult;
use crate::exporter::{self, ExportOutput};
use crate::importer::{self, ImportSummary};

/// Binds a record store, a key derivation, and a filesystem layout.
///
/// Cheap to clone; share one per process.
#[derive(Clone)]
pub struct BackupService {
    store: Arc<dyn RecordStore>,
    kdf: Arc<dyn KeyDerivation>,
    config: BackupConfig,
}

impl BackupService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        kdf: Arc<dyn KeyDerivation>,
        config: BackupConfig,
    ) -> Self {
        Self { store, kdf, config }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Name of the configured key derivation, for logs.
    pub fn kdf_algorithm(&self) -> &'static str {
        self.kdf.algorithm()
    }

    /// See [`exporter::export`].
    pub async fn export(&self, passphrase: &str) -> BackupResult<ExportOutput> {
        exporter::export(self.store.as_ref(), self.kdf.clone(), &self.config, passphrase).await
    }

    /// See [`importer::import`].
    pub async fn import(
        &self,
        passphrase: &str,
        blob: Vec<u8>,
        acting_user: Option<i64>,
    ) -> BackupResult<ImportSummary> {
        importer::import(
            self.store.as_ref(),
            self.kdf.clone(),
            &self.config,
            passphrase,
            blob,
            acting_user,
        )
        .await
    }
}
