//! Backup filesystem configuration.

use std::path::{Path, PathBuf};

use probdesk_core::defaults::IMAGE_POOL_DIR;

/// Where attachments live and where imports unpack.
///
/// Built by the caller; nothing in this crate reads the environment.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Root holding `{record_id}/{field}/` trees and the image pool.
    pub uploads_root: PathBuf,
    /// Parent for per-import scratch directories. `None` uses the system temp dir.
    pub scratch_parent: Option<PathBuf>,
}

impl BackupConfig {
    pub fn new(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
            scratch_parent: None,
        }
    }

    pub fn with_scratch_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(dir.into());
        self
    }

    /// Attachment directory of one record.
    pub fn record_dir(&self, id: i64) -> PathBuf {
        self.uploads_root.join(id.to_string())
    }

    /// Shared inline-image pool.
    pub fn image_pool(&self) -> PathBuf {
        self.uploads_root.join(IMAGE_POOL_DIR)
    }

    /// Fresh scratch directory, removed when the returned guard drops.
    pub fn scratch_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("probdesk-import-");
        match &self.scratch_parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }
}
