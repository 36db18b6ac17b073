//! Server configuration read from the environment.
//!
//! Environment variables:
//!   DATABASE_URL      - PostgreSQL connection string
//!   HOST / PORT       - bind address (default: 0.0.0.0:3000)
//!   UPLOADS_ROOT      - attachment tree root
//!   SCRATCH_DIR       - parent for import scratch directories (default: system temp)
//!   BACKUP_KDF        - "pbkdf2" or "argon2id" (default: pbkdf2)
//!   MAX_UPLOAD_BYTES  - request body limit (default: 2 GiB)

use std::path::PathBuf;

use thiserror::Error;

use probdesk_backup::BackupConfig;
use probdesk_core::defaults;
use probdesk_crypto::KdfAlgorithm;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/probdesk";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub uploads_root: PathBuf,
    pub scratch_dir: Option<PathBuf>,
    pub kdf: KdfAlgorithm,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                reason: format!("'{}' is not a port number", raw),
            })?,
            None => defaults::SERVER_PORT,
        };

        let kdf = match get("BACKUP_KDF") {
            Some(raw) => raw
                .parse::<KdfAlgorithm>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "BACKUP_KDF",
                    reason: e.to_string(),
                })?,
            None => KdfAlgorithm::default(),
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "MAX_UPLOAD_BYTES",
                reason: format!("'{}' is not a byte count", raw),
            })?,
            None => defaults::MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| defaults::SERVER_HOST.to_string()),
            port,
            uploads_root: get("UPLOADS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(defaults::UPLOADS_ROOT)),
            scratch_dir: get("SCRATCH_DIR").map(PathBuf::from),
            kdf,
            max_upload_bytes,
        })
    }

    /// Filesystem layout handed to the backup service.
    pub fn backup_config(&self) -> BackupConfig {
        let config = BackupConfig::new(&self.uploads_root);
        match &self.scratch_dir {
            Some(dir) => config.with_scratch_parent(dir),
            None => config,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
