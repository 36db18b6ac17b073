//! Error taxonomy for backup export and import.

use thiserror::Error;

use probdesk_crypto::CryptoError;

/// Message shown for every decryption failure.
///
/// Wrong passphrase and damaged blob share it so the caller cannot tell
/// them apart.
pub const DECRYPTION_FAILED_MSG: &str =
    "Decryption failed. Check the backup password and that the file is a complete backup.";

/// Backup operation errors.
#[derive(Error, Debug)]
pub enum BackupError {
    /// Passphrase absent or empty.
    #[error("A backup password is required")]
    MissingCredential,

    /// Blob too short, or archive structure could not be unpacked.
    #[error("Malformed backup archive: {0}")]
    MalformedArchive(String),

    /// AEAD check failed (wrong passphrase or corrupted blob).
    #[error("{}", DECRYPTION_FAILED_MSG)]
    Authentication,

    /// The record store rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(#[source] probdesk_core::Error),

    /// Attachment tree could not be read or written.
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// Unexpected failure (task join, serialization of our own data).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BackupError {
    /// Whether the storage failure was a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackupError::Storage(e) if e.is_unique_violation())
    }
}

impl From<CryptoError> for BackupError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::EmptyPassphrase => BackupError::MissingCredential,
            CryptoError::BlobTooShort { actual, minimum } => BackupError::MalformedArchive(
                format!("backup is {} bytes, at least {} required", actual, minimum),
            ),
            CryptoError::Authentication => BackupError::Authentication,
            other => BackupError::Internal(other.to_string()),
        }
    }
}

impl From<probdesk_core::Error> for BackupError {
    fn from(e: probdesk_core::Error) -> Self {
        BackupError::Storage(e)
    }
}

impl From<tokio::task::JoinError> for BackupError {
    fn from(e: tokio::task::JoinError) -> Self {
        BackupError::Internal(format!("Background task failed: {}", e))
    }
}

/// Result type for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_errors_map_to_categories() {
        assert!(matches!(
            BackupError::from(CryptoError::EmptyPassphrase),
            BackupError::MissingCredential
        ));
        assert!(matches!(
            BackupError::from(CryptoError::BlobTooShort {
                actual: 3,
                minimum: 12
            }),
            BackupError::MalformedArchive(_)
        ));
        assert!(matches!(
            BackupError::from(CryptoError::Authentication),
            BackupError::Authentication
        ));
        assert!(matches!(
            BackupError::from(CryptoError::KeyDerivation("bad params".into())),
            BackupError::Internal(_)
        ));
    }

    #[test]
    fn test_authentication_message_suggests_password() {
        let msg = BackupError::Authentication.to_string();
        assert!(msg.starts_with("Decryption failed."));
        assert!(msg.contains("password"));
    }

    #[test]
    fn test_conflict_detection() {
        let err = BackupError::from(probdesk_core::Error::Conflict("dup".into()));
        assert!(err.is_conflict());
        assert!(!BackupError::Authentication.is_conflict());
    }
}
