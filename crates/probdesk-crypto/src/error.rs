//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Authentication failed.
    ///
    /// Covers wrong key, tampered ciphertext, and truncated input alike; the
    /// cause is deliberately not distinguished.
    #[error("Authentication failed - wrong password or corrupted data")]
    Authentication,

    /// Sealed blob shorter than its nonce.
    #[error("Blob too short: {actual} bytes (minimum {minimum})")]
    BlobTooShort { actual: usize, minimum: usize },

    /// Passphrase missing or empty.
    #[error("Passphrase is required")]
    EmptyPassphrase,

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_display_is_generic() {
        let msg = CryptoError::Authentication.to_string();
        assert!(msg.contains("wrong password or corrupted data"));
    }

    #[test]
    fn test_blob_too_short_display() {
        let err = CryptoError::BlobTooShort {
            actual: 5,
            minimum: 12,
        };
        assert!(err.to_string().contains('5'));
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn test_empty_passphrase_display() {
        assert_eq!(
            CryptoError::EmptyPassphrase.to_string(),
            "Passphrase is required"
        );
    }
}
