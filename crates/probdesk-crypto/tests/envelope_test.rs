//! Passphrase-level tests for the sealed blob format.

use std::sync::atomic::{AtomicUsize, Ordering};

use probdesk_crypto::{
    open_blob, seal_blob, CryptoError, CryptoResult, DerivedKey, KeyDerivation, Pbkdf2Kdf,
    NONCE_LEN,
};

/// Wraps a real KDF and counts how often it runs.
struct CountingKdf {
    inner: Pbkdf2Kdf,
    calls: AtomicUsize,
}

impl CountingKdf {
    fn new() -> Self {
        Self {
            inner: Pbkdf2Kdf::default(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeyDerivation for CountingKdf {
    fn derive(&self, passphrase: &str) -> CryptoResult<DerivedKey> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.derive(passphrase)
    }

    fn algorithm(&self) -> &'static str {
        "counting"
    }
}

#[test]
fn test_passphrase_roundtrip() {
    let kdf = Pbkdf2Kdf::default();
    let blob = seal_blob(&kdf, "p@ss", b"tar.gz bytes").unwrap();

    assert!(blob.len() > NONCE_LEN);
    assert_eq!(open_blob(&kdf, "p@ss", &blob).unwrap(), b"tar.gz bytes");
}

#[test]
fn test_wrong_passphrase_and_corruption_share_one_error() {
    let kdf = Pbkdf2Kdf::default();
    let blob = seal_blob(&kdf, "p@ss", b"tar.gz bytes").unwrap();

    let wrong = open_blob(&kdf, "p@ss!", &blob).unwrap_err();

    let mut corrupted = blob.clone();
    corrupted[NONCE_LEN + 2] ^= 0x01;
    let corrupt = open_blob(&kdf, "p@ss", &corrupted).unwrap_err();

    let mut truncated = blob.clone();
    truncated.truncate(blob.len() - 1);
    let short = open_blob(&kdf, "p@ss", &truncated).unwrap_err();

    for err in [&wrong, &corrupt, &short] {
        assert!(matches!(err, CryptoError::Authentication));
    }
    assert_eq!(wrong.to_string(), corrupt.to_string());
}

#[test]
fn test_short_blob_skips_key_derivation() {
    let kdf = CountingKdf::new();
    let result = open_blob(&kdf, "p@ss", &[1u8; NONCE_LEN - 1]);

    assert!(matches!(result, Err(CryptoError::BlobTooShort { .. })));
    assert_eq!(kdf.calls(), 0);
}

#[test]
fn test_empty_passphrase_skips_key_derivation() {
    let kdf = CountingKdf::new();

    let result = open_blob(&kdf, "", &[0u8; 64]);
    assert!(matches!(result, Err(CryptoError::EmptyPassphrase)));
    assert_eq!(kdf.calls(), 0);

    let result = seal_blob(&kdf, "", b"data");
    assert!(matches!(result, Err(CryptoError::EmptyPassphrase)));
}
