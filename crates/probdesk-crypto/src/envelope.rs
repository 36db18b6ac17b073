//! Passphrase-sealed blob format.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Nonce (12 bytes, plaintext)  │
//! ├──────────────────────────────┤
//! │ AES-256-GCM ciphertext       │
//! │   + 16-byte tag              │
//! └──────────────────────────────┘
//! ```
//!
//! There is no magic number or version header. A fresh random nonce is
//! generated for every seal.

use tracing::debug;

use crate::cipher::{generate_nonce, open, seal, NONCE_LEN};
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{DerivedKey, KeyDerivation};

/// Seal `plaintext` under an already derived key.
pub fn seal_with_key(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let nonce = generate_nonce();
    let ciphertext = seal(key.as_bytes(), &nonce, plaintext)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Open a blob produced by [`seal_with_key`].
pub fn open_with_key(key: &DerivedKey, blob: &[u8]) -> CryptoResult<Vec<u8>> {
    let (nonce, ciphertext) = split_blob(blob)?;
    open(key.as_bytes(), &nonce, ciphertext)
}

/// Derive a key from `passphrase` and seal `plaintext` into a blob.
pub fn seal_blob(
    kdf: &dyn KeyDerivation,
    passphrase: &str,
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let key = kdf.derive(passphrase)?;
    let blob = seal_with_key(&key, plaintext)?;
    debug!(
        subsystem = "crypto",
        component = "envelope",
        op = "seal",
        kdf = kdf.algorithm(),
        plaintext_len = plaintext.len(),
        byte_len = blob.len(),
        "Sealed blob"
    );
    Ok(blob)
}

/// Open a blob with a key derived from `passphrase`.
///
/// The passphrase and minimum length are checked before any key
/// derivation or decryption is attempted.
pub fn open_blob(kdf: &dyn KeyDerivation, passphrase: &str, blob: &[u8]) -> CryptoResult<Vec<u8>> {
    if passphrase.is_empty() {
        return Err(CryptoError::EmptyPassphrase);
    }
    split_blob(blob)?;

    let key = kdf.derive(passphrase)?;
    open_with_key(&key, blob)
}

fn split_blob(blob: &[u8]) -> CryptoResult<([u8; NONCE_LEN], &[u8])> {
    if blob.len() < NONCE_LEN {
        return Err(CryptoError::BlobTooShort {
            actual: blob.len(),
            minimum: NONCE_LEN,
        });
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(nonce_bytes);
    Ok((nonce, ciphertext))
}
