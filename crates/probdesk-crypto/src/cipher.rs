//! AES-256-GCM cipher operations.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random nonce (12 bytes).
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    generate_random()
}

/// Encrypt plaintext with AES-256-GCM. No associated data.
///
/// Returns ciphertext with appended authentication tag (16 bytes).
pub fn seal(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let nonce = Nonce::from_slice(nonce);

    cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))
}

/// Decrypt ciphertext with AES-256-GCM.
///
/// The ciphertext must include the authentication tag at the end. Every
/// failure, including input shorter than the tag, is reported as
/// [`CryptoError::Authentication`].
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::Authentication)?;

    let nonce = Nonce::from_slice(nonce);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::Authentication)
}
