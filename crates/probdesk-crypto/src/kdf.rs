//! Passphrase-to-key derivation.
//!
//! Backups carry no per-archive salt, so every derivation here is
//! deterministic: one passphrase always yields one key. The salt is a fixed
//! application constant. Identical passphrases therefore derive identical
//! keys across all archives, which is acceptable for a single-operator
//! backup tool and not for multi-tenant use. Callers go through the
//! [`KeyDerivation`] trait so a per-archive salt scheme can replace this
//! without touching them.

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher::KEY_LEN;
use crate::error::{CryptoError, CryptoResult};

/// Application-wide salt shared by every backup.
pub const APP_SALT: &[u8] = b"problem-manager/backup/v1";

/// Minimum PBKDF2 iteration count accepted.
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

/// Key wrapper with automatic zeroization on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Create a new derived key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { key: bytes }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Turns a passphrase into a fixed-length symmetric key.
pub trait KeyDerivation: Send + Sync {
    /// Derive the 256-bit key for `passphrase`. Empty passphrases are rejected.
    fn derive(&self, passphrase: &str) -> CryptoResult<DerivedKey>;

    /// Short algorithm name for logs.
    fn algorithm(&self) -> &'static str;
}

// =============================================================================
// PBKDF2-HMAC-SHA256
// =============================================================================

/// PBKDF2-HMAC-SHA256 over the fixed application salt.
#[derive(Debug, Clone)]
pub struct Pbkdf2Kdf {
    iterations: u32,
}

impl Pbkdf2Kdf {
    /// Create a PBKDF2 derivation with a custom iteration count.
    pub fn new(iterations: u32) -> CryptoResult<Self> {
        if iterations < MIN_PBKDF2_ITERATIONS {
            return Err(CryptoError::InvalidInput(format!(
                "PBKDF2 needs at least {} iterations, got {}",
                MIN_PBKDF2_ITERATIONS, iterations
            )));
        }
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for Pbkdf2Kdf {
    fn default() -> Self {
        Self {
            iterations: MIN_PBKDF2_ITERATIONS,
        }
    }
}

impl KeyDerivation for Pbkdf2Kdf {
    fn derive(&self, passphrase: &str) -> CryptoResult<DerivedKey> {
        if passphrase.is_empty() {
            return Err(CryptoError::EmptyPassphrase);
        }

        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), APP_SALT, self.iterations, &mut key);

        let derived = DerivedKey::from_bytes(key);
        key.zeroize();
        Ok(derived)
    }

    fn algorithm(&self) -> &'static str {
        "pbkdf2-sha256"
    }
}

// =============================================================================
// ARGON2ID
// =============================================================================

/// Argon2id parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory in KiB (default: 65536 = 64 MiB).
    pub memory_kib: u32,
    /// Time iterations (default: 3).
    pub iterations: u32,
    /// Parallelism degree (default: 4).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MiB
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Create low-memory parameters (for resource-constrained environments).
    pub fn low_memory() -> Self {
        Self {
            memory_kib: 32768, // 32 MiB
            iterations: 4,
            parallelism: 4,
        }
    }
}

/// Argon2id over the fixed application salt.
#[derive(Debug, Clone, Default)]
pub struct Argon2idKdf {
    params: KdfParams,
}

impl Argon2idKdf {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }
}

impl KeyDerivation for Argon2idKdf {
    fn derive(&self, passphrase: &str) -> CryptoResult<DerivedKey> {
        if passphrase.is_empty() {
            return Err(CryptoError::EmptyPassphrase);
        }

        let argon2_params = Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut key = [0u8; KEY_LEN];
        argon2
            .hash_password_into(passphrase.as_bytes(), APP_SALT, &mut key)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        let derived = DerivedKey::from_bytes(key);
        key.zeroize();
        Ok(derived)
    }

    fn algorithm(&self) -> &'static str {
        "argon2id"
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// Configured key derivation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfAlgorithm {
    #[default]
    Pbkdf2,
    Argon2id,
}

impl KdfAlgorithm {
    /// Build the derivation with its default parameters.
    pub fn build(&self) -> Box<dyn KeyDerivation> {
        match self {
            KdfAlgorithm::Pbkdf2 => Box::new(Pbkdf2Kdf::default()),
            KdfAlgorithm::Argon2id => Box::new(Argon2idKdf::default()),
        }
    }
}

impl FromStr for KdfAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pbkdf2" | "pbkdf2-sha256" => Ok(KdfAlgorithm::Pbkdf2),
            "argon2id" | "argon2" => Ok(KdfAlgorithm::Argon2id),
            other => Err(CryptoError::InvalidInput(format!(
                "Unknown key derivation algorithm: {}",
                other
            ))),
        }
    }
}
