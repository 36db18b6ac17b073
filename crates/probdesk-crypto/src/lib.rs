//! # probdesk-crypto
//!
//! Cryptographic primitives for probdesk backups.
//!
//! ## Cryptographic Primitives
//!
//! - **Symmetric cipher**: AES-256-GCM (AEAD), no associated data
//! - **Key derivation**: PBKDF2-HMAC-SHA256 (100,000 iterations) by default,
//!   Argon2id as an alternative, both over a fixed application salt
//! - **Random generation**: OS-seeded CSPRNG, fresh 12-byte nonce per seal
//!
//! ## Blob Format
//!
//! ```text
//! [Nonce: 12 bytes] [Ciphertext + Tag: 16 bytes]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use probdesk_crypto::{open_blob, seal_blob, Pbkdf2Kdf};
//!
//! let kdf = Pbkdf2Kdf::default();
//! let blob = seal_blob(&kdf, "p@ss", b"archive").unwrap();
//! assert_eq!(open_blob(&kdf, "p@ss", &blob).unwrap(), b"archive");
//! assert!(open_blob(&kdf, "wrong", &blob).is_err());
//! ```

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod kdf;

// Re-export commonly used types
pub use cipher::{NONCE_LEN, TAG_LEN};
pub use envelope::{open_blob, open_with_key, seal_blob, seal_with_key};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{
    Argon2idKdf, DerivedKey, KdfAlgorithm, KdfParams, KeyDerivation, Pbkdf2Kdf, APP_SALT,
};
