//! Cryptographic primitives for the keystore.
//!
//! Provides scrypt key derivation and AES-256-GCM authenticated encryption.

pub mod aead;
pub mod kdf;

pub use aead::{decrypt, encrypt};
pub use kdf::{KdfParams, derive_key};

/// Length of the salt (8 bytes).
pub const SALT_LEN: usize = 8;
/// Length of the nonce (12 bytes for AES-GCM).
pub const NONCE_LEN: usize = 12;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
