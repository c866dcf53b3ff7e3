//! Text envelope for password-sealed data.
//!
//! Both keystore files and the individual secret records use the same
//! encoding:
//! ```text
//! hex(SALT) ":" hex(NONCE || CIPHERTEXT || TAG)
//! ```
//! Every call to [`Sealed::seal`] draws a fresh salt and nonce.

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams, SALT_LEN};
use crate::error::{Error, Result};

/// Separator between the salt and payload hex strings.
pub const SEPARATOR: char = ':';

/// A salt plus the nonce-prefixed ciphertext it protects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    salt: [u8; SALT_LEN],
    payload: Vec<u8>,
}

impl Sealed {
    /// Derives a key from `password` under a fresh salt and encrypts `plaintext`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Derivation`] if the key cannot be derived.
    pub fn seal(plaintext: &[u8], password: &str, kdf: KdfParams) -> Result<Self> {
        let (key, salt) = crypto::derive_key(password, None, kdf)?;
        let payload = crypto::encrypt(&key, plaintext)?;
        Ok(Self { salt, payload })
    }

    /// Re-derives the key from the stored salt and decrypts the payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the password is wrong or the data
    /// was modified.
    pub fn open(&self, password: &str, kdf: KdfParams) -> Result<Zeroizing<Vec<u8>>> {
        let (key, _) = crypto::derive_key(password, Some(self.salt), kdf)?;
        crypto::decrypt(&key, &self.payload)
    }

    /// Returns the salt used for key derivation.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Returns `nonce || ciphertext || tag`.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl FromStr for Sealed {
    type Err = Error;

    /// Parses `salt_hex:payload_hex`.
    ///
    /// Only the first separator splits; anything after it must be valid hex.
    fn from_str(s: &str) -> Result<Self> {
        let (salt_hex, payload_hex) = s
            .split_once(SEPARATOR)
            .ok_or_else(|| Error::Format("missing salt separator".into()))?;

        let salt = hex::decode(salt_hex)
            .map_err(|e| Error::Format(format!("invalid salt encoding: {e}")))?;
        let salt: [u8; SALT_LEN] = salt.try_into().map_err(|v: Vec<u8>| {
            Error::Format(format!("salt is {} bytes, expected {SALT_LEN}", v.len()))
        })?;

        let payload = hex::decode(payload_hex)
            .map_err(|e| Error::Format(format!("invalid ciphertext encoding: {e}")))?;

        Ok(Self { salt, payload })
    }
}

impl fmt::Display for Sealed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}",
            hex::encode(self.salt),
            hex::encode(&self.payload)
        )
    }
}
