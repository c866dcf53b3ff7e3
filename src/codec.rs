//! Keystore codec: the sealed on-disk representation of a [`Keystore`].
//!
//! A keystore file holds a single [`Sealed`] envelope in text form. Every save
//! derives a new key under a freshly generated salt, so each write pays the
//! full KDF cost.

use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::KdfParams;
use crate::error::{Error, Result};
use crate::sealed::Sealed;
use crate::storage::Storage;
use crate::store::Keystore;

/// Serializes, seals and writes `keystore`, replacing any prior content.
pub fn save(storage: &Storage, keystore: &Keystore, password: &str, kdf: KdfParams) -> Result<()> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(keystore).map_err(|e| Error::Parse(e.to_string()))?,
    );
    let sealed = Sealed::seal(&plaintext, password, kdf)?;
    storage.save(sealed.to_string().as_bytes())?;

    debug!(path = %storage.path().display(), records = keystore.len(), "keystore saved");
    Ok(())
}

/// Reads, opens and parses the keystore at `storage`.
///
/// # Errors
///
/// - [`Error::Format`] if the file is not a valid envelope
/// - [`Error::Authentication`] on a wrong password or modified data
/// - [`Error::Parse`] if the decrypted content is not a keystore
pub fn load(storage: &Storage, password: &str, kdf: KdfParams) -> Result<Keystore> {
    let data = storage.load()?;
    let text = std::str::from_utf8(&data)
        .map_err(|_| Error::Format("keystore file is not text".into()))?;

    let sealed: Sealed = text.trim_end().parse()?;
    let plaintext = sealed.open(password, kdf)?;

    let keystore: Keystore =
        serde_json::from_slice(&plaintext).map_err(|e| Error::Parse(e.to_string()))?;

    debug!(path = %storage.path().display(), records = keystore.len(), "keystore loaded");
    Ok(keystore)
}
