//! Plaintext list of identifiers kept next to each keystore.
//!
//! The index lets keystores be listed without a password. It is written
//! separately from the keystore blob, so the two can drift apart if a process
//! dies between the writes.

use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::Storage;

/// The `<name>_index.json` file of a keystore: a JSON array of identifiers.
#[derive(Clone, Debug)]
pub struct Index {
    storage: Storage,
}

impl Index {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn exists(&self) -> bool {
        self.storage.exists()
    }

    /// Writes an empty array, replacing any existing index.
    pub fn create_empty(&self) -> Result<()> {
        self.write(&[])
    }

    /// Reads the identifiers in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Parse`]
    /// if it is not a JSON array of strings.
    pub fn load(&self) -> Result<Vec<String>> {
        let data = self.storage.load()?;
        serde_json::from_slice(&data).map_err(|e| {
            Error::Parse(format!(
                "index {} is corrupted: {e}",
                self.storage.path().display()
            ))
        })
    }

    /// Appends `identifier` unless it is already present.
    pub fn add(&self, identifier: &str) -> Result<()> {
        let mut identifiers = self.load()?;
        if identifiers.iter().any(|id| id == identifier) {
            return Ok(());
        }
        identifiers.push(identifier.to_string());
        self.write(&identifiers)?;

        debug!(identifier, "index entry added");
        Ok(())
    }

    /// Removes the first occurrence of `identifier`, keeping the order of the rest.
    pub fn remove(&self, identifier: &str) -> Result<()> {
        let mut identifiers = self.load()?;
        if let Some(pos) = identifiers.iter().position(|id| id == identifier) {
            identifiers.remove(pos);
            self.write(&identifiers)?;
            debug!(identifier, "index entry removed");
        }
        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        self.storage.remove()
    }

    fn write(&self, identifiers: &[String]) -> Result<()> {
        let data = serde_json::to_vec(identifiers).map_err(|e| Error::Parse(e.to_string()))?;
        self.storage.save(&data)
    }
}
