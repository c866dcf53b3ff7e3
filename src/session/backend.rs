//! Secure storage backends for session entries.

use std::collections::HashMap;

use keyring::Entry;

use crate::error::{Error, Result};

/// Minimal capability over an OS-level secret store.
pub trait SecretBackend {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()>;

    /// Returns `None` when no entry exists under `key`.
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Removing a missing entry is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// The platform credential store (Secret Service, Keychain, Credential Manager).
#[derive(Debug, Clone)]
pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).map_err(|e| Error::SecretStore(format!("keyring init: {e}")))
    }
}

impl SecretBackend for KeyringBackend {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let value = std::str::from_utf8(value)
            .map_err(|_| Error::SecretStore("keyring values must be UTF-8".into()))?;
        self.entry(key)?
            .set_password(value)
            .map_err(|e| Error::SecretStore(format!("store {key}: {e}")))
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value.into_bytes())),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::SecretStore(format!("load {key}: {e}"))),
        }
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::SecretStore(format!("delete {key}: {e}"))),
        }
    }
}

/// Process-local backend, for tests and for running without an OS keyring.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SecretBackend for MemoryBackend {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
