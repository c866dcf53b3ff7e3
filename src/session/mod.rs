//! Short-lived cache of verified master passwords.
//!
//! Each keystore gets two entries in the backend: the password and the
//! RFC 3339 time it was last verified. An entry is usable while it is younger
//! than the session TTL; stale entries are purged when next read.

mod backend;

pub use backend::{KeyringBackend, MemoryBackend, SecretBackend};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::location::KeystoreLocation;

/// Service name under which session entries are stored in the OS keyring.
pub const KEYRING_SERVICE: &str = "snowpass";

/// Idle window after which a cached password must be entered again.
pub const SESSION_TTL_MINUTES: i64 = 20;

/// Per-invocation session settings for one keystore.
#[derive(Debug, Clone)]
pub struct SessionContext {
    keystore: KeystoreLocation,
    use_session: bool,
}

impl SessionContext {
    pub fn new(keystore: KeystoreLocation) -> Self {
        Self {
            keystore,
            use_session: true,
        }
    }

    /// Never read from or write to the session cache.
    pub fn without_session(mut self) -> Self {
        self.use_session = false;
        self
    }

    pub fn keystore(&self) -> &KeystoreLocation {
        &self.keystore
    }

    pub fn use_session(&self) -> bool {
        self.use_session
    }
}

pub struct SessionCache<B> {
    backend: B,
    ttl: Duration,
}

impl<B: SecretBackend> SessionCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            ttl: Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stores `password` for `keystore_id`, stamped with the current time.
    pub fn remember(&mut self, keystore_id: &str, password: &str) -> Result<()> {
        self.remember_at(keystore_id, password, Utc::now())
    }

    pub fn remember_at(
        &mut self,
        keystore_id: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.backend
            .put(&password_key(keystore_id), password.as_bytes())?;
        self.backend
            .put(&timestamp_key(keystore_id), now.to_rfc3339().as_bytes())?;
        debug!(keystore_id, "session refreshed");
        Ok(())
    }

    /// Returns the cached password for `keystore_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoSession`] if nothing is cached
    /// - [`Error::SessionExpired`] if the entry is older than the TTL; both
    ///   entries are removed
    pub fn recall(&mut self, keystore_id: &str) -> Result<Zeroizing<String>> {
        self.recall_at(keystore_id, Utc::now())
    }

    pub fn recall_at(&mut self, keystore_id: &str, now: DateTime<Utc>) -> Result<Zeroizing<String>> {
        let Some(stamp) = self.backend.get(&timestamp_key(keystore_id))? else {
            return Err(Error::NoSession);
        };

        let stamp = std::str::from_utf8(&stamp)
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        let Some(stamp) = stamp else {
            debug!(keystore_id, "unreadable session timestamp");
            self.forget(keystore_id)?;
            return Err(Error::NoSession);
        };

        if now.signed_duration_since(stamp) >= self.ttl {
            debug!(keystore_id, "session expired");
            self.forget(keystore_id)?;
            return Err(Error::SessionExpired);
        }

        let Some(password) = self.backend.get(&password_key(keystore_id))? else {
            self.forget(keystore_id)?;
            return Err(Error::NoSession);
        };
        let password = String::from_utf8(password)
            .map_err(|_| Error::SecretStore("cached password is not UTF-8".into()))?;
        Ok(Zeroizing::new(password))
    }

    /// Removes both entries for `keystore_id`.
    pub fn forget(&mut self, keystore_id: &str) -> Result<()> {
        self.backend.remove(&password_key(keystore_id))?;
        self.backend.remove(&timestamp_key(keystore_id))
    }
}

fn password_key(keystore_id: &str) -> String {
    format!("keystorePassword_{keystore_id}")
}

fn timestamp_key(keystore_id: &str) -> String {
    format!("timestamp_{keystore_id}")
}
