mod codec;
mod crypto;
mod error;
mod index;
mod location;
mod prompt;
mod sealed;
mod session;
mod storage;
mod store;

pub use crate::crypto::KdfParams;
pub use crate::error::{Error, Result};
pub use crate::location::{KeystoreLocation, default_data_dir};
pub use crate::prompt::{PASSWORD_ENV, Prompter, Terminal};
pub use crate::sealed::Sealed;
pub use crate::session::{
    KEYRING_SERVICE, KeyringBackend, MemoryBackend, SecretBackend, SessionCache, SessionContext,
};
pub use crate::store::{Keystore, SecretRecord};

use crate::storage::Storage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Identifiers of one keystore, as read from its index.
#[derive(Debug)]
pub struct KeystoreListing {
    pub name: String,
    pub identifiers: Result<Vec<String>>,
}

/// Keystore operations over a data directory.
///
/// Every operation is a self-contained load, mutate, save sequence; nothing
/// is kept in memory between calls except the session cache.
pub struct Snowpass<B, P> {
    data_dir: PathBuf,
    session: SessionCache<B>,
    prompter: P,
    kdf: KdfParams,
}

impl<B: SecretBackend, P: Prompter> Snowpass<B, P> {
    pub fn new(data_dir: PathBuf, session: SessionCache<B>, prompter: P) -> Self {
        Self {
            data_dir,
            session,
            prompter,
            kdf: KdfParams::default(),
        }
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn session(&self) -> &SessionCache<B> {
        &self.session
    }

    pub fn locate(&self, name: &str) -> Result<KeystoreLocation> {
        KeystoreLocation::new(&self.data_dir, name)
    }

    /// Session context for `name` with the session cache enabled.
    pub fn context(&self, name: &str) -> Result<SessionContext> {
        Ok(SessionContext::new(self.locate(name)?))
    }

    /// Creates an empty keystore and its index under a new master password.
    pub fn create(&mut self, ctx: &SessionContext) -> Result<()> {
        let location = ctx.keystore();
        let storage = location.storage();
        if storage.exists() {
            return Err(Error::AlreadyExists(location.name().to_string()));
        }

        let password = prompt::confirmed_password(&mut self.prompter, "Enter Master Password: ")?;

        codec::save(&storage, &Keystore::new(), &password, self.kdf)?;
        location.index().create_empty()?;
        info!(keystore = location.name(), "keystore created");

        self.refresh_session(ctx, &password);
        Ok(())
    }

    /// Stores a new value for `identifier`, overwriting any previous one.
    pub fn add(&mut self, ctx: &SessionContext, identifier: &str) -> Result<()> {
        require_identifier(identifier)?;
        let location = ctx.keystore();
        let storage = existing_storage(location)?;

        let (password, mut keystore) = self.unlock(ctx, &storage)?;
        let value = prompt::confirmed_data(&mut self.prompter)?;

        keystore.insert(identifier, SecretRecord::seal(&value, &password, self.kdf)?);
        codec::save(&storage, &keystore, &password, self.kdf)?;
        location.index().add(identifier)?;
        info!(keystore = location.name(), identifier, "secret stored");
        Ok(())
    }

    /// Decrypts and returns the value stored under `identifier`.
    pub fn get(&mut self, ctx: &SessionContext, identifier: &str) -> Result<Zeroizing<String>> {
        let storage = existing_storage(ctx.keystore())?;

        let (password, keystore) = self.unlock(ctx, &storage)?;
        keystore.get(identifier)?.open(&password, self.kdf)
    }

    /// Replaces the value of an existing identifier. The index is left as is.
    pub fn edit(&mut self, ctx: &SessionContext, identifier: &str) -> Result<()> {
        let location = ctx.keystore();
        let storage = existing_storage(location)?;

        let (password, mut keystore) = self.unlock(ctx, &storage)?;
        if !keystore.contains(identifier) {
            return Err(Error::IdentifierNotFound(identifier.to_string()));
        }

        let value = prompt::confirmed_data(&mut self.prompter)?;
        keystore.insert(identifier, SecretRecord::seal(&value, &password, self.kdf)?);
        codec::save(&storage, &keystore, &password, self.kdf)?;
        info!(keystore = location.name(), identifier, "secret updated");
        Ok(())
    }

    pub fn delete(&mut self, ctx: &SessionContext, identifier: &str) -> Result<()> {
        let location = ctx.keystore();
        let storage = existing_storage(location)?;

        let (password, mut keystore) = self.unlock(ctx, &storage)?;
        keystore.remove(identifier)?;
        codec::save(&storage, &keystore, &password, self.kdf)?;
        location.index().remove(identifier)?;
        info!(keystore = location.name(), identifier, "secret deleted");
        Ok(())
    }

    /// Removes the keystore file, its index and any cached session.
    ///
    /// The session is purged even when caching is disabled for this call.
    pub fn delete_keystore(&mut self, ctx: &SessionContext) -> Result<()> {
        let location = ctx.keystore();
        existing_storage(location)?.remove()?;

        let index = location.index();
        if index.exists() {
            index.delete()?;
        }
        info!(keystore = location.name(), "keystore deleted");

        self.forget_session(location);
        Ok(())
    }

    /// Re-seals every record and the keystore itself under a new password.
    pub fn change_password(&mut self, ctx: &SessionContext) -> Result<()> {
        let location = ctx.keystore();
        let storage = existing_storage(location)?;

        let (current, mut keystore) = self.unlock(ctx, &storage)?;

        let new = prompt::confirmed_password(&mut self.prompter, "Enter New Master Password: ")?;

        for (identifier, record) in keystore.records_mut() {
            let value = record.open(&current, self.kdf)?;
            *record = SecretRecord::seal(&value, &new, self.kdf)?;
            debug!(identifier = %identifier, "record re-sealed");
        }
        codec::save(&storage, &keystore, &new, self.kdf)?;
        info!(keystore = location.name(), "master password changed");

        // a cached old password would no longer open the keystore
        if ctx.use_session() {
            self.refresh_session(ctx, &new);
        } else {
            self.forget_session(location);
        }
        Ok(())
    }

    /// Identifiers of one keystore, read from its index without decrypting.
    pub fn list(&self, name: &str) -> Result<Vec<String>> {
        let location = self.locate(name)?;
        let index = location.index();
        if !index.exists() && !location.storage().exists() {
            return Err(Error::KeystoreNotFound(name.to_string()));
        }
        index.load()
    }

    /// Every keystore in the data directory, sorted by name.
    ///
    /// A keystore whose index cannot be read is reported with its error
    /// rather than failing the whole listing.
    pub fn list_all(&self) -> Result<Vec<KeystoreListing>> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str().and_then(location::keystore_name) {
                names.push(name.to_string());
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| {
                let identifiers = self.locate(&name).and_then(|loc| loc.index().load());
                KeystoreListing { name, identifiers }
            })
            .collect())
    }

    /// Opens the keystore with the cached password or, failing that, a prompt.
    ///
    /// A cached password that no longer opens the keystore is purged and the
    /// user is asked once. The session window restarts as soon as a password
    /// is verified, before the caller does anything else.
    fn unlock(
        &mut self,
        ctx: &SessionContext,
        storage: &Storage,
    ) -> Result<(Zeroizing<String>, Keystore)> {
        if let Some(cached) = self.cached_password(ctx) {
            match codec::load(storage, &cached, self.kdf) {
                Ok(keystore) => {
                    self.refresh_session(ctx, &cached);
                    return Ok((cached, keystore));
                }
                Err(Error::Authentication) => {
                    warn!(
                        keystore = ctx.keystore().name(),
                        "cached password rejected, prompting"
                    );
                    self.forget_session(ctx.keystore());
                }
                Err(e) => return Err(e),
            }
        }

        let password = self.prompter.password("Enter Master Password: ")?;
        if password.is_empty() {
            return Err(Error::EmptyInput("password"));
        }
        let keystore = codec::load(storage, &password, self.kdf)?;
        self.refresh_session(ctx, &password);
        Ok((password, keystore))
    }

    fn cached_password(&mut self, ctx: &SessionContext) -> Option<Zeroizing<String>> {
        if !ctx.use_session() {
            return None;
        }
        match self.session.recall(&ctx.keystore().id()) {
            Ok(password) => {
                debug!(keystore = ctx.keystore().name(), "using cached session");
                Some(password)
            }
            Err(Error::NoSession | Error::SessionExpired) => None,
            Err(e) => {
                warn!(error = %e, "session cache unavailable");
                None
            }
        }
    }

    /// Restarts the session window after `password` was verified.
    fn refresh_session(&mut self, ctx: &SessionContext, password: &str) {
        if !ctx.use_session() {
            return;
        }
        if let Err(e) = self.session.remember(&ctx.keystore().id(), password) {
            warn!(error = %e, "could not cache session");
        }
    }

    fn forget_session(&mut self, location: &KeystoreLocation) {
        if let Err(e) = self.session.forget(&location.id()) {
            warn!(error = %e, "could not clear cached session");
        }
    }
}

fn existing_storage(location: &KeystoreLocation) -> Result<Storage> {
    let storage = location.storage();
    if !storage.exists() {
        return Err(Error::KeystoreNotFound(location.name().to_string()));
    }
    Ok(storage)
}

fn require_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(Error::EmptyInput("identifier"));
    }
    Ok(())
}
