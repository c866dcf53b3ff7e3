//! Where keystores live on disk.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Error, Result};
use crate::index::Index;
use crate::storage::Storage;

/// Extension of keystore files. The content is a sealed envelope, not JSON.
pub const KEYSTORE_EXT: &str = "json";
/// Suffix appended to the keystore name for its index file.
pub const INDEX_SUFFIX: &str = "_index";

/// Platform data directory for keystores, e.g. `~/.local/share/snowpass/_data`.
pub fn default_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "snowpass").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine platform directories",
        ))
    })?;

    Ok(project_dirs.data_dir().join("_data"))
}

/// Paths of a named keystore and its index inside a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreLocation {
    name: String,
    keystore: PathBuf,
    index: PathBuf,
}

impl KeystoreLocation {
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `name` is empty, contains a path
    /// separator, or would collide with an index file.
    pub fn new(data_dir: &Path, name: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            keystore: data_dir.join(format!("{name}.{KEYSTORE_EXT}")),
            index: data_dir.join(format!("{name}{INDEX_SUFFIX}.{KEYSTORE_EXT}")),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity used to scope session entries: the keystore's file name.
    pub fn id(&self) -> String {
        format!("{}.{KEYSTORE_EXT}", self.name)
    }

    pub fn keystore_path(&self) -> &Path {
        &self.keystore
    }

    pub fn index_path(&self) -> &Path {
        &self.index
    }

    pub fn storage(&self) -> Storage {
        Storage::new(self.keystore.clone())
    }

    pub fn index(&self) -> Index {
        Index::new(Storage::new(self.index.clone()))
    }
}

fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.ends_with(INDEX_SUFFIX);

    if invalid {
        Err(Error::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Returns the keystore name for a directory entry, or `None` for index files,
/// temporary files and anything else.
pub(crate) fn keystore_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(&format!(".{KEYSTORE_EXT}"))?;
    validate_name(stem).ok().map(|_| stem)
}
