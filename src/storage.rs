//! Whole-file persistence for keystore and index files.

use crate::crypto::aead::secure_random;
use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One file in the data directory, always read and rewritten in full.
///
/// Backs both the sealed keystore envelope and its plaintext index.
#[derive(Clone, Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// [`Error::Io`](crate::Error::Io) with `NotFound` if the file is missing.
    pub fn load(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    pub fn remove(&self) -> Result<()> {
        Ok(fs::remove_file(&self.path)?)
    }

    /// Replaces the file contents with `data`.
    ///
    /// The bytes go to a scratch file beside the target which is synced and
    /// then swapped in, so readers see either the previous envelope or the
    /// new one. The data directory is created on first use. On failure the
    /// scratch file is removed and the previous contents stay in place.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let scratch = self.scratch_path()?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&scratch)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = self.replace_with(&scratch) {
            let _ = fs::remove_file(&scratch);
            return Err(e);
        }

        #[cfg(unix)]
        {
            if let Some(parent) = self.path.parent() {
                fs::File::open(parent)?.sync_all()?;
            }
        }

        Ok(())
    }

    /// `<file name>.tmp.<16 hex digits>` in the target's directory.
    ///
    /// Never ends in `.json`, so a leftover is not mistaken for a keystore.
    fn scratch_path(&self) -> Result<PathBuf> {
        let mut suffix = [0u8; 8];
        secure_random(&mut suffix).map_err(|e| io::Error::other(e.to_string()))?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "storage path has no file name")
            })?
            .to_string_lossy();

        Ok(self
            .path
            .with_file_name(format!("{file_name}.tmp.{}", hex::encode(suffix))))
    }

    /// `ReplaceFileW` with write-through; a plain rename for the first write,
    /// since `ReplaceFileW` needs an existing target.
    #[cfg(target_os = "windows")]
    fn replace_with(&self, scratch: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            fs::rename(scratch, &self.path)?;
            return Ok(());
        }

        fn wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }
        let target = wide(self.path.as_os_str());
        let replacement = wide(scratch.as_os_str());

        // SAFETY: both buffers are NUL-terminated UTF-16 and outlive the call;
        // the optional arguments are null.
        let ok = unsafe {
            ReplaceFileW(
                target.as_ptr(),
                replacement.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(())
    }

    /// Same-directory `rename`, atomic on one filesystem.
    #[cfg(not(target_os = "windows"))]
    fn replace_with(&self, scratch: &Path) -> Result<()> {
        fs::rename(scratch, &self.path)?;
        Ok(())
    }
}
