use scrypt::Params;
use zeroize::Zeroizing;

use super::{KEY_LEN, SALT_LEN, aead::secure_random};
use crate::error::{Error, Result};

/// scrypt cost parameters.
///
/// The work factor is stored as `log2(N)` so it is always a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            // N = 32768
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

impl KdfParams {
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<Self> {
        let params = Self { log_n, r, p };
        params.validate()?;
        Ok(params)
    }

    /// Builds parameters from the raw work factor `N`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Derivation`] if `n` is not a power of two greater than one,
    /// or if scrypt rejects the combination.
    pub fn from_cost(n: u64, r: u32, p: u32) -> Result<Self> {
        if n < 2 || !n.is_power_of_two() {
            return Err(Error::Derivation(format!(
                "work factor {n} is not a power of two"
            )));
        }
        // trailing_zeros of a u64 is at most 63
        Self::new(n.trailing_zeros() as u8, r, p)
    }

    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    pub fn validate(&self) -> Result<()> {
        self.to_scrypt().map(|_| ())
    }

    fn to_scrypt(self) -> Result<Params> {
        Params::new(self.log_n, self.r, self.p, KEY_LEN)
            .map_err(|e| Error::Derivation(format!("invalid scrypt parameters: {e}")))
    }
}

/// Derives a 32-byte key from `password`.
///
/// When `salt` is `None` a fresh random salt is generated. The salt actually
/// used is returned next to the key.
pub fn derive_key(
    password: &str,
    salt: Option<[u8; SALT_LEN]>,
    kdf: KdfParams,
) -> Result<(Zeroizing<[u8; KEY_LEN]>, [u8; SALT_LEN])> {
    let salt = match salt {
        Some(salt) => salt,
        None => generate_salt()?,
    };

    let params = kdf.to_scrypt()?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(password.as_bytes(), &salt, &params, key.as_mut_slice())
        .map_err(|e| Error::Derivation(format!("scrypt failed: {e}")))?;

    Ok((key, salt))
}

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt).map_err(|e| Error::Derivation(e.to_string()))?;
    Ok(salt)
}
