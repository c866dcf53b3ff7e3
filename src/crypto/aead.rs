use super::{KEY_LEN, NONCE_LEN};
use crate::error::{Error, Result};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use getrandom::fill;
use zeroize::Zeroizing;

/// Fill buffer with cryptographically secure random bytes
pub(crate) fn secure_random(buf: &mut [u8]) -> Result<(), getrandom::Error> {
    fill(buf)
}

/// Encrypts `plaintext` with AES-256-GCM under a fresh random nonce.
///
/// Returns `nonce || ciphertext || tag`. No associated data is used.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)
        .map_err(|e| std::io::Error::other(format!("OS random generator unavailable: {e}")))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| Error::Format("encryption failed".into()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypts a `nonce || ciphertext || tag` blob produced by [`encrypt`].
pub fn decrypt(key: &[u8; KEY_LEN], blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if blob.len() < NONCE_LEN {
        return Err(Error::Format(format!(
            "ciphertext is {} bytes, shorter than the {NONCE_LEN}-byte nonce",
            blob.len()
        )));
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::Authentication)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_LEN] = [7u8; KEY_LEN];

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let messages: [&[u8]; 4] = [b"", b"a", b"secret data", &[0u8; 4096]];
        for message in messages {
            let blob = encrypt(&KEY, message).unwrap();
            assert_eq!(*decrypt(&KEY, &blob).unwrap(), message);
        }
    }

    #[test]
    fn nonce_is_prepended_and_fresh() {
        let a = encrypt(&KEY, b"same").unwrap();
        let b = encrypt(&KEY, b"same").unwrap();

        // nonce + plaintext + 16 byte tag
        assert_eq!(a.len(), NONCE_LEN + 4 + 16);
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn any_flipped_bit_fails_authentication() {
        let blob = encrypt(&KEY, b"tamper me").unwrap();

        for byte in 0..blob.len() {
            for bit in 0..8 {
                let mut tampered = blob.clone();
                tampered[byte] ^= 1 << bit;
                match decrypt(&KEY, &tampered) {
                    Err(Error::Authentication) => {}
                    other => panic!("byte {byte} bit {bit}: expected Authentication, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let blob = encrypt(&KEY, b"secret").unwrap();
        let other = [8u8; KEY_LEN];
        assert!(matches!(decrypt(&other, &blob), Err(Error::Authentication)));
    }

    #[test]
    fn blob_shorter_than_nonce_is_a_format_error() {
        let short = vec![0u8; NONCE_LEN - 1];
        assert!(matches!(decrypt(&KEY, &short), Err(Error::Format(_))));
    }

    #[test]
    fn nonce_only_blob_fails_authentication() {
        let blob = vec![0u8; NONCE_LEN];
        assert!(matches!(decrypt(&KEY, &blob), Err(Error::Authentication)));
    }
}
