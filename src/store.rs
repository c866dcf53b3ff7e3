use crate::crypto::KdfParams;
use crate::error::{Error, Result};
use crate::sealed::Sealed;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zeroize::Zeroizing;

/// Decrypted keystore contents: identifier to sealed secret.
///
/// Serialized as `{"Passwords": {...}}`.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Keystore {
    #[serde(rename = "Passwords", default)]
    records: BTreeMap<String, SecretRecord>,
}

/// A single secret sealed under the keystore's master password.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct SecretRecord(String);

impl SecretRecord {
    /// Seals `value` with its own fresh salt and nonce.
    pub fn seal(value: &str, password: &str, kdf: KdfParams) -> Result<Self> {
        Ok(Self(Sealed::seal(value.as_bytes(), password, kdf)?.to_string()))
    }

    pub fn open(&self, password: &str, kdf: KdfParams) -> Result<Zeroizing<String>> {
        let sealed: Sealed = self.0.parse()?;
        let plaintext = sealed.open(password, kdf)?;
        let value = std::str::from_utf8(&plaintext)
            .map_err(|e| Error::Parse(format!("secret is not valid UTF-8: {e}")))?;
        Ok(Zeroizing::new(value.to_owned()))
    }
}

impl Keystore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the record for `identifier`.
    pub fn insert(&mut self, identifier: &str, record: SecretRecord) {
        self.records.insert(identifier.to_string(), record);
    }

    pub fn get(&self, identifier: &str) -> Result<&SecretRecord> {
        self.records
            .get(identifier)
            .ok_or_else(|| Error::IdentifierNotFound(identifier.to_string()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(identifier)
    }

    pub fn remove(&mut self, identifier: &str) -> Result<SecretRecord> {
        self.records
            .remove(identifier)
            .ok_or_else(|| Error::IdentifierNotFound(identifier.to_string()))
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = (&String, &mut SecretRecord)> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(4, 8, 1).unwrap()
    }

    fn record(value: &str) -> SecretRecord {
        SecretRecord::seal(value, "pw", fast()).unwrap()
    }

    #[test]
    fn create_new_keystore_is_empty() {
        let ks = Keystore::new();
        assert!(ks.is_empty());
        assert_eq!(ks.identifiers().count(), 0);
    }

    #[test]
    fn insert_and_open_record() {
        let mut ks = Keystore::new();
        ks.insert("A", record("B"));
        assert_eq!(*ks.get("A").unwrap().open("pw", fast()).unwrap(), "B");
    }

    #[test]
    fn insert_overwrites_existing() {
        let mut ks = Keystore::new();
        ks.insert("A", record("B"));
        ks.insert("A", record("C"));
        assert_eq!(ks.len(), 1);
        assert_eq!(*ks.get("A").unwrap().open("pw", fast()).unwrap(), "C");
    }

    #[test]
    fn get_not_existing_identifier_fails() {
        let ks = Keystore::new();
        match ks.get("A") {
            Err(Error::IdentifierNotFound(k)) => assert_eq!(k, "A"),
            other => panic!("expected IdentifierNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn remove_identifier_works() {
        let mut ks = Keystore::new();
        ks.insert("A", record("B"));
        ks.remove("A").unwrap();
        assert!(!ks.contains("A"));
    }

    #[test]
    fn remove_not_existing_identifier_fails() {
        let mut ks = Keystore::new();
        match ks.remove("A") {
            Err(Error::IdentifierNotFound(k)) => assert_eq!(k, "A"),
            other => panic!("expected IdentifierNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn record_with_wrong_password_fails() {
        let rec = record("B");
        assert!(matches!(rec.open("other", fast()), Err(Error::Authentication)));
    }

    #[test]
    fn serializes_under_passwords_field() {
        let mut ks = Keystore::new();
        ks.insert("github", SecretRecord("00:11".into()));

        let json = serde_json::to_value(&ks).unwrap();
        assert_eq!(json, serde_json::json!({ "Passwords": { "github": "00:11" } }));

        let parsed: Keystore = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, ks);
    }

    #[test]
    fn missing_passwords_field_is_empty() {
        let parsed: Keystore = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }
}
