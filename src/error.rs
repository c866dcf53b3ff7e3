use thiserror::Error;

/// Errors produced by the keystore engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("keystore '{0}' already exists")]
    AlreadyExists(String),

    #[error("keystore '{0}' does not exist")]
    KeystoreNotFound(String),

    #[error("identifier '{0}' not found")]
    IdentifierNotFound(String),

    /// A confirmation entry did not match the first entry.
    #[error("{0} entries do not match")]
    Mismatch(&'static str),

    #[error("Invalid password or corrupted data")]
    Authentication,

    #[error("malformed encrypted data: {0}")]
    Format(String),

    #[error("malformed keystore contents: {0}")]
    Parse(String),

    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("session expired")]
    SessionExpired,

    #[error("no active session")]
    NoSession,

    #[error("secure credential store error: {0}")]
    SecretStore(String),

    #[error("invalid keystore name '{0}'")]
    InvalidName(String),

    #[error("no {0} provided")]
    EmptyInput(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
