use std::path::PathBuf;

/// All domain errors for Sealdrop.
///
/// Each variant provides enough context to tell a bad selection or bad key
/// (fixable by the user) apart from a failure of the host system.
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error(
        "Not authenticated\n\n  \
         Pass --user <uid> (or set SEALDROP_USER), or call the API through\n  \
         the proxy that sets the user header."
    )]
    Unauthenticated,

    #[error("Invalid request: {detail}")]
    InvalidRequest { detail: String },

    #[error("File not found: {target}")]
    FileNotFound { target: String },

    #[error("Invalid target: '{target}' is a directory, select a file")]
    InvalidTarget { target: String },

    #[error("Recipient {id} not found")]
    RecipientNotFound { id: i64 },

    #[error(
        "No private key stored for this user\n\n  \
         Solutions:\n    \
         → Store one: sealdrop private-key set --key-file <path>\n    \
         → Check what is stored: sealdrop private-key show"
    )]
    PrivateKeyNotFound,

    #[error(
        "No OpenPGP engine available\n\n  \
         This build has no in-process engine and `gpg` was not found.\n\n  \
         Solutions:\n    \
         → Install GnuPG and make sure `gpg` is in PATH\n    \
         → Or set [engine] gpg_path in the config file"
    )]
    EngineUnavailable,

    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    #[error(
        "The private key is protected by a passphrase{}\n\n  \
         Pass it with --passphrase (or SEALDROP_PASSPHRASE).",
        .hint.as_deref().map(|h| format!(" (hint: {h})")).unwrap_or_default()
    )]
    PassphraseRequired { hint: Option<String> },

    #[error("Encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error(
        "Decryption failed: {reason}\n\n  \
         The file was not encrypted for your key, or it is damaged."
    )]
    DecryptionFailed { reason: String },

    #[error("Storage error: {detail}")]
    StorageError { detail: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("Audit log error: {detail}")]
    AuditError { detail: String },

    #[error("Cannot read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller can fix it: selection, key, passphrase or payload.
    BadInput,
    NotFound,
    Unauthenticated,
    /// Engine missing, disk full, broken config.
    SystemFailure,
}

impl SealError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SealError::Unauthenticated => ErrorKind::Unauthenticated,
            SealError::FileNotFound { .. }
            | SealError::RecipientNotFound { .. }
            | SealError::PrivateKeyNotFound => ErrorKind::NotFound,
            SealError::InvalidRequest { .. }
            | SealError::InvalidTarget { .. }
            | SealError::InvalidKey { .. }
            | SealError::PassphraseRequired { .. }
            | SealError::DecryptionFailed { .. } => ErrorKind::BadInput,
            SealError::EngineUnavailable
            | SealError::EncryptionFailed { .. }
            | SealError::StorageError { .. }
            | SealError::InvalidConfig { .. }
            | SealError::AuditError { .. }
            | SealError::ReadFailed { .. }
            | SealError::Io(_) => ErrorKind::SystemFailure,
        }
    }

    pub(crate) fn invalid_request(detail: impl Into<String>) -> Self {
        SealError::InvalidRequest {
            detail: detail.into(),
        }
    }

    pub(crate) fn storage(detail: impl Into<String>) -> Self {
        SealError::StorageError {
            detail: detail.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SealError>;
