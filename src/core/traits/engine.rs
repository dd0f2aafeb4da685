use crate::core::models::key_material::Fingerprint;

/// Raw failure reported by an engine adapter.
///
/// Only `KeyMaterialCodec` looks at these; the rest of the crate sees
/// the classified `SealError`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine not available: {0}")]
    Unavailable(String),

    #[error("key rejected: {0}")]
    KeyRejected(String),

    #[error("key has no usable encryption subkey")]
    NoEncryptionKey,

    #[error("no secret key able to decrypt this message")]
    NoSecretKey,

    #[error("secret key is protected and no passphrase was given")]
    PassphraseMissing,

    #[error("passphrase does not unlock the secret key")]
    BadPassphrase,

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Port for OpenPGP engines.
///
/// Implementations live in `adapters::engine` (in-process sequoia, system
/// gpg). An engine hands out a fresh session per call so that no imported
/// key survives the request that imported it.
pub trait OpenPgpEngine: Send + Sync {
    /// Human-readable name of this engine (e.g. "native", "gpg").
    fn name(&self) -> &str;

    /// Whether the engine can run on this host right now.
    fn is_available(&self) -> bool;

    /// Start a request-scoped session with an empty keyring.
    fn open_session(&self) -> Result<Box<dyn EngineSession + '_>, EngineError>;
}

/// One keyring's worth of engine state, dropped at the end of the call.
///
/// The call order mirrors a classic handle API: import, select the key,
/// then run the operation.
pub trait EngineSession {
    /// Choose between ASCII-armored and binary output for `encrypt`.
    fn set_armor(&mut self, armor: bool);

    /// Import an armored public key. `None` means the engine accepted the
    /// input but reported no key.
    fn import_public_key(&mut self, armored: &str) -> Result<Option<Fingerprint>, EngineError>;

    /// Register an imported key as an encryption target.
    fn add_encrypt_key(&mut self, fingerprint: &Fingerprint) -> Result<(), EngineError>;

    /// Encrypt for every registered target.
    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, EngineError>;

    /// Import an armored secret key.
    fn import_secret_key(&mut self, armored: &str) -> Result<Option<Fingerprint>, EngineError>;

    /// Make an imported secret key usable for decryption, unlocking it
    /// with `passphrase` when it is protected.
    fn add_decrypt_key(
        &mut self,
        fingerprint: &Fingerprint,
        passphrase: Option<&str>,
    ) -> Result<(), EngineError>;

    /// Decrypt with the registered secret keys.
    fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, EngineError>;
}
