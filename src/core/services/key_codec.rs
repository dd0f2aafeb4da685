use crate::core::errors::{Result, SealError};
use crate::core::traits::engine::{EngineError, OpenPgpEngine};

/// Which half of the contract a failure came from.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Encrypt,
    Decrypt,
}

/// One-shot public-key encryption and private-key decryption.
///
/// Wraps whichever `OpenPgpEngine` was found usable at construction and
/// turns every engine failure into a classified `SealError`. Each call
/// opens a fresh engine session, so no key material outlives the call.
pub struct KeyMaterialCodec {
    engine: Option<Box<dyn OpenPgpEngine>>,
}

impl KeyMaterialCodec {
    /// Pick the first available engine, in order of preference.
    pub fn detect(candidates: Vec<Box<dyn OpenPgpEngine>>) -> Self {
        let engine = candidates.into_iter().find(|e| {
            let available = e.is_available();
            tracing::debug!(engine = e.name(), available, "probed OpenPGP engine");
            available
        });

        match &engine {
            Some(e) => tracing::info!(engine = e.name(), "OpenPGP engine selected"),
            None => tracing::warn!("no usable OpenPGP engine found"),
        }

        Self { engine }
    }

    /// Probe a single engine.
    #[cfg(test)]
    pub fn with_engine(engine: Box<dyn OpenPgpEngine>) -> Self {
        Self::detect(vec![engine])
    }

    /// A codec that refuses every operation with `EngineUnavailable`.
    #[cfg(test)]
    pub fn unavailable() -> Self {
        Self { engine: None }
    }

    /// Whether `detect` found an engine. Not re-checked per call.
    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.engine.as_deref().map(|e| e.name())
    }

    fn engine(&self) -> Result<&dyn OpenPgpEngine> {
        self.engine.as_deref().ok_or(SealError::EngineUnavailable)
    }

    /// Encrypt `plaintext` for an armored public key. Output is binary
    /// OpenPGP, suitable for a `.pgp` file.
    pub fn encrypt(&self, public_key_armored: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        let engine = self.engine()?;

        let public_key = public_key_armored.trim();
        if public_key.is_empty() {
            return Err(SealError::InvalidKey {
                reason: "public key is empty".into(),
            });
        }

        let op = Operation::Encrypt;
        let mut session = engine.open_session().map_err(|e| classify(e, op))?;
        session.set_armor(false);

        let fingerprint = session
            .import_public_key(public_key)
            .map_err(|e| classify(e, op))?
            .ok_or_else(|| SealError::InvalidKey {
                reason: "no public key found in the supplied text".into(),
            })?;
        tracing::debug!(engine = engine.name(), %fingerprint, "public key imported");

        session
            .add_encrypt_key(&fingerprint)
            .map_err(|e| classify(e, op))?;

        let ciphertext = session.encrypt(plaintext).map_err(|e| classify(e, op))?;
        if ciphertext.is_empty() {
            return Err(SealError::EncryptionFailed {
                reason: format!("{} returned no data", engine.name()),
            });
        }

        Ok(ciphertext)
    }

    /// Decrypt `ciphertext` with an armored private key. An empty
    /// passphrase counts as none.
    pub fn decrypt(
        &self,
        private_key_armored: &str,
        passphrase: Option<&str>,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let engine = self.engine()?;

        let private_key = private_key_armored.trim();
        if private_key.is_empty() {
            return Err(SealError::InvalidKey {
                reason: "private key is empty".into(),
            });
        }
        let passphrase = passphrase.filter(|p| !p.is_empty());

        let op = Operation::Decrypt;
        let mut session = engine.open_session().map_err(|e| classify(e, op))?;

        let fingerprint = session
            .import_secret_key(private_key)
            .map_err(|e| classify(e, op))?
            .ok_or_else(|| SealError::InvalidKey {
                reason: "no private key found in the supplied text".into(),
            })?;
        tracing::debug!(engine = engine.name(), %fingerprint, "private key imported");

        session
            .add_decrypt_key(&fingerprint, passphrase)
            .map_err(|e| classify(e, op))?;

        session.decrypt(ciphertext).map_err(|e| classify(e, op))
    }
}

/// Map an engine failure onto the domain taxonomy.
fn classify(err: EngineError, op: Operation) -> SealError {
    tracing::debug!(error = %err, ?op, "engine call failed");

    match err {
        EngineError::Unavailable(_) => SealError::EngineUnavailable,
        EngineError::KeyRejected(reason) => SealError::InvalidKey { reason },
        EngineError::NoEncryptionKey | EngineError::BadPassphrase => SealError::InvalidKey {
            reason: err.to_string(),
        },
        EngineError::PassphraseMissing => SealError::PassphraseRequired { hint: None },
        EngineError::NoSecretKey => SealError::DecryptionFailed {
            reason: err.to_string(),
        },
        EngineError::Failed(_) | EngineError::Io(_) => match op {
            Operation::Encrypt => SealError::EncryptionFailed {
                reason: err.to_string(),
            },
            Operation::Decrypt => SealError::DecryptionFailed {
                reason: err.to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::core::models::key_material::Fingerprint;
    use crate::core::traits::engine::EngineSession;

    /// Engine whose session replays canned answers.
    #[derive(Clone, Default)]
    struct ScriptedEngine {
        unavailable: bool,
        no_fingerprint: bool,
        empty_output: bool,
        import_error: Option<fn() -> EngineError>,
        unlock_error: Option<fn() -> EngineError>,
        decrypt_error: Option<fn() -> EngineError>,
        sessions: Arc<AtomicUsize>,
        availability_checks: Arc<AtomicUsize>,
    }

    struct ScriptedSession {
        script: ScriptedEngine,
        armor: Option<bool>,
    }

    impl OpenPgpEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            self.availability_checks.fetch_add(1, Ordering::SeqCst);
            !self.unavailable
        }

        fn open_session(&self) -> std::result::Result<Box<dyn EngineSession + '_>, EngineError> {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedSession {
                script: self.clone(),
                armor: None,
            }))
        }
    }

    impl ScriptedSession {
        fn import(&self) -> std::result::Result<Option<Fingerprint>, EngineError> {
            if let Some(err) = self.script.import_error {
                return Err(err());
            }
            if self.script.no_fingerprint {
                return Ok(None);
            }
            Ok(Fingerprint::parse("ABCD"))
        }
    }

    impl EngineSession for ScriptedSession {
        fn set_armor(&mut self, armor: bool) {
            self.armor = Some(armor);
        }

        fn import_public_key(
            &mut self,
            _armored: &str,
        ) -> std::result::Result<Option<Fingerprint>, EngineError> {
            self.import()
        }

        fn add_encrypt_key(&mut self, _: &Fingerprint) -> std::result::Result<(), EngineError> {
            Ok(())
        }

        fn encrypt(&mut self, plaintext: &[u8]) -> std::result::Result<Vec<u8>, EngineError> {
            assert_eq!(self.armor, Some(false), "codec must ask for binary output");
            if self.script.empty_output {
                return Ok(Vec::new());
            }
            Ok(plaintext.iter().rev().copied().chain([0xC1]).collect())
        }

        fn import_secret_key(
            &mut self,
            _armored: &str,
        ) -> std::result::Result<Option<Fingerprint>, EngineError> {
            self.import()
        }

        fn add_decrypt_key(
            &mut self,
            _: &Fingerprint,
            _passphrase: Option<&str>,
        ) -> std::result::Result<(), EngineError> {
            match self.script.unlock_error {
                Some(err) => Err(err()),
                None => Ok(()),
            }
        }

        fn decrypt(&mut self, ciphertext: &[u8]) -> std::result::Result<Vec<u8>, EngineError> {
            match self.script.decrypt_error {
                Some(err) => Err(err()),
                None => Ok(ciphertext.to_vec()),
            }
        }
    }

    fn bad_armor() -> EngineError {
        EngineError::KeyRejected("bad armor".into())
    }

    fn passphrase_missing() -> EngineError {
        EngineError::PassphraseMissing
    }

    fn bad_passphrase() -> EngineError {
        EngineError::BadPassphrase
    }

    fn corrupt_packet() -> EngineError {
        EngineError::Failed("corrupt packet".into())
    }

    fn no_secret_key() -> EngineError {
        EngineError::NoSecretKey
    }

    fn codec(engine: ScriptedEngine) -> KeyMaterialCodec {
        KeyMaterialCodec::with_engine(Box::new(engine))
    }

    #[test]
    fn unavailable_engine_is_reported_before_any_session() {
        let engine = ScriptedEngine {
            unavailable: true,
            ..Default::default()
        };
        let sessions = engine.sessions.clone();
        let codec = codec(engine);

        assert!(!codec.is_available());
        assert!(matches!(
            codec.encrypt("key", b"data"),
            Err(SealError::EngineUnavailable)
        ));
        assert!(matches!(
            codec.decrypt("key", None, b"data"),
            Err(SealError::EngineUnavailable)
        ));
        assert_eq!(sessions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn codec_without_engine_is_unavailable() {
        let codec = KeyMaterialCodec::unavailable();
        assert!(!codec.is_available());
        assert_eq!(codec.engine_name(), None);
        assert!(matches!(
            codec.encrypt("key", b""),
            Err(SealError::EngineUnavailable)
        ));
    }

    #[test]
    fn detect_skips_unavailable_candidates() {
        let missing = ScriptedEngine {
            unavailable: true,
            ..Default::default()
        };
        let present = ScriptedEngine::default();
        let codec = KeyMaterialCodec::detect(vec![Box::new(missing), Box::new(present)]);

        assert!(codec.is_available());
        assert_eq!(codec.engine_name(), Some("scripted"));
    }

    #[test]
    fn engine_is_checked_once_at_construction() {
        let engine = ScriptedEngine::default();
        let checks = engine.availability_checks.clone();
        let codec = KeyMaterialCodec::detect(vec![Box::new(engine)]);

        for _ in 0..3 {
            assert!(codec.is_available());
            codec.encrypt("key", b"data").unwrap();
            codec.decrypt("key", None, b"data").unwrap();
        }
        assert_eq!(checks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn detect_with_no_candidates_is_unavailable() {
        let codec = KeyMaterialCodec::detect(Vec::new());
        assert!(!codec.is_available());
    }

    #[test]
    fn blank_public_key_is_invalid_key() {
        let engine = ScriptedEngine::default();
        let sessions = engine.sessions.clone();
        let result = codec(engine).encrypt("  \n", b"data");

        assert!(matches!(result, Err(SealError::InvalidKey { .. })));
        assert_eq!(sessions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_fingerprint_is_invalid_key() {
        let result = codec(ScriptedEngine {
            no_fingerprint: true,
            ..Default::default()
        })
        .encrypt("key", b"data");

        assert!(matches!(result, Err(SealError::InvalidKey { .. })));
    }

    #[test]
    fn rejected_import_is_invalid_key_not_encryption_failure() {
        let result = codec(ScriptedEngine {
            import_error: Some(bad_armor),
            ..Default::default()
        })
        .encrypt("key", b"data");

        match result {
            Err(SealError::InvalidKey { reason }) => assert_eq!(reason, "bad armor"),
            other => panic!("expected InvalidKey, got {other:?}"),
        }
    }

    #[test]
    fn empty_engine_output_is_encryption_failure() {
        let result = codec(ScriptedEngine {
            empty_output: true,
            ..Default::default()
        })
        .encrypt("key", b"data");

        assert!(matches!(result, Err(SealError::EncryptionFailed { .. })));
    }

    #[test]
    fn empty_plaintext_is_accepted() {
        let out = codec(ScriptedEngine::default()).encrypt("key", b"").unwrap();
        assert_eq!(out, vec![0xC1]);
    }

    #[test]
    fn each_call_opens_its_own_session() {
        let engine = ScriptedEngine::default();
        let sessions = engine.sessions.clone();
        let codec = codec(engine);

        codec.encrypt("key", b"one").unwrap();
        codec.encrypt("key", b"two").unwrap();
        codec.decrypt("key", None, b"three").unwrap();

        assert_eq!(sessions.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn missing_passphrase_is_passphrase_required() {
        let result = codec(ScriptedEngine {
            unlock_error: Some(passphrase_missing),
            ..Default::default()
        })
        .decrypt("key", Some(""), b"data");

        assert!(matches!(result, Err(SealError::PassphraseRequired { .. })));
    }

    #[test]
    fn wrong_passphrase_is_invalid_key() {
        let result = codec(ScriptedEngine {
            unlock_error: Some(bad_passphrase),
            ..Default::default()
        })
        .decrypt("key", Some("nope"), b"data");

        assert!(matches!(result, Err(SealError::InvalidKey { .. })));
    }

    #[test]
    fn engine_decrypt_failure_is_decryption_failed() {
        let result = codec(ScriptedEngine {
            decrypt_error: Some(corrupt_packet),
            ..Default::default()
        })
        .decrypt("key", None, b"data");

        assert!(matches!(result, Err(SealError::DecryptionFailed { .. })));

        let result = codec(ScriptedEngine {
            decrypt_error: Some(no_secret_key),
            ..Default::default()
        })
        .decrypt("key", None, b"data");

        assert!(matches!(result, Err(SealError::DecryptionFailed { .. })));
    }

    #[cfg(feature = "native")]
    mod native {
        use super::*;
        use crate::adapters::engine::sequoia_engine::SequoiaEngine;
        use crate::test_support::generate_key;

        fn native_codec() -> KeyMaterialCodec {
            KeyMaterialCodec::with_engine(Box::new(SequoiaEngine::new()))
        }

        #[test]
        fn round_trip_restores_plaintext() {
            let key = generate_key("alice@example.org", None);
            let codec = native_codec();

            for plaintext in [&b""[..], b"hello world!", &[0u8, 255, 7, 7, 7][..]] {
                let ciphertext = codec.encrypt(&key.public, plaintext).unwrap();
                assert!(!ciphertext.is_empty());
                assert_ne!(ciphertext.as_slice(), plaintext);

                let decrypted = codec.decrypt(&key.secret, None, &ciphertext).unwrap();
                assert_eq!(decrypted, plaintext);
            }
        }

        #[test]
        fn ciphertext_is_binary_not_armored() {
            let key = generate_key("alice@example.org", None);
            let ciphertext = native_codec().encrypt(&key.public, b"payload").unwrap();

            assert!(!String::from_utf8_lossy(&ciphertext).contains("BEGIN PGP MESSAGE"));
        }

        #[test]
        fn garbage_public_key_is_invalid_key() {
            let result = native_codec().encrypt("-----BEGIN PGP PUBLIC KEY BLOCK-----\nnope", b"x");
            assert!(matches!(result, Err(SealError::InvalidKey { .. })));

            let result = native_codec().encrypt("definitely not a key", b"x");
            assert!(matches!(result, Err(SealError::InvalidKey { .. })));
        }

        #[test]
        fn protected_key_without_passphrase_needs_passphrase() {
            let key = generate_key("bob@example.org", Some("correct horse"));
            let codec = native_codec();
            let ciphertext = codec.encrypt(&key.public, b"for bob").unwrap();

            let result = codec.decrypt(&key.secret, None, &ciphertext);
            assert!(matches!(result, Err(SealError::PassphraseRequired { .. })));

            let result = codec.decrypt(&key.secret, Some("battery staple"), &ciphertext);
            assert!(matches!(result, Err(SealError::InvalidKey { .. })));

            let decrypted = codec
                .decrypt(&key.secret, Some("correct horse"), &ciphertext)
                .unwrap();
            assert_eq!(decrypted, b"for bob");
        }

        #[test]
        fn corrupt_ciphertext_is_decryption_failed() {
            let key = generate_key("carol@example.org", None);
            let codec = native_codec();
            let mut ciphertext = codec.encrypt(&key.public, b"intact").unwrap();
            let last = ciphertext.len() - 1;
            ciphertext[last] ^= 0xFF;
            ciphertext.truncate(last);

            let result = codec.decrypt(&key.secret, None, &ciphertext);
            assert!(matches!(result, Err(SealError::DecryptionFailed { .. })));

            let result = codec.decrypt(&key.secret, None, b"not pgp at all");
            assert!(matches!(result, Err(SealError::DecryptionFailed { .. })));
        }

        #[test]
        fn other_users_key_cannot_decrypt() {
            let alice = generate_key("alice@example.org", None);
            let mallory = generate_key("mallory@example.org", None);
            let codec = native_codec();
            let ciphertext = codec.encrypt(&alice.public, b"for alice only").unwrap();

            let result = codec.decrypt(&mallory.secret, None, &ciphertext);
            assert!(matches!(result, Err(SealError::DecryptionFailed { .. })));
        }

        #[test]
        fn public_key_is_rejected_as_private_key() {
            let key = generate_key("dave@example.org", None);
            let codec = native_codec();
            let ciphertext = codec.encrypt(&key.public, b"x").unwrap();

            let result = codec.decrypt(&key.public, None, &ciphertext);
            assert!(matches!(result, Err(SealError::InvalidKey { .. })));
        }
    }
}
