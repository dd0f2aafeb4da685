use std::io::{Read, Write};

use sequoia_openpgp as openpgp;

use openpgp::crypto::{KeyPair, Password, SessionKey};
use openpgp::packet::{PKESK, SKESK};
use openpgp::parse::Parse;
use openpgp::parse::stream::{
    DecryptionHelper, DecryptorBuilder, MessageStructure, VerificationHelper,
};
use openpgp::policy::StandardPolicy;
use openpgp::serialize::stream::{Armorer, Encryptor, LiteralWriter, Message, Recipient};
use openpgp::types::SymmetricAlgorithm;
use openpgp::{Cert, KeyHandle};

use crate::core::models::key_material::Fingerprint;
use crate::core::traits::engine::{EngineError, EngineSession, OpenPgpEngine};

/// In-process OpenPGP engine backed by Sequoia.
///
/// Needs nothing from the host, so it is always available when compiled in.
#[derive(Debug, Default)]
pub struct SequoiaEngine;

impl SequoiaEngine {
    pub fn new() -> Self {
        Self
    }
}

impl OpenPgpEngine for SequoiaEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn open_session(&self) -> Result<Box<dyn EngineSession + '_>, EngineError> {
        Ok(Box::new(SequoiaSession::default()))
    }
}

/// Keyring held in memory for the duration of one call.
#[derive(Default)]
struct SequoiaSession {
    armor: bool,
    public_certs: Vec<Cert>,
    targets: Vec<Cert>,
    secret_certs: Vec<Cert>,
    unlocked: Vec<(Cert, KeyPair)>,
}

fn parse_cert(armored: &str) -> Result<Cert, EngineError> {
    Cert::from_bytes(armored.as_bytes()).map_err(|e| EngineError::KeyRejected(e.to_string()))
}

fn find<'a>(certs: &'a [Cert], fingerprint: &Fingerprint) -> Result<&'a Cert, EngineError> {
    certs
        .iter()
        .find(|c| c.fingerprint().to_hex() == fingerprint.as_str())
        .ok_or_else(|| EngineError::KeyRejected(format!("key {fingerprint} was not imported")))
}

fn failed(err: impl std::fmt::Display) -> EngineError {
    EngineError::Failed(err.to_string())
}

fn fingerprint_of(cert: &Cert) -> Option<Fingerprint> {
    Fingerprint::parse(&cert.fingerprint().to_hex())
}

impl EngineSession for SequoiaSession {
    fn set_armor(&mut self, armor: bool) {
        self.armor = armor;
    }

    fn import_public_key(&mut self, armored: &str) -> Result<Option<Fingerprint>, EngineError> {
        let cert = parse_cert(armored)?.strip_secret_key_material();
        let fingerprint = fingerprint_of(&cert);
        self.public_certs.push(cert);
        Ok(fingerprint)
    }

    fn add_encrypt_key(&mut self, fingerprint: &Fingerprint) -> Result<(), EngineError> {
        let cert = find(&self.public_certs, fingerprint)?.clone();

        let policy = StandardPolicy::new();
        let usable = cert
            .keys()
            .with_policy(&policy, None)
            .supported()
            .alive()
            .revoked(false)
            .for_transport_encryption()
            .for_storage_encryption()
            .next()
            .is_some();
        if !usable {
            return Err(EngineError::NoEncryptionKey);
        }

        self.targets.push(cert);
        Ok(())
    }

    fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, EngineError> {
        let policy = &StandardPolicy::new();
        let recipients: Vec<Recipient<'_>> = self
            .targets
            .iter()
            .flat_map(move |cert| {
                cert.keys()
                    .with_policy(policy, None)
                    .supported()
                    .alive()
                    .revoked(false)
                    .for_transport_encryption()
                    .for_storage_encryption()
            })
            .map(Into::into)
            .collect();
        if recipients.is_empty() {
            return Err(EngineError::NoEncryptionKey);
        }

        let mut sink = Vec::new();
        let mut message = Message::new(&mut sink);
        if self.armor {
            message = Armorer::new(message).build().map_err(failed)?;
        }
        let message = Encryptor::for_recipients(message, recipients)
            .build()
            .map_err(failed)?;
        let mut message = LiteralWriter::new(message).build().map_err(failed)?;
        message.write_all(plaintext)?;
        message.finalize().map_err(failed)?;

        Ok(sink)
    }

    fn import_secret_key(&mut self, armored: &str) -> Result<Option<Fingerprint>, EngineError> {
        let cert = parse_cert(armored)?;
        if !cert.is_tsk() {
            return Err(EngineError::KeyRejected(
                "key contains no secret key material".into(),
            ));
        }
        let fingerprint = fingerprint_of(&cert);
        self.secret_certs.push(cert);
        Ok(fingerprint)
    }

    fn add_decrypt_key(
        &mut self,
        fingerprint: &Fingerprint,
        passphrase: Option<&str>,
    ) -> Result<(), EngineError> {
        let cert = find(&self.secret_certs, fingerprint)?.clone();
        let password = passphrase.map(Password::from);

        // Expired or revoked subkeys still decrypt what was sent to them.
        let policy = StandardPolicy::new();
        let mut found = false;
        for ka in cert
            .keys()
            .secret()
            .with_policy(&policy, None)
            .supported()
            .for_transport_encryption()
            .for_storage_encryption()
        {
            found = true;
            let mut key = ka.key().clone();
            if key.secret().is_encrypted() {
                let password = password.as_ref().ok_or(EngineError::PassphraseMissing)?;
                key = key
                    .decrypt_secret(password)
                    .map_err(|_| EngineError::BadPassphrase)?;
            }
            let keypair = key
                .into_keypair()
                .map_err(|e| EngineError::KeyRejected(e.to_string()))?;
            self.unlocked.push((cert.clone(), keypair));
        }

        if !found {
            return Err(EngineError::KeyRejected(
                "key has no decryption-capable subkey".into(),
            ));
        }
        Ok(())
    }

    fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, EngineError> {
        if self.unlocked.is_empty() {
            return Err(EngineError::NoSecretKey);
        }

        let helper = Helper {
            keys: std::mem::take(&mut self.unlocked),
        };
        let policy = StandardPolicy::new();
        let mut decryptor = DecryptorBuilder::from_bytes(ciphertext)
            .map_err(|e| EngineError::Failed(format!("not an OpenPGP message: {e}")))?
            .with_policy(&policy, None, helper)
            .map_err(|e| EngineError::Failed(e.to_string()))?;

        let mut plaintext = Vec::new();
        decryptor
            .read_to_end(&mut plaintext)
            .map_err(|e| EngineError::Failed(e.to_string()))?;
        Ok(plaintext)
    }
}

/// Feeds unlocked key pairs to the streaming decryptor. Signatures are
/// not checked.
struct Helper {
    keys: Vec<(Cert, KeyPair)>,
}

impl VerificationHelper for Helper {
    fn get_certs(&mut self, _ids: &[KeyHandle]) -> openpgp::Result<Vec<Cert>> {
        Ok(Vec::new())
    }

    fn check(&mut self, _structure: MessageStructure) -> openpgp::Result<()> {
        Ok(())
    }
}

impl DecryptionHelper for Helper {
    fn decrypt(
        &mut self,
        pkesks: &[PKESK],
        _skesks: &[SKESK],
        sym_algo: Option<SymmetricAlgorithm>,
        decrypt: &mut dyn FnMut(Option<SymmetricAlgorithm>, &SessionKey) -> bool,
    ) -> openpgp::Result<Option<Cert>> {
        for pkesk in pkesks {
            for (cert, keypair) in self.keys.iter_mut() {
                if let Some((algo, sk)) = pkesk.decrypt(keypair, sym_algo)
                    && decrypt(algo, &sk)
                {
                    return Ok(Some(cert.clone()));
                }
            }
        }
        let reason = "no secret key able to decrypt this message".to_string();
        Err(openpgp::Error::MissingSessionKey(reason).into())
    }
}
