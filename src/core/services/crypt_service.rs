use std::sync::Arc;

use crate::core::errors::{Result, SealError};
use crate::core::models::audit_entry::AuditAction;
use crate::core::models::file_target::{FileTarget, OutputLocation};
use crate::core::services::audit_trail;
use crate::core::services::file_resolver::{FileResolver, relative_to_user_root};
use crate::core::services::key_codec::KeyMaterialCodec;
use crate::core::services::output_namer::FileOutputNamer;
use crate::core::traits::audit::AuditLogger;
use crate::core::traits::session::UserSession;
use crate::core::traits::storage::{FileSystem, Node};
use crate::core::traits::stores::{PrivateKeyStore, RecipientStore};

/// Extensions stripped from a file's name when it is decrypted.
const CIPHERTEXT_EXTENSIONS: [&str; 3] = [".pgp", ".gpg", ".asc"];

/// Orchestrates the encrypt/decrypt workflow: resolve the source file,
/// run it through the codec, and write the result next to it.
pub struct CryptService<R: RecipientStore, P: PrivateKeyStore, F: FileSystem> {
    pub recipients: R,
    pub private_keys: P,
    pub files: F,
    pub codec: KeyMaterialCodec,
    pub namer: FileOutputNamer,
    pub audit: Option<Arc<dyn AuditLogger>>,
}

impl<R: RecipientStore, P: PrivateKeyStore, F: FileSystem> CryptService<R, P, F> {
    /// Encrypt the target file for one of the caller's recipients and
    /// store it as `<name>.pgp` in the same folder.
    pub fn encrypt_for_recipient(
        &self,
        session: &dyn UserSession,
        recipient_id: i64,
        target: &FileTarget,
    ) -> Result<OutputLocation> {
        if recipient_id <= 0 {
            return Err(SealError::invalid_request(
                "recipientId must be a positive integer",
            ));
        }
        let user = session.require_user()?;

        let recipient = self
            .recipients
            .find_for_user(recipient_id, user)?
            .ok_or(SealError::RecipientNotFound { id: recipient_id })?;

        let source = FileResolver::new(&self.files).resolve(user, target)?;
        let plaintext = source.read_bytes()?;

        let ciphertext = self.codec.encrypt(&recipient.public_key, &plaintext)?;

        let folder = source.parent_folder()?;
        let output = self.namer.create_unique(
            folder.as_ref(),
            &format!("{}.pgp", source.name()),
            &ciphertext,
        )?;
        let location = location_of(user, output.as_ref());

        tracing::info!(
            user,
            recipient = recipient.id,
            output = %location.path,
            bytes = plaintext.len(),
            "file encrypted"
        );
        audit_trail::record(
            self.audit.as_deref(),
            user,
            AuditAction::Encrypt,
            vec![
                relative_to_user_root(user, &source.path()),
                location.path.clone(),
            ],
            Some(format!("for recipient {recipient}")),
            Some(&ciphertext),
        );

        Ok(location)
    }

    /// Decrypt the target file with the caller's stored private key and
    /// store the plaintext next to it.
    pub fn decrypt_with_private_key(
        &self,
        session: &dyn UserSession,
        target: &FileTarget,
        passphrase: Option<&str>,
    ) -> Result<OutputLocation> {
        let user = session.require_user()?;

        let key = self
            .private_keys
            .find_by_user(user)?
            .ok_or(SealError::PrivateKeyNotFound)?;

        let source = FileResolver::new(&self.files).resolve(user, target)?;
        let ciphertext = source.read_bytes()?;

        let plaintext = self
            .codec
            .decrypt(&key.private_key, passphrase, &ciphertext)
            .map_err(|e| match e {
                SealError::PassphraseRequired { .. } => SealError::PassphraseRequired {
                    hint: key.passphrase_hint.clone(),
                },
                other => other,
            })?;

        let folder = source.parent_folder()?;
        let output = self.namer.create_unique(
            folder.as_ref(),
            &decrypted_name(&source.name()),
            &plaintext,
        )?;
        let location = location_of(user, output.as_ref());

        tracing::info!(user, output = %location.path, bytes = plaintext.len(), "file decrypted");
        audit_trail::record(
            self.audit.as_deref(),
            user,
            AuditAction::Decrypt,
            vec![
                relative_to_user_root(user, &source.path()),
                location.path.clone(),
            ],
            None,
            Some(&plaintext),
        );

        Ok(location)
    }
}

fn location_of(user: &str, node: &dyn Node) -> OutputLocation {
    OutputLocation {
        path: relative_to_user_root(user, &node.path()),
        name: node.name(),
    }
}

/// `report.pdf.pgp` → `report.pdf`; anything else gets `.decrypted`.
pub fn decrypted_name(name: &str) -> String {
    for ext in CIPHERTEXT_EXTENSIONS {
        if name.len() > ext.len() {
            let split = name.len() - ext.len();
            if let (Some(stem), Some(tail)) = (name.get(..split), name.get(split..))
                && tail.eq_ignore_ascii_case(ext)
            {
                return stem.to_string();
            }
        }
    }
    format!("{name}.decrypted")
}
