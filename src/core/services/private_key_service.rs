use std::sync::Arc;

use crate::core::errors::{Result, SealError};
use crate::core::models::audit_entry::AuditAction;
use crate::core::models::private_key::{PrivateKeyMetadata, PrivateKeyRecord};
use crate::core::services::audit_trail;
use crate::core::traits::audit::AuditLogger;
use crate::core::traits::session::UserSession;
use crate::core::traits::stores::PrivateKeyStore;

/// Manages the caller's single stored private key.
pub struct PrivateKeyService<S: PrivateKeyStore> {
    pub store: S,
    pub audit: Option<Arc<dyn AuditLogger>>,
}

impl<S: PrivateKeyStore> PrivateKeyService<S> {
    /// What can be shown about the key without revealing it.
    pub fn metadata(&self, session: &dyn UserSession) -> Result<PrivateKeyMetadata> {
        let user = session.require_user()?;
        let record = self.store.find_by_user(user)?;
        Ok(PrivateKeyMetadata::from(record.as_ref()))
    }

    /// The armored key itself.
    pub fn value(&self, session: &dyn UserSession) -> Result<String> {
        let user = session.require_user()?;
        self.store
            .find_by_user(user)?
            .map(|r| r.private_key)
            .ok_or(SealError::PrivateKeyNotFound)
    }

    /// Store the key, replacing any existing one. A blank hint counts
    /// as none.
    pub fn store(
        &self,
        session: &dyn UserSession,
        private_key: &str,
        passphrase_hint: Option<&str>,
    ) -> Result<PrivateKeyRecord> {
        let user = session.require_user()?;
        let private_key = private_key.trim();
        if private_key.is_empty() {
            return Err(SealError::invalid_request("privateKey is required"));
        }
        let hint = passphrase_hint.map(str::trim).filter(|h| !h.is_empty());

        let record = self.store.upsert(user, private_key, hint)?;
        tracing::info!(user, "private key stored");
        audit_trail::record(
            self.audit.as_deref(),
            user,
            AuditAction::PrivateKeyStore,
            Vec::new(),
            None,
            None,
        );
        Ok(record)
    }

    /// Forget the key. Deleting a key that is not there is fine.
    pub fn delete(&self, session: &dyn UserSession) -> Result<()> {
        let user = session.require_user()?;
        self.store.delete_by_user(user)?;
        tracing::info!(user, "private key removed");
        audit_trail::record(
            self.audit.as_deref(),
            user,
            AuditAction::PrivateKeyRemove,
            Vec::new(),
            None,
            None,
        );
        Ok(())
    }
}
