use std::sync::Arc;

use crate::core::errors::{Result, SealError};
use crate::core::models::audit_entry::AuditAction;
use crate::core::models::recipient::Recipient;
use crate::core::services::audit_trail;
use crate::core::traits::audit::AuditLogger;
use crate::core::traits::session::UserSession;
use crate::core::traits::stores::RecipientStore;

/// Manages the caller's recipients through a `RecipientStore` backend.
pub struct RecipientService<S: RecipientStore> {
    pub store: S,
    pub audit: Option<Arc<dyn AuditLogger>>,
}

impl<S: RecipientStore> RecipientService<S> {
    /// List the caller's recipients.
    pub fn list(&self, session: &dyn UserSession) -> Result<Vec<Recipient>> {
        let user = session.require_user()?;
        self.store.list_for_user(user)
    }

    /// Add a recipient. Name and key are trimmed and must not be empty.
    pub fn create(&self, session: &dyn UserSession, name: &str, public_key: &str) -> Result<i64> {
        let user = session.require_user()?;
        let name = name.trim();
        let public_key = public_key.trim();
        if name.is_empty() || public_key.is_empty() {
            return Err(SealError::invalid_request(
                "name and publicKey are required",
            ));
        }

        let recipient = self.store.insert(user, name, public_key)?;
        tracing::info!(user, id = recipient.id, "recipient added");
        audit_trail::record(
            self.audit.as_deref(),
            user,
            AuditAction::RecipientAdd,
            Vec::new(),
            Some(recipient.to_string()),
            None,
        );
        Ok(recipient.id)
    }

    /// Remove one of the caller's recipients.
    pub fn delete(&self, session: &dyn UserSession, id: i64) -> Result<()> {
        let user = session.require_user()?;
        let recipient = self
            .store
            .find_for_user(id, user)?
            .ok_or(SealError::RecipientNotFound { id })?;

        self.store.delete(recipient.id)?;
        tracing::info!(user, id, "recipient removed");
        audit_trail::record(
            self.audit.as_deref(),
            user,
            AuditAction::RecipientRemove,
            Vec::new(),
            Some(recipient.to_string()),
            None,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::session::StaticSession;
    use crate::test_support::{MemoryAuditLogger, MemoryRecipientStore};

    fn service() -> (RecipientService<MemoryRecipientStore>, Arc<MemoryAuditLogger>) {
        let audit = Arc::new(MemoryAuditLogger::default());
        let service = RecipientService {
            store: MemoryRecipientStore::default(),
            audit: Some(audit.clone() as Arc<dyn AuditLogger>),
        };
        (service, audit)
    }

    #[test]
    fn create_trims_and_lists_per_user() {
        let (service, audit) = service();
        let alice = StaticSession::new("alice");
        let bob = StaticSession::new("bob");

        let id = service.create(&alice, "  Bob  ", "\n-----KEY-----\n").unwrap();
        service.create(&bob, "Alice", "KEY").unwrap();

        let list = service.list(&alice).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, id);
        assert_eq!(list[0].name, "Bob");
        assert_eq!(list[0].public_key, "-----KEY-----");
        assert_eq!(audit.entries().len(), 2);
    }

    #[test]
    fn blank_fields_are_invalid() {
        let (service, _) = service();
        let alice = StaticSession::new("alice");

        assert!(matches!(
            service.create(&alice, " ", "KEY"),
            Err(SealError::InvalidRequest { .. })
        ));
        assert!(matches!(
            service.create(&alice, "Bob", ""),
            Err(SealError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn cannot_delete_someone_elses_recipient() {
        let (service, audit) = service();
        let id = service
            .create(&StaticSession::new("bob"), "Carol", "KEY")
            .unwrap();

        let result = service.delete(&StaticSession::new("alice"), id);
        assert!(matches!(result, Err(SealError::RecipientNotFound { .. })));
        assert_eq!(service.list(&StaticSession::new("bob")).unwrap().len(), 1);
        assert_eq!(audit.entries().len(), 1);
    }

    #[test]
    fn delete_removes_and_audits() {
        let (service, audit) = service();
        let alice = StaticSession::new("alice");
        let id = service.create(&alice, "Bob", "KEY").unwrap();

        service.delete(&alice, id).unwrap();

        assert!(service.list(&alice).unwrap().is_empty());
        assert_eq!(
            audit.entries().last().map(|e| e.action.clone()),
            Some(AuditAction::RecipientRemove)
        );
    }

    #[test]
    fn anonymous_caller_is_rejected() {
        let (service, _) = service();
        assert!(matches!(
            service.list(&StaticSession::anonymous()),
            Err(SealError::Unauthenticated)
        ));
    }
}
