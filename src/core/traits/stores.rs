use crate::core::errors::Result;
use crate::core::models::private_key::PrivateKeyRecord;
use crate::core::models::recipient::Recipient;

/// Port for the recipients a user encrypts for.
pub trait RecipientStore: Send + Sync {
    /// Find a recipient only if `uid` owns it.
    fn find_for_user(&self, id: i64, uid: &str) -> Result<Option<Recipient>>;

    fn list_for_user(&self, uid: &str) -> Result<Vec<Recipient>>;

    /// Insert a new recipient and return it with its assigned id.
    fn insert(&self, uid: &str, name: &str, public_key: &str) -> Result<Recipient>;

    fn delete(&self, id: i64) -> Result<()>;
}

/// Port for users' private keys.
pub trait PrivateKeyStore: Send + Sync {
    fn find_by_user(&self, uid: &str) -> Result<Option<PrivateKeyRecord>>;

    /// Create the user's key or replace the existing one.
    fn upsert(
        &self,
        uid: &str,
        private_key: &str,
        passphrase_hint: Option<&str>,
    ) -> Result<PrivateKeyRecord>;

    fn delete_by_user(&self, uid: &str) -> Result<()>;
}

impl<T: RecipientStore + ?Sized> RecipientStore for std::sync::Arc<T> {
    fn find_for_user(&self, id: i64, uid: &str) -> Result<Option<Recipient>> {
        (**self).find_for_user(id, uid)
    }

    fn list_for_user(&self, uid: &str) -> Result<Vec<Recipient>> {
        (**self).list_for_user(uid)
    }

    fn insert(&self, uid: &str, name: &str, public_key: &str) -> Result<Recipient> {
        (**self).insert(uid, name, public_key)
    }

    fn delete(&self, id: i64) -> Result<()> {
        (**self).delete(id)
    }
}

impl<T: PrivateKeyStore + ?Sized> PrivateKeyStore for std::sync::Arc<T> {
    fn find_by_user(&self, uid: &str) -> Result<Option<PrivateKeyRecord>> {
        (**self).find_by_user(uid)
    }

    fn upsert(
        &self,
        uid: &str,
        private_key: &str,
        passphrase_hint: Option<&str>,
    ) -> Result<PrivateKeyRecord> {
        (**self).upsert(uid, private_key, passphrase_hint)
    }

    fn delete_by_user(&self, uid: &str) -> Result<()> {
        (**self).delete_by_user(uid)
    }
}
