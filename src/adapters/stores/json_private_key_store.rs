use std::path::{Path, PathBuf};

use chrono::Utc;

use super::json_table::JsonTable;
use crate::core::errors::Result;
use crate::core::models::private_key::PrivateKeyRecord;
use crate::core::traits::stores::PrivateKeyStore;

/// Users' private keys in `private_keys.json`, one row per user.
pub struct JsonPrivateKeyStore {
    table: JsonTable<PrivateKeyRecord>,
}

impl JsonPrivateKeyStore {
    pub const FILE_NAME: &'static str = "private_keys.json";

    pub fn new(state_dir: &Path) -> Self {
        Self::at(state_dir.join(Self::FILE_NAME))
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            table: JsonTable::new(path),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        self.table.path()
    }
}

impl PrivateKeyStore for JsonPrivateKeyStore {
    fn find_by_user(&self, uid: &str) -> Result<Option<PrivateKeyRecord>> {
        Ok(self.table.rows()?.into_iter().find(|r| r.uid == uid))
    }

    fn upsert(
        &self,
        uid: &str,
        private_key: &str,
        passphrase_hint: Option<&str>,
    ) -> Result<PrivateKeyRecord> {
        let now = Utc::now().timestamp();
        let hint = passphrase_hint.map(str::to_string);

        self.table.update(|table| {
            if let Some(row) = table.rows.iter_mut().find(|r| r.uid == uid) {
                row.private_key = private_key.to_string();
                row.passphrase_hint = hint;
                row.updated_at = now.max(row.updated_at);
                return Ok(row.clone());
            }

            let record = PrivateKeyRecord {
                id: table.allocate_id(),
                uid: uid.to_string(),
                private_key: private_key.to_string(),
                passphrase_hint: hint,
                created_at: now,
                updated_at: now,
            };
            table.rows.push(record.clone());
            Ok(record)
        })
    }

    fn delete_by_user(&self, uid: &str) -> Result<()> {
        self.table.update(|table| {
            table.rows.retain(|r| r.uid != uid);
            Ok(())
        })
    }
}
