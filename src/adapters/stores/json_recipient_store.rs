use std::path::{Path, PathBuf};

use chrono::Utc;

use super::json_table::JsonTable;
use crate::core::errors::Result;
use crate::core::models::recipient::Recipient;
use crate::core::traits::stores::RecipientStore;

/// Recipients of every user, kept in one `recipients.json` table.
pub struct JsonRecipientStore {
    table: JsonTable<Recipient>,
}

impl JsonRecipientStore {
    pub const FILE_NAME: &'static str = "recipients.json";

    /// Store the table in `state_dir/recipients.json`.
    pub fn new(state_dir: &Path) -> Self {
        Self::at(state_dir.join(Self::FILE_NAME))
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            table: JsonTable::new(path),
        }
    }
}

impl RecipientStore for JsonRecipientStore {
    fn find_for_user(&self, id: i64, uid: &str) -> Result<Option<Recipient>> {
        Ok(self
            .table
            .rows()?
            .into_iter()
            .find(|r| r.id == id && r.uid == uid))
    }

    fn list_for_user(&self, uid: &str) -> Result<Vec<Recipient>> {
        let mut rows: Vec<Recipient> = self
            .table
            .rows()?
            .into_iter()
            .filter(|r| r.uid == uid)
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    fn insert(&self, uid: &str, name: &str, public_key: &str) -> Result<Recipient> {
        let now = Utc::now().timestamp();
        self.table.update(|table| {
            let recipient = Recipient {
                id: table.allocate_id(),
                uid: uid.to_string(),
                name: name.to_string(),
                public_key: public_key.to_string(),
                created_at: now,
                updated_at: now,
            };
            table.rows.push(recipient.clone());
            Ok(recipient)
        })
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.table.update(|table| {
            table.rows.retain(|r| r.id != id);
            Ok(())
        })
    }
}
