use std::io::Write;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::core::errors::{Result, SealError};

/// On-disk shape of a table: rows plus the id sequence.
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct TableFile<T> {
    pub next_id: i64,
    pub rows: Vec<T>,
}

impl<T> Default for TableFile<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<T> TableFile<T> {
    /// Hand out the next id. Ids are never reused.
    pub fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// A JSON file holding one table, rewritten whole on every change.
///
/// Writes go to a temporary file in the same directory that is then
/// renamed over the original, so readers never see half a table. On Unix
/// the file is created with mode 0600.
pub struct JsonTable<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _rows: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonTable<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
            _rows: PhantomData,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_unlocked(&self) -> Result<TableFile<T>> {
        if !self.path.exists() {
            return Ok(TableFile::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            SealError::ReadFailed {
                path: self.path.clone(),
                source,
            }
        })?;
        if content.trim().is_empty() {
            return Ok(TableFile::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            SealError::storage(format!("{} is corrupt: {e}", self.path.display()))
        })
    }

    fn write_unlocked(&self, table: &TableFile<T>) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| SealError::storage("table path has no parent directory"))?;
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(table)
            .map_err(|e| SealError::storage(format!("cannot serialize table: {e}")))?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            SealError::storage(format!("cannot replace {}: {}", self.path.display(), e.error))
        })?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| SealError::storage("table lock poisoned"))
    }

    /// Snapshot of all rows.
    pub fn rows(&self) -> Result<Vec<T>> {
        let _guard = self.guard()?;
        Ok(self.read_unlocked()?.rows)
    }

    /// Read-modify-write under the table lock. Nothing is written when
    /// `change` fails.
    pub fn update<R>(&self, change: impl FnOnce(&mut TableFile<T>) -> Result<R>) -> Result<R> {
        let _guard = self.guard()?;
        let mut table = self.read_unlocked()?;
        let result = change(&mut table)?;
        self.write_unlocked(&table)?;
        Ok(result)
    }
}
