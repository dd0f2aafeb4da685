//! Fixtures shared by unit tests: throwaway OpenPGP keys and in-memory
//! implementations of the storage and store ports.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sequoia_openpgp as openpgp;

use openpgp::cert::prelude::*;
use openpgp::serialize::SerializeInto;

use crate::core::errors::{Result, SealError};
use crate::core::models::audit_entry::AuditEntry;
use crate::core::models::private_key::PrivateKeyRecord;
use crate::core::models::recipient::Recipient;
use crate::core::traits::audit::AuditLogger;
use crate::core::traits::storage::{FileSystem, Folder, Node};
use crate::core::traits::stores::{PrivateKeyStore, RecipientStore};

pub struct TestKey {
    pub public: String,
    pub secret: String,
    pub fingerprint: String,
}

/// Generate a v4 key with an encryption subkey, protected when a
/// passphrase is given.
pub fn generate_key(user_id: &str, passphrase: Option<&str>) -> TestKey {
    let mut builder = CertBuilder::general_purpose(Some(user_id))
        .set_profile(openpgp::Profile::RFC4880)
        .expect("v4 profile");
    if let Some(passphrase) = passphrase {
        builder = builder.set_password(Some(passphrase.into()));
    }
    let (cert, _revocation) = builder.generate().expect("generate test key");

    let public = cert.armored().to_vec().expect("armor public key");
    let secret = cert.as_tsk().armored().to_vec().expect("armor secret key");

    TestKey {
        public: String::from_utf8(public).expect("armor is ascii"),
        secret: String::from_utf8(secret).expect("armor is ascii"),
        fingerprint: cert.fingerprint().to_hex(),
    }
}

// ─── storage ───────────────────────────────────────────────────────────────

struct Entry {
    id: u64,
    dir: bool,
    data: Vec<u8>,
}

#[derive(Default)]
struct MemoryState {
    entries: BTreeMap<String, Entry>,
    next_id: u64,
    lookups: usize,
    exclusive: bool,
    fail_writes: bool,
    /// Names another writer grabs just before our exclusive create.
    raced: Vec<String>,
}

impl MemoryState {
    fn insert(&mut self, path: &str, dir: bool, data: Vec<u8>) -> u64 {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.data = data;
            return entry.id;
        }
        self.next_id += 1;
        let id = self.next_id;
        self.entries.insert(path.to_string(), Entry { id, dir, data });
        id
    }

    fn ensure_parents(&mut self, path: &str) {
        let mut current = String::new();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            current.push('/');
            current.push_str(segment);
            if !self.entries.contains_key(&current) {
                self.insert(&current, true, Vec::new());
            }
        }
    }
}

/// Storage tree held in memory, keyed by absolute path
/// (`/<uid>/files/...`).
#[derive(Clone, Default)]
pub struct MemoryFs {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory fs lock")
    }

    pub fn add_dir(&self, path: &str) -> u64 {
        let mut state = self.state();
        state.ensure_parents(path);
        state.insert(path, true, Vec::new())
    }

    pub fn add_file(&self, path: &str, data: &[u8]) -> u64 {
        let mut state = self.state();
        state.ensure_parents(path);
        state.insert(path, false, data.to_vec())
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.state().entries.get(path).map(|e| e.data.clone())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state().entries.contains_key(path)
    }

    pub fn file_count(&self) -> usize {
        self.state().entries.values().filter(|e| !e.dir).count()
    }

    /// Number of `resolve_by_*` calls so far.
    pub fn lookups(&self) -> usize {
        self.state().lookups
    }

    pub fn set_exclusive(&self, exclusive: bool) {
        self.state().exclusive = exclusive;
    }

    pub fn fail_writes(&self) {
        self.state().fail_writes = true;
    }

    pub fn race_on(&self, name: &str) {
        self.state().raced.push(name.to_string());
    }

    pub fn folder(&self, path: &str) -> MemoryFolder {
        MemoryFolder {
            fs: self.clone(),
            path: path.trim_end_matches('/').to_string(),
        }
    }

    fn node(&self, path: &str) -> Box<dyn Node> {
        Box::new(MemoryNode {
            fs: self.clone(),
            path: path.to_string(),
        })
    }
}

impl FileSystem for MemoryFs {
    fn resolve_by_id(&self, file_id: u64) -> Result<Option<Box<dyn Node>>> {
        let path = {
            let mut state = self.state();
            state.lookups += 1;
            state
                .entries
                .iter()
                .find(|(_, e)| e.id == file_id)
                .map(|(p, _)| p.clone())
        };
        Ok(path.map(|p| self.node(&p)))
    }

    fn resolve_by_path(&self, user_id: &str, path: &str) -> Result<Option<Box<dyn Node>>> {
        let full = if path.is_empty() {
            format!("/{user_id}/files")
        } else {
            format!("/{user_id}/files/{path}")
        };
        let found = {
            let mut state = self.state();
            state.lookups += 1;
            state.entries.contains_key(&full)
        };
        Ok(found.then(|| self.node(&full)))
    }
}

pub struct MemoryNode {
    fs: MemoryFs,
    path: String,
}

impl Node for MemoryNode {
    fn name(&self) -> String {
        self.path.rsplit('/').next().unwrap_or_default().to_string()
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn is_dir(&self) -> bool {
        self.fs
            .state()
            .entries
            .get(&self.path)
            .is_some_and(|e| e.dir)
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        self.fs
            .read(&self.path)
            .ok_or_else(|| SealError::storage(format!("{} vanished", self.path)))
    }

    fn parent_folder(&self) -> Result<Box<dyn Folder>> {
        let parent = self.path.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
        Ok(Box::new(self.fs.folder(parent)))
    }
}

pub struct MemoryFolder {
    fs: MemoryFs,
    path: String,
}

impl MemoryFolder {
    fn child(&self, name: &str) -> String {
        format!("{}/{name}", self.path)
    }
}

impl Folder for MemoryFolder {
    fn exists(&self, name: &str) -> bool {
        self.fs.contains(&self.child(name))
    }

    fn create(&self, name: &str, contents: &[u8]) -> Result<Box<dyn Node>> {
        let path = self.child(name);
        {
            let mut state = self.fs.state();
            if state.fail_writes {
                return Err(SealError::Io(std::io::Error::other("disk full")));
            }
            state.insert(&path, false, contents.to_vec());
        }
        Ok(self.fs.node(&path))
    }

    fn create_exclusive(&self, name: &str, contents: &[u8]) -> Result<Option<Box<dyn Node>>> {
        let path = self.child(name);
        {
            let mut state = self.fs.state();
            if let Some(pos) = state.raced.iter().position(|r| r == name) {
                state.raced.remove(pos);
                state.insert(&path, false, b"someone else".to_vec());
            }
            if state.entries.contains_key(&path) {
                return Ok(None);
            }
        }
        self.create(name, contents).map(Some)
    }

    fn supports_exclusive_create(&self) -> bool {
        self.fs.state().exclusive
    }
}

// ─── stores ────────────────────────────────────────────────────────────────

/// Recipient store that counts every call.
#[derive(Default)]
pub struct MemoryRecipientStore {
    rows: Mutex<Vec<Recipient>>,
    calls: AtomicUsize,
}

impl MemoryRecipientStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecipientStore for MemoryRecipientStore {
    fn find_for_user(&self, id: i64, uid: &str) -> Result<Option<Recipient>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().expect("lock");
        Ok(rows.iter().find(|r| r.id == id && r.uid == uid).cloned())
    }

    fn list_for_user(&self, uid: &str) -> Result<Vec<Recipient>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().expect("lock");
        Ok(rows.iter().filter(|r| r.uid == uid).cloned().collect())
    }

    fn insert(&self, uid: &str, name: &str, public_key: &str) -> Result<Recipient> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().expect("lock");
        let recipient = Recipient {
            id: rows.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            uid: uid.to_string(),
            name: name.to_string(),
            public_key: public_key.to_string(),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        };
        rows.push(recipient.clone());
        Ok(recipient)
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().expect("lock").retain(|r| r.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPrivateKeyStore {
    rows: Mutex<Vec<PrivateKeyRecord>>,
}

impl PrivateKeyStore for MemoryPrivateKeyStore {
    fn find_by_user(&self, uid: &str) -> Result<Option<PrivateKeyRecord>> {
        let rows = self.rows.lock().expect("lock");
        Ok(rows.iter().find(|r| r.uid == uid).cloned())
    }

    fn upsert(
        &self,
        uid: &str,
        private_key: &str,
        passphrase_hint: Option<&str>,
    ) -> Result<PrivateKeyRecord> {
        let mut rows = self.rows.lock().expect("lock");
        let hint = passphrase_hint.map(str::to_string);
        if let Some(row) = rows.iter_mut().find(|r| r.uid == uid) {
            row.private_key = private_key.to_string();
            row.passphrase_hint = hint;
            row.updated_at += 1;
            return Ok(row.clone());
        }
        let record = PrivateKeyRecord {
            id: rows.len() as i64 + 1,
            uid: uid.to_string(),
            private_key: private_key.to_string(),
            passphrase_hint: hint,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        };
        rows.push(record.clone());
        Ok(record)
    }

    fn delete_by_user(&self, uid: &str) -> Result<()> {
        self.rows.lock().expect("lock").retain(|r| r.uid != uid);
        Ok(())
    }
}

/// Audit logger that keeps entries in memory, or fails every write.
#[derive(Default)]
pub struct MemoryAuditLogger {
    entries: Mutex<Vec<AuditEntry>>,
    broken: bool,
}

impl MemoryAuditLogger {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("lock").clone()
    }
}

impl AuditLogger for MemoryAuditLogger {
    fn log_event(&self, entry: &AuditEntry) -> Result<()> {
        if self.broken {
            return Err(SealError::AuditError {
                detail: "audit log is read-only".into(),
            });
        }
        self.entries.lock().expect("lock").push(entry.clone());
        Ok(())
    }

    fn query(
        &self,
        user: Option<&str>,
        _since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<AuditEntry>> {
        Ok(self
            .entries()
            .into_iter()
            .filter(|e| user.is_none_or(|u| e.user == u))
            .collect())
    }
}
