use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::errors::{Result, SealError};
use crate::core::traits::storage::{FileSystem, Folder, Node};

static USER_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_@-][A-Za-z0-9_.@-]*$").expect("user id pattern is valid")
});

/// User storage on local disk, laid out as `<root>/<uid>/files/...`.
///
/// Storage paths handed to the core look like `/<uid>/files/docs/a.txt`.
/// On Unix a file's id is its inode number.
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory holding `user_id`'s files. Rejects ids that could
    /// leave the root or collide with the hidden state directory.
    pub fn user_files_dir(&self, user_id: &str) -> Result<PathBuf> {
        if !is_valid_user_id(user_id) {
            return Err(SealError::invalid_request(format!(
                "unsupported user id '{user_id}'"
            )));
        }
        Ok(self.root.join(user_id).join("files"))
    }

    /// Users that have a `files/` directory.
    pub fn users(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut users = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_valid_user_id(&name) && entry.path().join("files").is_dir() {
                users.push(name);
            }
        }
        users.sort();
        Ok(users)
    }

    fn storage_path(&self, disk: &Path) -> Option<String> {
        let relative = disk.strip_prefix(&self.root).ok()?;
        let mut out = String::new();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return None;
            };
            out.push('/');
            out.push_str(part.to_str()?);
        }
        Some(out)
    }

    fn node(&self, disk: PathBuf) -> Option<Box<dyn Node>> {
        let storage = self.storage_path(&disk)?;
        Some(Box::new(LocalNode {
            root: self.root.clone(),
            disk,
            storage,
        }))
    }
}

fn is_valid_user_id(user_id: &str) -> bool {
    USER_ID.is_match(user_id) && !user_id.contains("..")
}

/// Present on disk and not a symlink.
fn is_real_entry(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(!meta.file_type().is_symlink()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Write `contents` through `sink`. A file left half-written is removed.
fn fill(path: &Path, contents: &[u8], sink: impl FnOnce(&[u8]) -> io::Result<()>) -> Result<()> {
    let Err(e) = sink(contents) else {
        return Ok(());
    };
    if let Err(cleanup) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %cleanup, "cannot remove partial file");
    }
    Err(SealError::storage(format!("cannot write {}: {e}", path.display())))
}

#[cfg(unix)]
fn inode_of(meta: &fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn inode_of(_meta: &fs::Metadata) -> Option<u64> {
    None
}

/// Depth-first search below `dir` for the entry whose inode is `id`.
fn find_inode(dir: &Path, id: u64) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.file_type().is_symlink() {
            continue;
        }
        if inode_of(&meta) == Some(id) {
            return Ok(Some(entry.path()));
        }
        if meta.is_dir()
            && let Some(found) = find_inode(&entry.path(), id)?
        {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

impl FileSystem for LocalFileSystem {
    fn resolve_by_id(&self, file_id: u64) -> Result<Option<Box<dyn Node>>> {
        for user in self.users()? {
            let files = self.user_files_dir(&user)?;
            if let Some(disk) = find_inode(&files, file_id)? {
                return Ok(self.node(disk));
            }
        }
        Ok(None)
    }

    fn resolve_by_path(&self, user_id: &str, path: &str) -> Result<Option<Box<dyn Node>>> {
        let mut disk = self.user_files_dir(user_id)?;
        if !is_real_entry(&disk)? {
            return Ok(None);
        }
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Ok(None);
            }
            disk.push(segment);
            // Every component is checked, so a linked directory midway
            // cannot lead out of the user's root.
            if !is_real_entry(&disk)? {
                return Ok(None);
            }
        }
        Ok(self.node(disk))
    }
}

struct LocalNode {
    root: PathBuf,
    disk: PathBuf,
    storage: String,
}

impl Node for LocalNode {
    fn name(&self) -> String {
        self.disk
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn path(&self) -> String {
        self.storage.clone()
    }

    fn is_dir(&self) -> bool {
        self.disk.is_dir()
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.disk).map_err(|source| SealError::ReadFailed {
            path: self.disk.clone(),
            source,
        })
    }

    fn parent_folder(&self) -> Result<Box<dyn Folder>> {
        let dir = self
            .disk
            .parent()
            .ok_or_else(|| SealError::storage(format!("{} has no parent", self.storage)))?;
        Ok(Box::new(LocalFolder {
            root: self.root.clone(),
            dir: dir.to_path_buf(),
        }))
    }
}

struct LocalFolder {
    root: PathBuf,
    dir: PathBuf,
}

impl LocalFolder {
    fn child(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(SealError::storage(format!("invalid file name '{name}'")));
        }
        Ok(self.dir.join(name))
    }

    fn node(&self, disk: PathBuf) -> Result<Box<dyn Node>> {
        LocalFileSystem::new(self.root.clone())
            .node(disk)
            .ok_or_else(|| SealError::storage("created file is outside the storage root"))
    }

    fn write(
        &self,
        name: &str,
        contents: &[u8],
        options: &OpenOptions,
    ) -> Result<Option<Box<dyn Node>>> {
        let path = self.child(name)?;
        let mut file = match options.open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        fill(&path, contents, |bytes| {
            file.write_all(bytes)?;
            file.sync_all()
        })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "file written");
        self.node(path).map(Some)
    }
}

impl Folder for LocalFolder {
    fn exists(&self, name: &str) -> bool {
        self.child(name)
            .map(|p| fs::symlink_metadata(p).is_ok())
            .unwrap_or(false)
    }

    fn create(&self, name: &str, contents: &[u8]) -> Result<Box<dyn Node>> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        self.write(name, contents, &options)?
            .ok_or_else(|| SealError::storage(format!("could not create '{name}'")))
    }

    fn create_exclusive(&self, name: &str, contents: &[u8]) -> Result<Option<Box<dyn Node>>> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        self.write(name, contents, &options)
    }

    fn supports_exclusive_create(&self) -> bool {
        true
    }
}
