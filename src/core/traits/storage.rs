use crate::core::errors::Result;

/// A file or directory in user storage.
pub trait Node: Send + Sync {
    /// Base name, e.g. `note.txt`.
    fn name(&self) -> String;

    /// Absolute storage path, e.g. `/alice/files/docs/note.txt`.
    fn path(&self) -> String;

    fn is_dir(&self) -> bool;

    fn read_bytes(&self) -> Result<Vec<u8>>;

    fn parent_folder(&self) -> Result<Box<dyn Folder>>;
}

/// A directory new files can be placed in.
pub trait Folder: Send + Sync {
    fn exists(&self, name: &str) -> bool;

    /// Create (or, depending on the storage, replace) `name`.
    fn create(&self, name: &str, contents: &[u8]) -> Result<Box<dyn Node>>;

    /// Create `name` only if nothing has it yet. `Ok(None)` means another
    /// writer got there first.
    fn create_exclusive(&self, name: &str, contents: &[u8]) -> Result<Option<Box<dyn Node>>> {
        if self.exists(name) {
            return Ok(None);
        }
        self.create(name, contents).map(Some)
    }

    /// Whether `create_exclusive` is atomic for this storage.
    fn supports_exclusive_create(&self) -> bool {
        false
    }
}

/// Port for the storage holding users' files.
pub trait FileSystem: Send + Sync {
    /// Look a node up by id across all users. Ownership is checked by the
    /// caller.
    fn resolve_by_id(&self, file_id: u64) -> Result<Option<Box<dyn Node>>>;

    /// Look a path up relative to `user_id`'s root.
    fn resolve_by_path(&self, user_id: &str, path: &str) -> Result<Option<Box<dyn Node>>>;
}

impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
    fn resolve_by_id(&self, file_id: u64) -> Result<Option<Box<dyn Node>>> {
        (**self).resolve_by_id(file_id)
    }

    fn resolve_by_path(&self, user_id: &str, path: &str) -> Result<Option<Box<dyn Node>>> {
        (**self).resolve_by_path(user_id, path)
    }
}
