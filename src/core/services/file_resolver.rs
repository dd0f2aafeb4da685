use crate::core::errors::{Result, SealError};
use crate::core::models::file_target::FileTarget;
use crate::core::traits::storage::{FileSystem, Node};

/// Finds the file a request points at, within the caller's own storage.
pub struct FileResolver<'a> {
    files: &'a dyn FileSystem,
}

impl<'a> FileResolver<'a> {
    pub fn new(files: &'a dyn FileSystem) -> Self {
        Self { files }
    }

    /// Resolve `target` for `user_id`.
    ///
    /// An id is tried first and only accepted when the node lives under the
    /// user's `files/` root. A path is the fallback. Someone else's file is
    /// reported exactly like a missing one.
    pub fn resolve(&self, user_id: &str, target: &FileTarget) -> Result<Box<dyn Node>> {
        if target.is_empty() {
            return Err(SealError::invalid_request("fileId or filePath is required"));
        }

        let mut node = None;

        if let Some(id) = target.file_id {
            node = self
                .files
                .resolve_by_id(id)?
                .filter(|n| is_owned_by(n.as_ref(), user_id));
            if node.is_none() {
                tracing::debug!(user_id, file_id = id, "file id not found for user");
            }
        }

        if node.is_none() {
            if let Some(path) = &target.file_path {
                node = self
                    .files
                    .resolve_by_path(user_id, &normalize_user_path(path))?;
            }
        }

        let node = node.ok_or_else(|| SealError::FileNotFound {
            target: target.to_string(),
        })?;

        if node.is_dir() {
            return Err(SealError::InvalidTarget {
                target: target.to_string(),
            });
        }
        Ok(node)
    }
}

/// Storage root prefix for a user's files.
pub fn user_root(user_id: &str) -> String {
    format!("/{user_id}/files/")
}

fn is_owned_by(node: &dyn Node, user_id: &str) -> bool {
    node.path().starts_with(&user_root(user_id))
}

/// Clean a user-supplied path into a root-relative one: leading and
/// duplicate slashes and `.` are dropped, `..` stops at the root.
pub fn normalize_user_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// `path` relative to the user's files root, as returned to callers.
pub fn relative_to_user_root(user_id: &str, path: &str) -> String {
    path.strip_prefix(&user_root(user_id))
        .unwrap_or(path)
        .to_string()
}
