use serde::Serialize;

/// Which stored file an operation applies to.
///
/// An id of `0` and an empty path both count as "not given", matching
/// what form-encoded clients send for unset fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTarget {
    pub file_id: Option<u64>,
    pub file_path: Option<String>,
}

impl FileTarget {
    pub fn new(file_id: Option<u64>, file_path: Option<&str>) -> Self {
        Self {
            file_id: file_id.filter(|id| *id > 0),
            file_path: file_path
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        }
    }

    #[cfg(test)]
    pub fn by_path(path: &str) -> Self {
        Self::new(None, Some(path))
    }

    #[cfg(test)]
    pub fn by_id(file_id: u64) -> Self {
        Self::new(Some(file_id), None)
    }

    pub fn is_empty(&self) -> bool {
        self.file_id.is_none() && self.file_path.is_none()
    }
}

impl std::fmt::Display for FileTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.file_id, &self.file_path) {
            (_, Some(path)) => f.write_str(path),
            (Some(id), None) => write!(f, "file #{id}"),
            (None, None) => f.write_str("(no file)"),
        }
    }
}

/// Where an encrypted or decrypted sibling file was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLocation {
    /// Path relative to the user's storage root.
    pub path: String,
    pub name: String,
}
