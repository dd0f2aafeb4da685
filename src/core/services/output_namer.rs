use crate::core::errors::{Result, SealError};
use crate::core::traits::storage::{Folder, Node};

/// Picks a free sibling name and writes the file under it.
///
/// `report.pdf` becomes `report (1).pdf`, then `report (2).pdf`; a name
/// without an extension gets the counter appended. The scan is sequential
/// and bounded by `max_attempts` candidates.
#[derive(Debug, Clone, Copy)]
pub struct FileOutputNamer {
    max_attempts: u32,
}

impl Default for FileOutputNamer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

impl FileOutputNamer {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// The `n`th candidate for `base_name`; `0` is the name itself.
    pub fn candidate(base_name: &str, n: u32) -> String {
        if n == 0 {
            return base_name.to_string();
        }
        match base_name.rfind('.') {
            // A leading dot marks a hidden file, not an extension.
            Some(dot) if dot > 0 => {
                let (stem, ext) = base_name.split_at(dot);
                format!("{stem} ({n}){ext}")
            }
            _ => format!("{base_name} ({n})"),
        }
    }

    /// Create `base_name` (or the first free variant) in `folder`.
    pub fn create_unique(
        &self,
        folder: &dyn Folder,
        base_name: &str,
        contents: &[u8],
    ) -> Result<Box<dyn Node>> {
        if base_name.is_empty() {
            return Err(SealError::storage("cannot create a file with an empty name"));
        }

        let exclusive = folder.supports_exclusive_create();

        for n in 0..self.max_attempts {
            let name = Self::candidate(base_name, n);
            if folder.exists(&name) {
                continue;
            }

            if !exclusive {
                return folder
                    .create(&name, contents)
                    .map_err(|e| creation_failed(&name, e));
            }

            match folder
                .create_exclusive(&name, contents)
                .map_err(|e| creation_failed(&name, e))?
            {
                Some(node) => return Ok(node),
                None => {
                    tracing::debug!(name, "name taken concurrently, trying the next one");
                }
            }
        }

        Err(SealError::storage(format!(
            "no free name for '{base_name}' after {} attempts",
            self.max_attempts
        )))
    }
}

fn creation_failed(name: &str, err: SealError) -> SealError {
    match err {
        SealError::StorageError { .. } => err,
        other => SealError::storage(format!("cannot create '{name}': {other}")),
    }
}
