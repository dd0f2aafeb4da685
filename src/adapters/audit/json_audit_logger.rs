use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::config::app_config::AuditSection;
use crate::core::errors::{Result, SealError};
use crate::core::models::audit_entry::AuditEntry;
use crate::core::traits::audit::AuditLogger;

/// Audit logger that appends entries as JSON lines to a file.
///
/// Each line in the log file is a self-contained JSON object representing
/// one `AuditEntry`. Appends from one process are serialized so lines from
/// concurrent requests never interleave.
pub struct JsonAuditLogger {
    log_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonAuditLogger {
    /// Create a logger that writes to `{state_dir}/{log_file}`.
    pub fn new(state_dir: &Path, log_file: &str) -> Self {
        Self {
            log_path: state_dir.join(log_file),
            write_lock: Mutex::new(()),
        }
    }

    /// Build the logger the `[audit]` section asks for, or `None` when
    /// auditing is switched off.
    pub fn from_config(state_dir: &Path, audit: &AuditSection) -> Option<Self> {
        audit
            .enabled
            .then(|| Self::new(state_dir, &audit.log_file))
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl AuditLogger for JsonAuditLogger {
    fn log_event(&self, entry: &AuditEntry) -> Result<()> {
        let line = serde_json::to_string(entry).map_err(|e| SealError::AuditError {
            detail: format!("Failed to serialize audit entry: {e}"),
        })?;

        let _guard = self.write_lock.lock().map_err(|_| SealError::AuditError {
            detail: "audit log lock poisoned".into(),
        })?;

        if let Some(parent) = self.log_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| SealError::AuditError {
                detail: format!("Cannot open audit log at {}: {e}", self.log_path.display()),
            })?;

        writeln!(file, "{line}").map_err(|e| SealError::AuditError {
            detail: format!("Failed to write audit entry: {e}"),
        })?;

        Ok(())
    }

    fn query(&self, user: Option<&str>, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.log_path).map_err(|e| SealError::AuditError {
            detail: format!("Cannot read audit log: {e}"),
        })?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| SealError::AuditError {
                detail: format!("Error reading audit log line {}: {e}", line_num + 1),
            })?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let entry: AuditEntry =
                serde_json::from_str(trimmed).map_err(|e| SealError::AuditError {
                    detail: format!("Malformed audit entry at line {}: {e}", line_num + 1),
                })?;

            if let Some(user) = user
                && entry.user != user
            {
                continue;
            }

            if let Some(since_date) = since
                && entry.timestamp < since_date
            {
                continue;
            }

            entries.push(entry);
        }

        Ok(entries)
    }
}
