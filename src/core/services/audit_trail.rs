use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::core::models::audit_entry::{AuditAction, AuditEntry};
use crate::core::traits::audit::AuditLogger;

/// Compute the SHA256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Record an audit event. Warns on failure instead of propagating
/// the error, since audit should not block the main operation.
pub fn record(
    audit: Option<&dyn AuditLogger>,
    user: &str,
    action: AuditAction,
    files: Vec<String>,
    detail: Option<String>,
    written: Option<&[u8]>,
) {
    let Some(logger) = audit else {
        return;
    };

    let entry = AuditEntry {
        timestamp: Utc::now(),
        user: user.to_string(),
        action,
        files,
        detail,
        state_hash: written.map(sha256_hex),
    };

    if let Err(e) = logger.log_event(&entry) {
        tracing::warn!(error = %e, "could not write audit log");
    }
}
