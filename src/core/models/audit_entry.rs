use serde::{Deserialize, Serialize};

/// Actions that get recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Encrypt,
    Decrypt,
    RecipientAdd,
    RecipientRemove,
    PrivateKeyStore,
    PrivateKeyRemove,
}

/// A single entry in the audit log (JSON lines format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user: String,
    pub action: AuditAction,
    pub files: Vec<String>,
    pub detail: Option<String>,
    /// SHA-256 of the written output, when the action produced a file.
    pub state_hash: Option<String>,
}
