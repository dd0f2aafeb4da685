use serde::{Deserialize, Serialize};

/// A user's armored private key. At most one per `uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyRecord {
    pub id: i64,
    pub uid: String,
    pub private_key: String,
    /// Free-text reminder shown when the key asks for its passphrase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase_hint: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// What may be shown about a stored private key without revealing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateKeyMetadata {
    pub exists: bool,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub passphrase_hint: Option<String>,
}

impl From<Option<&PrivateKeyRecord>> for PrivateKeyMetadata {
    fn from(record: Option<&PrivateKeyRecord>) -> Self {
        match record {
            Some(r) => Self {
                exists: true,
                created_at: Some(r.created_at),
                updated_at: Some(r.updated_at),
                passphrase_hint: r.passphrase_hint.clone(),
            },
            None => Self::default(),
        }
    }
}
