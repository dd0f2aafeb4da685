use serde::{Deserialize, Serialize};

/// A named public key the owner can encrypt files for.
///
/// Stored per owner; `id` is unique across all owners and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: i64,
    pub uid: String,
    pub name: String,
    pub public_key: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}
