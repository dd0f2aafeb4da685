use crate::core::errors::{Result, SealError};

/// Port for "who is calling". An empty id means nobody is signed in.
pub trait UserSession {
    fn current_user_id(&self) -> &str;

    /// The signed-in user, or `Unauthenticated`.
    fn require_user(&self) -> Result<&str> {
        let user = self.current_user_id().trim();
        if user.is_empty() {
            return Err(SealError::Unauthenticated);
        }
        Ok(user)
    }
}

/// A session fixed at construction: the CLI's `--user`, or the user
/// header of one HTTP request.
#[derive(Debug, Clone)]
pub struct StaticSession(String);

impl StaticSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(user_id.into().trim().to_string())
    }

    pub fn anonymous() -> Self {
        Self(String::new())
    }
}

impl UserSession for StaticSession {
    fn current_user_id(&self) -> &str {
        &self.0
    }
}
