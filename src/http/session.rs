use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::AppState;
use crate::core::errors::SealError;
use crate::core::traits::session::StaticSession;

/// The caller, as named by the trusted proxy header.
///
/// Rejects with 401 when the header is missing, blank or not UTF-8.
pub struct CurrentUser(pub StaticSession);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = SealError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(state.user_header())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(SealError::Unauthenticated)?;
        Ok(Self(StaticSession::new(user)))
    }
}
