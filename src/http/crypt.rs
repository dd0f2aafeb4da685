use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;

use super::session::CurrentUser;
use super::{AppState, blocking, json_body};
use crate::core::errors::Result;
use crate::core::models::file_target::{FileTarget, OutputLocation};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncryptRequest {
    pub recipient_id: i64,
    pub file_id: Option<u64>,
    pub file_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecryptRequest {
    pub file_id: Option<u64>,
    pub file_path: Option<String>,
    pub passphrase: Option<String>,
}

/// `POST /encrypt`
pub async fn encrypt(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    body: std::result::Result<Json<EncryptRequest>, JsonRejection>,
) -> Result<Json<OutputLocation>> {
    let req = json_body(body)?;
    let target = FileTarget::new(req.file_id, req.file_path.as_deref());

    let crypt = state.crypt.clone();
    let location =
        blocking(move || crypt.encrypt_for_recipient(&session, req.recipient_id, &target)).await?;
    Ok(Json(location))
}

/// `POST /decrypt`
pub async fn decrypt(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    body: std::result::Result<Json<DecryptRequest>, JsonRejection>,
) -> Result<Json<OutputLocation>> {
    let req = json_body(body)?;
    let target = FileTarget::new(req.file_id, req.file_path.as_deref());
    let passphrase = req.passphrase.filter(|p| !p.is_empty());

    let crypt = state.crypt.clone();
    let location = blocking(move || {
        crypt.decrypt_with_private_key(&session, &target, passphrase.as_deref())
    })
    .await?;
    Ok(Json(location))
}
