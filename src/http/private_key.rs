use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::session::CurrentUser;
use super::{AppState, blocking, json_body};
use crate::core::errors::Result;
use crate::core::models::private_key::PrivateKeyMetadata;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataView {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase_hint: Option<String>,
}

impl From<PrivateKeyMetadata> for MetadataView {
    fn from(m: PrivateKeyMetadata) -> Self {
        Self {
            exists: m.exists,
            created_at: m.created_at,
            updated_at: m.updated_at,
            passphrase_hint: m.passphrase_hint,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueView {
    pub private_key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreRequest {
    pub private_key: String,
    pub passphrase_hint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Acknowledged {
    pub ok: bool,
}

/// `GET /private-key`
pub async fn metadata(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<MetadataView>> {
    let service = state.private_keys.clone();
    let meta = blocking(move || service.metadata(&session)).await?;
    Ok(Json(meta.into()))
}

/// `GET /private-key/value`
pub async fn value(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<ValueView>> {
    let service = state.private_keys.clone();
    let private_key = blocking(move || service.value(&session)).await?;
    Ok(Json(ValueView { private_key }))
}

/// `POST /private-key`
pub async fn store(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    body: std::result::Result<Json<StoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Acknowledged>)> {
    let req = json_body(body)?;
    let service = state.private_keys.clone();
    blocking(move || {
        service.store(&session, &req.private_key, req.passphrase_hint.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(Acknowledged { ok: true })))
}

/// `DELETE /private-key`
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<StatusCode> {
    let service = state.private_keys.clone();
    blocking(move || service.delete(&session)).await?;
    Ok(StatusCode::NO_CONTENT)
}
