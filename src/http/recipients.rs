use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::session::CurrentUser;
use super::{AppState, blocking, json_body};
use crate::core::errors::{Result, SealError};
use crate::core::models::recipient::Recipient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientView {
    pub id: i64,
    pub uid: String,
    pub name: String,
    pub public_key: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Recipient> for RecipientView {
    fn from(r: Recipient) -> Self {
        Self {
            id: r.id,
            uid: r.uid,
            name: r.name,
            public_key: r.public_key,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipientList {
    pub items: Vec<RecipientView>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateRecipientRequest {
    pub name: String,
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedRecipient {
    pub id: i64,
}

/// `GET /recipients`
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<RecipientList>> {
    let service = state.recipients.clone();
    let recipients = blocking(move || service.list(&session)).await?;
    Ok(Json(RecipientList {
        items: recipients.into_iter().map(RecipientView::from).collect(),
    }))
}

/// `POST /recipients`
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    body: std::result::Result<Json<CreateRecipientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedRecipient>)> {
    let req = json_body(body)?;
    let service = state.recipients.clone();
    let id = blocking(move || service.create(&session, &req.name, &req.public_key)).await?;
    Ok((StatusCode::CREATED, Json(CreatedRecipient { id })))
}

/// `DELETE /recipients/:id`
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id.map_err(|e| SealError::invalid_request(e.body_text()))?;
    let service = state.recipients.clone();
    blocking(move || service.delete(&session, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
