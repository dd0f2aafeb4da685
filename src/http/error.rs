use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::core::errors::{ErrorKind, SealError};

/// Failures of the server itself, outside any request.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}

impl From<HttpError> for SealError {
    fn from(e: HttpError) -> Self {
        SealError::storage(e.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::SystemFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for SealError {
    fn into_response(self) -> Response {
        let status = status_for(self.kind());
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        // Only the first line: the rest are CLI hints.
        let text = self.to_string();
        let message = text.lines().next().unwrap_or_default().trim_end().to_string();
        (status, Json(ErrorBody { message })).into_response()
    }
}
