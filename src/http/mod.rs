//! JSON API served by `sealdrop serve`.
//!
//! The caller is identified by a header set by a trusted reverse proxy
//! (`[server] user_header`). Handlers run the blocking services on
//! tokio's blocking pool.

mod crypt;
mod error;
mod private_key;
mod recipients;
mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};

pub use error::HttpError;

use crate::cli::context::{Context, Crypt, PrivateKeys, Recipients};
use crate::core::errors::{Result, SealError};
use crate::core::services::private_key_service::PrivateKeyService;
use crate::core::services::recipient_service::RecipientService;

const STATUS_PREFIX: &str = "/_status";

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    crypt: Arc<Crypt>,
    recipients: Arc<RecipientService<Recipients>>,
    private_keys: Arc<PrivateKeyService<PrivateKeys>>,
    user_header: HeaderName,
}

impl AppState {
    pub fn from_context(ctx: &Context) -> Result<Self> {
        let raw = ctx.config.server.user_header.trim().to_ascii_lowercase();
        let user_header =
            HeaderName::from_bytes(raw.as_bytes()).map_err(|_| SealError::InvalidConfig {
                detail: format!("server.user_header '{raw}' is not a valid header name"),
            })?;

        Ok(Self {
            crypt: Arc::new(ctx.crypt_service()),
            recipients: Arc::new(ctx.recipient_service()),
            private_keys: Arc::new(ctx.private_key_service()),
            user_header,
        })
    }

    pub fn engine_available(&self) -> bool {
        self.crypt.codec.is_available()
    }

    pub fn user_header(&self) -> &HeaderName {
        &self.user_header
    }
}

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(DefaultOnResponse::new().include_headers(false))
        .on_failure(DefaultOnFailure::new());

    Router::new()
        .route("/encrypt", post(crypt::encrypt))
        .route("/decrypt", post(crypt::decrypt))
        .route(
            "/private-key",
            get(private_key::metadata)
                .post(private_key::store)
                .delete(private_key::delete),
        )
        .route("/private-key/value", get(private_key::value))
        .route("/recipients", get(recipients::list).post(recipients::create))
        .route("/recipients/:id", delete(recipients::delete))
        .route(&format!("{STATUS_PREFIX}/health"), get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(trace_layer)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| HttpError::Bind { addr, source })?;
    tracing::info!(%addr, "API server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
        })
        .await
        .map_err(HttpError::from)?;
    Ok(())
}

/// Run blocking service code off the async workers.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SealError::storage(format!("worker task failed: {e}")))?
}

/// Turn a JSON extractor rejection into a 400 with a `{message}` body.
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(v)| v)
        .map_err(|e| SealError::invalid_request(e.body_text()))
}

#[derive(Debug, serde::Serialize)]
struct Health {
    ok: bool,
    engine: Option<String>,
}

/// `GET /_status/health`: 503 when no engine can run.
async fn health(State(state): State<AppState>) -> Response {
    let ok = state.engine_available();
    let engine = state.crypt.codec.engine_name().map(str::to_string);
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(Health { ok, engine })).into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(error::ErrorBody {
            message: "Not found".into(),
        }),
    )
        .into_response()
}
