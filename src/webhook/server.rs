use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{Disposition, ForwardMode, ForwardPayload, Forwarder, StorageEvent, classify};
use crate::errors::WebhookError;

/// Configuration for the webhook server.
#[derive(Debug, Clone)]
pub struct WebhookServerConfig {
    pub host: String,
    pub port: u16,
    pub forward_url: String,
    pub storage_public_url: String,
    pub mode: ForwardMode,
    pub timeout_secs: u64,
}

impl Default for WebhookServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            forward_url: String::new(),
            storage_public_url: String::new(),
            mode: ForwardMode::default(),
            timeout_secs: super::forward::DEFAULT_TIMEOUT_SECS,
        }
    }
}

pub struct WebhookState {
    pub forwarder: Forwarder,
    pub storage_public_url: String,
    pub mode: ForwardMode,
}

pub type SharedState = Arc<WebhookState>;

// ── Error type ───────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::MalformedPayload(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ── Router ───────────────────────────────────────────────────────────

pub fn webhook_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhooks/storage", post(storage_event))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

async fn storage_event(
    State(state): State<SharedState>,
    body: Result<Json<StorageEvent>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(event) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::debug!(event_type = %event.event_type, "storage event received");

    match classify(event, &state.storage_public_url)? {
        Disposition::IgnoredEvent { event_type } => {
            tracing::debug!(%event_type, "event ignored");
            Ok(Json(serde_json::json!({
                "message": "Event ignored",
                "type": event_type,
            }))
            .into_response())
        }
        Disposition::NotPdf { file_name } => {
            tracing::debug!(%file_name, "not a PDF, ignoring");
            Ok(Json(serde_json::json!({
                "message": "Ignored: not a PDF",
                "file_name": file_name,
            }))
            .into_response())
        }
        Disposition::Forward(payload) => match state.mode {
            ForwardMode::Await => forward_now(&state.forwarder, payload).await,
            ForwardMode::Detach => Ok(forward_detached(state.forwarder.clone(), payload)),
        },
    }
}

async fn forward_now(forwarder: &Forwarder, payload: ForwardPayload) -> Result<Response, ApiError> {
    match forwarder.forward(&payload).await {
        Ok(status) => {
            tracing::info!(file_name = %payload.file_name, bucket = %payload.bucket, status, "file forwarded");
            Ok(Json(serde_json::json!({
                "success": true,
                "message": "Notification forwarded",
                "full_url": payload.full_url,
            }))
            .into_response())
        }
        Err(e) => {
            tracing::warn!(file_name = %payload.file_name, error = %e, "forward failed");
            Err(e.into())
        }
    }
}

fn forward_detached(forwarder: Forwarder, payload: ForwardPayload) -> Response {
    let body = serde_json::json!({
        "success": true,
        "message": "Notification queued",
        "full_url": payload.full_url,
    });
    tokio::spawn(async move {
        match forwarder.forward(&payload).await {
            Ok(status) => {
                tracing::info!(file_name = %payload.file_name, bucket = %payload.bucket, status, "file forwarded");
            }
            Err(e) => {
                tracing::warn!(file_name = %payload.file_name, error = %e, "detached forward failed");
            }
        }
    });
    (StatusCode::ACCEPTED, Json(body)).into_response()
}

/// Start the webhook server and run until Ctrl+C.
pub async fn start_server(config: WebhookServerConfig) -> Result<()> {
    let forwarder = Forwarder::new(
        config.forward_url.clone(),
        std::time::Duration::from_secs(config.timeout_secs),
    )?;
    let state = Arc::new(WebhookState {
        forwarder,
        storage_public_url: config.storage_public_url.clone(),
        mode: config.mode,
    });

    let app = webhook_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        mode = config.mode.as_str(),
        forward_url = %config.forward_url,
        "webhook forwarder listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("webhook forwarder shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
