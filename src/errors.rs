//! Typed error hierarchy for the taskboard client.
//!
//! Three top-level enums cover the three subsystems:
//! - `BackendError` — calls to the hosted backend (REST + RPC)
//! - `SessionError` — board session operations that fail before or after the backend
//! - `WebhookError` — parsing and forwarding storage events

use thiserror::Error;

/// Errors from the backend client.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    /// Refused by the backend implementation itself (used by test doubles).
    #[error("{0}")]
    Rejected(String),
}

impl BackendError {
    /// Human-readable message stored in engine and session error fields.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors from board session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No board loaded")]
    BoardNotLoaded,

    #[error("Board has no columns")]
    NoColumn,

    #[error("Column {id} not found")]
    ColumnNotFound { id: uuid::Uuid },

    #[error("Task {id} not found")]
    TaskNotFound { id: uuid::Uuid },

    #[error("{field} must not be blank")]
    BlankField { field: &'static str },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Errors from the storage webhook forwarder.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Malformed storage event: {0}")]
    MalformedPayload(String),

    #[error("Forward to {url} failed: {source}")]
    Forward {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Downstream returned {status}: {body}")]
    Downstream { status: u16, body: String },

    #[error("Forward timed out after {0}s")]
    Timeout(u64),

    #[error("No forward URL configured")]
    NoForwardUrl,
}
