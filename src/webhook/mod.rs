//! Storage webhook forwarder.
//!
//! The storage provider posts an event for every object written to a
//! bucket. PDF creations are turned into a `ForwardPayload` and posted to an
//! automation endpoint; everything else is acknowledged and dropped.

pub mod forward;
pub mod server;

use serde::{Deserialize, Serialize};

use crate::errors::WebhookError;

pub use forward::Forwarder;
pub use server::{WebhookServerConfig, WebhookState, start_server, webhook_router};

/// Event types that mean "a new object exists".
pub const CREATION_EVENTS: &[&str] = &["INSERT", "OBJECT_CREATED"];

/// Whether the forward is awaited before the webhook responds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// Respond after the downstream call finishes (or times out).
    Await,
    /// Respond immediately and forward in the background.
    #[default]
    Detach,
}

impl ForwardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Await => "await",
            Self::Detach => "detach",
        }
    }
}

/// Incoming storage event. Only the fields we read are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub record: Option<StorageRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageRecord {
    pub name: Option<String>,
    pub bucket_id: Option<String>,
}

/// Body posted to the automation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardPayload {
    pub bucket: String,
    pub file_name: String,
    pub full_url: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

/// What to do with an incoming event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not a creation event.
    IgnoredEvent { event_type: String },
    /// A creation event for something other than a PDF.
    NotPdf { file_name: String },
    Forward(ForwardPayload),
}

pub fn is_creation_event(event_type: &str) -> bool {
    CREATION_EVENTS.contains(&event_type)
}

pub fn is_pdf(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".pdf")
}

pub fn public_object_url(storage_base: &str, bucket: &str, file_name: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        storage_base.trim_end_matches('/'),
        bucket,
        file_name
    )
}

/// Decide what an event means. Missing record fields on a creation event
/// are a client error.
pub fn classify(event: StorageEvent, storage_base: &str) -> Result<Disposition, WebhookError> {
    if !is_creation_event(&event.event_type) {
        return Ok(Disposition::IgnoredEvent {
            event_type: event.event_type,
        });
    }

    let record = event.record.unwrap_or_default();
    let (Some(file_name), Some(bucket)) = (
        record.name.filter(|n| !n.is_empty()),
        record.bucket_id.filter(|b| !b.is_empty()),
    ) else {
        return Err(WebhookError::MalformedPayload(
            "record.name and record.bucket_id are required".into(),
        ));
    };

    if !is_pdf(&file_name) {
        return Ok(Disposition::NotPdf { file_name });
    }

    Ok(Disposition::Forward(ForwardPayload {
        full_url: public_object_url(storage_base, &bucket, &file_name),
        bucket,
        file_name,
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }))
}
