//! Shared board types used by the taskboard client, CLI, and webhook server.

pub mod models;
pub mod presence;

pub use models::*;
pub use presence::{PresenceEvent, PresencePayload, PresenceRoster};
