//! Presence roster for a board channel.
//!
//! A realtime provider pushes `sync`, `join`, and `leave` events for the
//! channel `board:<id>`. Each connection key may carry several payloads;
//! the roster exposes the first payload per key as the visible user.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use crate::models::{BoardId, BoardUser};

/// Name of the presence channel for a board.
pub fn channel_name(board_id: &BoardId) -> String {
    format!("board:{}", board_id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub full_name: String,
    #[serde(default)]
    pub avatar_img_name: Option<String>,
    #[serde(default)]
    pub avatar_img_cb: Option<String>,
}

impl PresencePayload {
    /// Rendered avatar URL under the storage service, if the user has one.
    pub fn avatar_url(&self, storage_base: &str) -> Option<String> {
        let name = self.avatar_img_name.as_deref()?;
        let base = storage_base.trim_end_matches('/');
        let mut url = format!(
            "{}/storage/v1/render/image/public/avatars/{}",
            base, name
        );
        if let Some(cb) = &self.avatar_img_cb {
            url.push_str("?cb=");
            url.push_str(cb);
        }
        Some(url)
    }
}

impl From<&BoardUser> for PresencePayload {
    fn from(user: &BoardUser) -> Self {
        Self {
            full_name: user.full_name.clone(),
            avatar_img_name: user.avatar_img_name.clone(),
            avatar_img_cb: user.avatar_img_cb.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PresenceEvent {
    Sync {
        state: HashMap<String, Vec<PresencePayload>>,
    },
    Join {
        key: String,
        new_presences: Vec<PresencePayload>,
    },
    Leave {
        key: String,
        left_presences: Vec<PresencePayload>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct PresenceRoster {
    entries: BTreeMap<String, Vec<PresencePayload>>,
}

impl PresenceRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::Sync { state } => {
                self.entries = state
                    .into_iter()
                    .filter(|(_, payloads)| !payloads.is_empty())
                    .collect();
            }
            PresenceEvent::Join { key, new_presences } => {
                if new_presences.is_empty() {
                    return;
                }
                self.entries.entry(key).or_default().extend(new_presences);
            }
            PresenceEvent::Leave {
                key,
                left_presences,
            } => {
                if let Some(payloads) = self.entries.get_mut(&key) {
                    payloads.retain(|p| !left_presences.contains(p));
                    if payloads.is_empty() || left_presences.is_empty() {
                        self.entries.remove(&key);
                    }
                }
            }
        }
    }

    /// One payload per connection key, ordered by key.
    pub fn users(&self) -> Vec<&PresencePayload> {
        self.entries.values().filter_map(|p| p.first()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Apply events from `rx` to the shared roster until the sender is dropped.
pub async fn follow(roster: Arc<RwLock<PresenceRoster>>, mut rx: broadcast::Receiver<PresenceEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => roster.write().await.apply(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "presence receiver lagged; waiting for next sync");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
