//! Typed pub/sub for cross-component signals (guest/auth transitions, rate
//! limiting). Replaces ad-hoc global events with an enumerated channel.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

/// Payload the backend sends with a 429.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitNotice {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub next_slot_available_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    GuestSessionChanged { is_guest: bool },
    AuthLoggedIn,
    AuthLoggedOut,
    RateLimited(RateLimitNotice),
    AuthError { message: String },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: AppEvent) {
        debug!("event: {:?}", event);
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}
