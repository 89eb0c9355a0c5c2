//! Broadcast hub feeding the dashboard's live listeners.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// A named event and its payload as delivered to listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushEvent {
    pub event: String,
    pub data: Value,
}

#[derive(Clone, Debug)]
pub struct PushChannel {
    tx: broadcast::Sender<PushEvent>,
}

impl PushChannel {
    /// `capacity` is how many events a slow listener may fall behind by
    /// before it starts skipping. Must be non-zero.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire-and-forget broadcast; returns how many listeners were reached.
    pub fn emit(&self, event: &str, data: Value) -> usize {
        match self.tx.send(PushEvent {
            event: event.to_string(),
            data,
        }) {
            Ok(listeners) => {
                tracing::debug!(event, listeners, "Broadcast push event");
                listeners
            }
            Err(_) => {
                tracing::debug!(event, "No listeners for push event");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }

    /// Listeners currently subscribed, logged as sockets come and go.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
