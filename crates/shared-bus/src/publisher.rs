//! # Event Publisher
//!
//! Broadcast-backed bus handle. Cloning is cheap; every clone publishes to
//! the same channel.

use crate::events::{Envelope, RollupEvent};
use crate::subscriber::EventStream;
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use uuid::Uuid;

/// In-process event bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Envelope>,
}

impl EventBus {
    /// Create a bus with the default per-subscriber capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with an explicit per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Returns the correlation id assigned to it.
    ///
    /// Publishing never blocks; if no subscriber is attached the event is
    /// dropped.
    pub fn publish(&self, event: RollupEvent) -> Uuid {
        let correlation_id = Uuid::new_v4();
        let envelope = Envelope {
            correlation_id,
            published_at_ms: now_ms(),
            event,
        };
        if self.sender.send(envelope).is_err() {
            tracing::trace!("event published with no subscribers");
        }
        correlation_id
    }

    /// Open a subscription starting at the current position.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.sender.subscribe())
    }

    /// Number of attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
