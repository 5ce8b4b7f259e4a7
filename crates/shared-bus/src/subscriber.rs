//! # Event Subscriber
//!
//! Receiving side of the bus. Lagging subscribers skip dropped events and
//! keep receiving instead of failing the stream.

use crate::events::Envelope;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Errors surfaced to subscribers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped; no further events will arrive.
    #[error("event bus closed")]
    Closed,
}

/// A subscription to the event bus.
pub struct EventStream {
    receiver: broadcast::Receiver<Envelope>,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<Envelope>) -> Self {
        Self { receiver }
    }

    /// Receive the next event, skipping over any the subscriber missed.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::Closed`] once the bus is gone.
    pub async fn recv(&mut self) -> Result<Envelope, SubscriptionError> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Ok(envelope),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "subscriber lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// Convert into a `tokio_stream` stream of envelopes.
    #[must_use]
    pub fn into_stream(self) -> BroadcastStream<Envelope> {
        BroadcastStream::new(self.receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RollupEvent;
    use crate::EventBus;

    #[tokio::test]
    async fn test_closed_bus_ends_stream() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe();
        drop(bus);
        assert!(matches!(
            stream.recv().await,
            Err(SubscriptionError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_lagged_subscriber_recovers() {
        let bus = EventBus::with_capacity(2);
        let mut stream = bus.subscribe();

        for _ in 0..8 {
            bus.publish(RollupEvent::TransactionSubmitted { tx_hash: [0u8; 32] });
        }

        // Oldest events were dropped, but the stream still yields.
        assert!(stream.recv().await.is_ok());
    }
}
