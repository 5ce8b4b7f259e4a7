//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! Subsystems never call each other directly; they publish typed events to
//! the bus and consume the streams they care about. Slow consumers drop the
//! oldest events rather than stalling publishers.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{Envelope, RollupEvent};
pub use publisher::EventBus;
pub use subscriber::{EventStream, SubscriptionError};

/// Maximum events buffered per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
