//! # Bus Events
//!
//! Typed lifecycle events published by the rollup subsystems.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};
use uuid::Uuid;

/// Events exchanged between subsystems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RollupEvent {
    /// A transaction entered the processing pipeline.
    TransactionSubmitted {
        /// Transaction hash.
        tx_hash: Hash,
    },
    /// A batch was sealed and is ready for proving.
    BatchSealed {
        /// Batch sequence number.
        batch_number: u64,
        /// Hash over the ordered transactions.
        batch_hash: Hash,
        /// Number of transactions in the batch.
        transaction_count: usize,
    },
    /// A state transition proof was generated.
    TransitionProven {
        /// Batch sequence number.
        batch_number: u64,
        /// Root before the batch.
        pre_state_root: Hash,
        /// Root after the batch.
        post_state_root: Hash,
    },
    /// Witness consensus was reached on a batch proof.
    ConsensusReached {
        /// Batch hash the witnesses signed.
        batch_hash: Hash,
        /// Combined quantum/witness confidence score.
        confidence: f64,
    },
    /// A fraud proof verified against a committed transition.
    FraudDetected {
        /// Claimed post-state root that failed replay.
        claimed_root: Hash,
    },
    /// An emergency exit was processed for an account.
    ExitProcessed {
        /// Exiting account.
        address: Address,
    },
    /// A state commitment was anchored on L1.
    CommitmentAnchored {
        /// Batch sequence number.
        batch_number: u64,
        /// Anchored state root.
        state_root: Hash,
    },
    /// Consensus entered degraded mode and refuses new batches.
    DegradedMode {
        /// Human-readable reason.
        reason: String,
    },
}

/// Envelope attaching identity and time to a published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation id for tracing a flow across subsystems.
    pub correlation_id: Uuid,
    /// Unix timestamp in milliseconds at publication.
    pub published_at_ms: u64,
    /// The event payload.
    pub event: RollupEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_roundtrip() {
        let event = RollupEvent::BatchSealed {
            batch_number: 9,
            batch_hash: [1u8; 32],
            transaction_count: 42,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: RollupEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            RollupEvent::BatchSealed {
                batch_number: 9,
                transaction_count: 42,
                ..
            }
        ));
    }
}
