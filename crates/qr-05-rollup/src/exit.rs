//! # Emergency Exits
//!
//! An account owner can exit against committed state: `(balance, nonce)`
//! is spread over 128 qubits (64 bits each), superposed and entangled, and
//! the amplitude dump of that encoding becomes the exit state root. The
//! CNOT ladder pairs balance bit `i` with nonce bit `i`, so the global
//! state factorizes into 63 two-qubit pairs plus two lone qubits; only the
//! factor states are materialized.

use crate::errors::RollupError;
use qr_01_quantum::QState;
use qr_03_state::StateStore;
use serde::{Deserialize, Serialize};
use shared_crypto::SignatureScheme;
use shared_types::Address;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of entangled bit pairs in the encoding.
const PAIR_COUNT: usize = 63;

/// A signed claim to exit an account at its current committed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitProof {
    /// Exiting account.
    pub account_address: Address,
    /// Claim time in milliseconds.
    pub timestamp: u64,
    /// Amplitude dump of the account-state encoding.
    pub state_root: Vec<u8>,
    /// Account-key signature over `address || timestamp || state_root`.
    pub signature: Vec<u8>,
}

impl ExitProof {
    /// Message bytes covered by the signature.
    #[must_use]
    pub fn signing_message(&self) -> Vec<u8> {
        let mut message =
            Vec::with_capacity(20 + 8 + self.state_root.len());
        message.extend_from_slice(self.account_address.as_bytes());
        message.extend_from_slice(&self.timestamp.to_le_bytes());
        message.extend_from_slice(&self.state_root);
        message
    }
}

/// Emergency-exit generator and verifier.
pub struct EmergencyExit {
    scheme: Arc<dyn SignatureScheme>,
}

impl EmergencyExit {
    /// Create with the scheme account keys sign under.
    #[must_use]
    pub fn new(scheme: Arc<dyn SignatureScheme>) -> Self {
        Self { scheme }
    }

    /// Generate an exit proof for an account, signed by its owner.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::UnknownAccount`] or a crypto error.
    pub fn generate_proof(
        &self,
        address: &Address,
        store: &StateStore,
        owner_secret: &[u8],
    ) -> Result<ExitProof, RollupError> {
        let account = store
            .get_account(address)
            .ok_or(RollupError::UnknownAccount(*address))?;

        let mut proof = ExitProof {
            account_address: *address,
            timestamp: now_ms(),
            state_root: encode_account_state(account.balance, account.nonce)?,
            signature: Vec::new(),
        };
        proof.signature = self.scheme.sign(owner_secret, &proof.signing_message())?;
        Ok(proof)
    }

    /// Verify an exit proof against current state.
    ///
    /// # Errors
    ///
    /// Returns the specific failure; `Ok(())` means the exit is payable.
    pub fn verify_proof(&self, proof: &ExitProof, store: &StateStore) -> Result<(), RollupError> {
        let now = now_ms();
        if proof.timestamp > now {
            return Err(RollupError::TimestampInFuture {
                timestamp: proof.timestamp,
                now,
            });
        }

        let account = store
            .get_account(&proof.account_address)
            .ok_or(RollupError::UnknownAccount(proof.account_address))?;

        let expected = encode_account_state(account.balance, account.nonce)?;
        if expected != proof.state_root {
            return Err(RollupError::ExitRootMismatch);
        }

        self.scheme
            .verify(&account.public_key, &proof.signing_message(), &proof.signature)?;
        Ok(())
    }

    /// Verify and execute an exit: balance to zero, nonce bumped, in one
    /// atomic state-store write.
    ///
    /// # Errors
    ///
    /// Returns the verification failure or the state-store error.
    pub fn process_exit(&self, proof: &ExitProof, store: &StateStore) -> Result<(), RollupError> {
        self.verify_proof(proof, store)?;
        store.apply_exit(&proof.account_address)?;
        Ok(())
    }
}

/// Encode `(balance, nonce)` as the 128-qubit circuit's amplitude dump.
///
/// Per bit `i` in `0..63`: a two-qubit state `|balance_i, nonce_i⟩` with X
/// injections, Hadamards on both qubits and CNOT(balance -> nonce). Bits
/// 63 of balance and nonce stay unpaired as single-qubit factors. The dump
/// is the little-endian `(re, im)` byte stream of all factors in order.
pub fn encode_account_state(balance: u64, nonce: u64) -> Result<Vec<u8>, RollupError> {
    let mut out = Vec::with_capacity((PAIR_COUNT * 4 + 2 * 2) * 16);

    for bit in 0..PAIR_COUNT {
        let mut pair = QState::new(2)?;
        if balance >> bit & 1 == 1 {
            pair.apply_x(0)?;
        }
        if nonce >> bit & 1 == 1 {
            pair.apply_x(1)?;
        }
        pair.apply_hadamard(0)?;
        pair.apply_hadamard(1)?;
        pair.apply_cnot(0, 1)?;
        pair.normalize()?;
        out.extend_from_slice(&pair.to_amplitude_bytes());
    }

    for bit_value in [balance >> 63 & 1, nonce >> 63 & 1] {
        let mut lone = QState::new(1)?;
        if bit_value == 1 {
            lone.apply_x(0)?;
        }
        lone.apply_hadamard(0)?;
        lone.normalize()?;
        out.extend_from_slice(&lone.to_amplitude_bytes());
    }

    Ok(out)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================
