//! # Transactions
//!
//! Canonical serialization is a length-prefixed concatenation in declared
//! field order; the transaction hash is BLAKE3 over that serialization with
//! the signature excluded.

use crate::entities::{Address, Hash};
use crate::wire::{put_bytes, put_u64, WireReader};
use crate::WireError;
use serde::{Deserialize, Serialize};
use shared_crypto::blake3_hash;

/// Flat per-transfer gas charge.
pub const GAS_TRANSFER: u64 = 21;

/// Gas charged per byte of transaction data.
pub const GAS_DATA_BYTE: u64 = 4;

/// A value transfer or contract call on the rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sending account.
    pub sender: Address,
    /// Receiving account (contract address for calls).
    pub recipient: Address,
    /// Transfer amount in base units.
    pub amount: u64,
    /// Sender nonce; must be exactly one past the account nonce.
    pub nonce: u64,
    /// Price per unit of gas.
    pub gas_price: u64,
    /// Gas ceiling for execution.
    pub gas_limit: u64,
    /// Call data.
    pub data: Vec<u8>,
    /// Scheme signature over the transaction hash.
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Create an unsigned transaction.
    #[must_use]
    pub fn new(
        sender: Address,
        recipient: Address,
        amount: u64,
        nonce: u64,
        gas_price: u64,
        gas_limit: u64,
        data: Vec<u8>,
    ) -> Self {
        Self {
            sender,
            recipient,
            amount,
            nonce,
            gas_price,
            gas_limit,
            data,
            signature: Vec::new(),
        }
    }

    /// Serialization with the signature excluded; input to the hash.
    #[must_use]
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(96 + self.data.len());
        put_bytes(&mut out, self.sender.as_bytes());
        put_bytes(&mut out, self.recipient.as_bytes());
        put_u64(&mut out, self.amount);
        put_u64(&mut out, self.nonce);
        put_u64(&mut out, self.gas_price);
        put_u64(&mut out, self.gas_limit);
        put_bytes(&mut out, &self.data);
        out
    }

    /// Full canonical serialization including the signature.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = self.signing_bytes();
        put_bytes(&mut out, &self.signature);
        out
    }

    /// Decode the canonical serialization.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] on truncated or malformed input.
    pub fn from_canonical_bytes(data: &[u8]) -> Result<Self, WireError> {
        let mut reader = WireReader::new(data);
        let sender = reader.bytes()?;
        let recipient = reader.bytes()?;
        let amount = reader.u64()?;
        let nonce = reader.u64()?;
        let gas_price = reader.u64()?;
        let gas_limit = reader.u64()?;
        let tx_data = reader.bytes()?;
        let signature = reader.bytes()?;
        reader.finish()?;
        Ok(Self {
            sender: Address::from_slice(&sender).unwrap_or(Address::ZERO),
            recipient: Address::from_slice(&recipient).unwrap_or(Address::ZERO),
            amount,
            nonce,
            gas_price,
            gas_limit,
            data: tx_data,
            signature,
        })
    }

    /// BLAKE3 digest of the signature-free serialization.
    #[must_use]
    pub fn hash(&self) -> Hash {
        blake3_hash(&self.signing_bytes())
    }

    /// Deterministic upfront gas estimate charged at application time.
    #[must_use]
    pub fn gas_used_estimate(&self) -> u64 {
        GAS_TRANSFER + GAS_DATA_BYTE * self.data.len() as u64
    }

    /// Total upfront cost: amount plus priced gas estimate.
    #[must_use]
    pub fn total_cost(&self) -> u64 {
        self.amount
            .saturating_add(self.gas_price.saturating_mul(self.gas_used_estimate()))
    }
}
