//! # Core Domain Entities
//!
//! Addresses, accounts and the digests that bind them.

use crate::wire::{put_bytes, put_u32, put_u64, WireReader};
use crate::WireError;
use serde::{Deserialize, Serialize};
use shared_crypto::blake3_hash;
use std::collections::BTreeMap;
use std::fmt;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account identifier.
///
/// Equality and ordering are lexicographic over the raw bytes; the display
/// form is lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Derive an address from public key bytes (first 20 bytes of BLAKE3).
    #[must_use]
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = blake3_hash(public_key);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

/// The state of a single rollup account.
///
/// `storage` is a sorted map so canonical serialization is deterministic.
/// The public key is carried for signature checks but is not part of the
/// canonical byte form (the state root covers only the ledger fields).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address.
    pub address: Address,
    /// Balance in base units.
    pub balance: u64,
    /// Number of transactions sent; monotonically non-decreasing.
    pub nonce: u64,
    /// Contract code; immutable once deployed.
    pub code: Vec<u8>,
    /// Raw key/value storage.
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Public key for signature verification.
    pub public_key: Vec<u8>,
}

impl Account {
    /// Create an externally-owned account with a starting balance.
    #[must_use]
    pub fn new(address: Address, balance: u64, public_key: Vec<u8>) -> Self {
        Self {
            address,
            balance,
            nonce: 0,
            code: Vec::new(),
            storage: BTreeMap::new(),
            public_key,
        }
    }

    /// Canonical byte form hashed into the state root:
    /// `u32 addr_len || addr || u64 balance || u64 nonce || u32 code_len ||
    /// code || u32 storage_count || (u32 key_len || key || u32 value_len ||
    /// value)*`, storage entries in key order.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.code.len());
        put_bytes(&mut out, self.address.as_bytes());
        put_u64(&mut out, self.balance);
        put_u64(&mut out, self.nonce);
        put_bytes(&mut out, &self.code);
        put_u32(&mut out, self.storage.len() as u32);
        for (key, value) in &self.storage {
            put_bytes(&mut out, key);
            put_bytes(&mut out, value);
        }
        out
    }

    /// Decode the canonical byte form.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] on truncated or malformed input.
    pub fn from_canonical_bytes(data: &[u8]) -> Result<Self, WireError> {
        let mut reader = WireReader::new(data);
        let addr = reader.bytes()?;
        let balance = reader.u64()?;
        let nonce = reader.u64()?;
        let code = reader.bytes()?;
        let count = reader.u32()?;
        let mut storage = BTreeMap::new();
        for _ in 0..count {
            let key = reader.bytes()?;
            let value = reader.bytes()?;
            storage.insert(key, value);
        }
        reader.finish()?;
        Ok(Self {
            address: Address::from_slice(&addr).unwrap_or(Address::ZERO),
            balance,
            nonce,
            code,
            storage,
            public_key: Vec::new(),
        })
    }

    /// True for accounts carrying contract code.
    #[must_use]
    pub fn is_contract(&self) -> bool {
        !self.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_ordering() {
        let a = Address::new([0u8; 20]);
        let mut high = [0u8; 20];
        high[0] = 1;
        let b = Address::new(high);
        assert!(a < b);
    }

    #[test]
    fn test_address_display() {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xAB;
        bytes[19] = 0x01;
        let addr = Address::new(bytes);
        let display = addr.to_string();
        assert!(display.starts_with("0xab"));
        assert!(display.ends_with("01"));
    }

    #[test]
    fn test_address_from_public_key_deterministic() {
        let a = Address::from_public_key(b"some key bytes");
        let b = Address::from_public_key(b"some key bytes");
        let c = Address::from_public_key(b"other key bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_account_canonical_roundtrip() {
        let mut account = Account::new(Address::new([7u8; 20]), 1000, vec![1, 2, 3]);
        account.nonce = 5;
        account.code = vec![0x60, 0x00];
        account.storage.insert(vec![1], vec![2, 3]);
        account.storage.insert(vec![0], vec![9]);

        let bytes = account.canonical_bytes();
        let decoded = Account::from_canonical_bytes(&bytes).unwrap();

        assert_eq!(decoded.address, account.address);
        assert_eq!(decoded.balance, account.balance);
        assert_eq!(decoded.nonce, account.nonce);
        assert_eq!(decoded.code, account.code);
        assert_eq!(decoded.storage, account.storage);
    }

    #[test]
    fn test_canonical_bytes_storage_order_independent() {
        let mut a = Account::new(Address::ZERO, 0, Vec::new());
        a.storage.insert(vec![2], vec![2]);
        a.storage.insert(vec![1], vec![1]);

        let mut b = Account::new(Address::ZERO, 0, Vec::new());
        b.storage.insert(vec![1], vec![1]);
        b.storage.insert(vec![2], vec![2]);

        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    }
}
