//! # Host Interface
//!
//! State access for the interpreter. The executor touches balances, storage
//! and code only through this trait, so the same interpreter runs against
//! the live state store, a scratch replay state, or the in-memory test host.

use primitive_types::U256;
use shared_types::{Address, Hash};
use std::collections::BTreeMap;

/// A log record emitted during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics (0 to 4).
    pub topics: Vec<Hash>,
    /// Raw payload.
    pub data: Vec<u8>,
}

/// State access capability used by the interpreter.
pub trait Host {
    /// Balance of an account (zero for missing accounts).
    fn balance(&self, address: &Address) -> U256;

    /// Read a 256-bit storage slot of a contract.
    fn sload(&self, address: &Address, key: &Hash) -> Hash;

    /// Write a 256-bit storage slot of a contract.
    fn sstore(&mut self, address: &Address, key: Hash, value: Hash);

    /// Code at an address (empty for non-contracts).
    fn code(&self, address: &Address) -> Vec<u8>;

    /// Deploy code at an address.
    fn set_code(&mut self, address: &Address, code: Vec<u8>);

    /// Move value between accounts. Returns false on insufficient balance.
    fn transfer(&mut self, from: &Address, to: &Address, value: U256) -> bool;

    /// Record an emitted log.
    fn log(&mut self, entry: LogEntry);

    /// Current nonce of an account (used for CREATE address derivation).
    fn nonce(&self, address: &Address) -> u64;

    /// Bump an account nonce after CREATE.
    fn increment_nonce(&mut self, address: &Address);

    /// SELFDESTRUCT: sweep the whole balance to a beneficiary.
    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address);
}

/// Self-contained host for tests and replay.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    balances: BTreeMap<Address, U256>,
    storage: BTreeMap<(Address, Hash), Hash>,
    code: BTreeMap<Address, Vec<u8>>,
    nonces: BTreeMap<Address, u64>,
    /// Logs collected across the execution.
    pub logs: Vec<LogEntry>,
    /// Accounts destroyed during the execution.
    pub destroyed: Vec<Address>,
}

impl InMemoryHost {
    /// Empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a balance.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.balances.insert(address, balance);
    }
}

impl Host for InMemoryHost {
    fn balance(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or_default()
    }

    fn sload(&self, address: &Address, key: &Hash) -> Hash {
        self.storage
            .get(&(*address, *key))
            .copied()
            .unwrap_or([0u8; 32])
    }

    fn sstore(&mut self, address: &Address, key: Hash, value: Hash) {
        self.storage.insert((*address, key), value);
    }

    fn code(&self, address: &Address) -> Vec<u8> {
        self.code.get(address).cloned().unwrap_or_default()
    }

    fn set_code(&mut self, address: &Address, code: Vec<u8>) {
        self.code.insert(*address, code);
    }

    fn transfer(&mut self, from: &Address, to: &Address, value: U256) -> bool {
        if value.is_zero() {
            return true;
        }
        let from_balance = self.balance(from);
        if from_balance < value {
            return false;
        }
        self.balances.insert(*from, from_balance - value);
        let to_balance = self.balance(to);
        self.balances.insert(*to, to_balance + value);
        true
    }

    fn log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.nonces.get(address).copied().unwrap_or(0)
    }

    fn increment_nonce(&mut self, address: &Address) {
        *self.nonces.entry(*address).or_insert(0) += 1;
    }

    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address) {
        let balance = self.balance(address);
        self.balances.insert(*address, U256::zero());
        let to_balance = self.balance(beneficiary);
        self.balances.insert(*beneficiary, to_balance + balance);
        self.code.remove(address);
        self.destroyed.push(*address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer() {
        let mut host = InMemoryHost::new();
        let a = Address::new([1; 20]);
        let b = Address::new([2; 20]);
        host.set_balance(a, U256::from(100));

        assert!(host.transfer(&a, &b, U256::from(40)));
        assert_eq!(host.balance(&a), U256::from(60));
        assert_eq!(host.balance(&b), U256::from(40));

        assert!(!host.transfer(&a, &b, U256::from(1000)));
    }

    #[test]
    fn test_storage_defaults_to_zero() {
        let host = InMemoryHost::new();
        assert_eq!(host.sload(&Address::ZERO, &[1u8; 32]), [0u8; 32]);
    }

    #[test]
    fn test_selfdestruct_sweeps() {
        let mut host = InMemoryHost::new();
        let contract = Address::new([1; 20]);
        let heir = Address::new([2; 20]);
        host.set_balance(contract, U256::from(77));
        host.set_code(&contract, vec![0x00]);

        host.selfdestruct(&contract, &heir);
        assert_eq!(host.balance(&contract), U256::zero());
        assert_eq!(host.balance(&heir), U256::from(77));
        assert!(host.code(&contract).is_empty());
    }
}
