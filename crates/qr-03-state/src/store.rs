//! # State Store
//!
//! Accounts, roots and per-account history behind a single RW lock.
//! Readers take snapshots; writers hold the lock for the whole mutation so
//! concurrent reads see either the pre- or post-write state, never partial.

use crate::errors::StateError;
use shared_crypto::{Blake3Hasher, SignatureScheme};
use shared_types::{Account, Address, Hash, Transaction, TransactionError};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Bounded ring-buffer capacity for per-account transaction history.
pub const MAX_HISTORY_PER_ACCOUNT: usize = 1000;

type Accounts = BTreeMap<Address, Account>;
type History = HashMap<Address, VecDeque<Transaction>>;

#[derive(Clone)]
struct StateInner {
    accounts: Accounts,
    history: History,
    current_state_root: Hash,
    previous_state_root: Hash,
    // Snapshots backing the two roots; rollback swaps the prior one in.
    committed: Accounts,
    prior_committed: Accounts,
}

/// The account state store.
pub struct StateStore {
    scheme: Arc<dyn SignatureScheme>,
    inner: RwLock<StateInner>,
}

impl StateStore {
    /// Create an empty store bound to a signature scheme.
    #[must_use]
    pub fn new(scheme: Arc<dyn SignatureScheme>) -> Self {
        let accounts = Accounts::new();
        let root = compute_state_root(&accounts);
        Self {
            scheme,
            inner: RwLock::new(StateInner {
                accounts: accounts.clone(),
                history: History::new(),
                current_state_root: root,
                previous_state_root: root,
                committed: accounts.clone(),
                prior_committed: accounts,
            }),
        }
    }

    /// Build a store from an existing account snapshot (fraud-proof replay).
    #[must_use]
    pub fn from_accounts(scheme: Arc<dyn SignatureScheme>, accounts: Accounts) -> Self {
        let root = compute_state_root(&accounts);
        Self {
            scheme,
            inner: RwLock::new(StateInner {
                accounts: accounts.clone(),
                history: History::new(),
                current_state_root: root,
                previous_state_root: root,
                committed: accounts.clone(),
                prior_committed: accounts,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StateInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StateInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace an account.
    pub fn add_account(&self, account: Account) {
        let mut inner = self.write();
        inner.accounts.insert(account.address, account);
    }

    /// Read-only snapshot of one account.
    #[must_use]
    pub fn get_account(&self, address: &Address) -> Option<Account> {
        self.read().accounts.get(address).cloned()
    }

    /// Snapshot of the whole account map (fraud-proof replay input).
    #[must_use]
    pub fn accounts_snapshot(&self) -> Accounts {
        self.read().accounts.clone()
    }

    /// Recent transactions touching an account, oldest first.
    #[must_use]
    pub fn account_history(&self, address: &Address) -> Vec<Transaction> {
        self.read()
            .history
            .get(address)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Validate a transaction against current state without applying it.
    ///
    /// # Errors
    ///
    /// Returns the failing [`TransactionError`].
    pub fn verify_transaction(&self, tx: &Transaction) -> Result<(), TransactionError> {
        let inner = self.read();
        verify_against(&inner.accounts, tx, self.scheme.as_ref())
    }

    /// Atomically verify and apply a single transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`TransactionError`] kind; state is untouched on failure.
    pub fn apply_transaction(&self, tx: &Transaction) -> Result<(), StateError> {
        let mut inner = self.write();
        verify_against(&inner.accounts, tx, self.scheme.as_ref())?;
        let inner = &mut *inner;
        apply_unchecked(&mut inner.accounts, &mut inner.history, tx);
        Ok(())
    }

    /// Apply a sequence with all-or-nothing semantics: on the first failure
    /// the store is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns the first failing transaction's error.
    pub fn apply_transactions(&self, txs: &[Transaction]) -> Result<(), StateError> {
        let mut inner = self.write();

        // Work on a scratch snapshot so a mid-batch failure discards
        // everything. Verification runs against the scratch state so nonce
        // chains within the batch validate.
        let mut accounts = inner.accounts.clone();
        let mut history = inner.history.clone();
        for tx in txs {
            verify_against(&accounts, tx, self.scheme.as_ref())?;
            apply_unchecked(&mut accounts, &mut history, tx);
        }

        inner.accounts = accounts;
        inner.history = history;
        tracing::debug!(count = txs.len(), "applied transaction batch");
        Ok(())
    }

    /// Commit: shift the current root to previous and recompute the current
    /// root over the live accounts.
    pub fn commit_state(&self) {
        let mut inner = self.write();
        inner.previous_state_root = inner.current_state_root;
        let last_committed = std::mem::take(&mut inner.committed);
        inner.prior_committed = last_committed;
        inner.current_state_root = compute_state_root(&inner.accounts);
        inner.committed = inner.accounts.clone();
    }

    /// Roll back to the previously committed state, discarding the last
    /// commit and any uncommitted mutations.
    pub fn rollback_state(&self) {
        let mut inner = self.write();
        inner.current_state_root = inner.previous_state_root;
        inner.accounts = inner.prior_committed.clone();
        inner.committed = inner.prior_committed.clone();
    }

    /// Current committed state root.
    #[must_use]
    pub fn get_state_root(&self) -> Hash {
        self.read().current_state_root
    }

    /// Root before the last commit.
    #[must_use]
    pub fn get_previous_root(&self) -> Hash {
        self.read().previous_state_root
    }

    /// Read a raw storage value.
    #[must_use]
    pub fn get_storage(&self, address: &Address, key: &[u8]) -> Option<Vec<u8>> {
        self.read()
            .accounts
            .get(address)
            .and_then(|account| account.storage.get(key).cloned())
    }

    /// Write a raw storage value.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownAccount`] if the account is missing.
    pub fn set_storage(&self, address: &Address, key: Vec<u8>, value: Vec<u8>) -> Result<(), StateError> {
        let mut inner = self.write();
        let account = inner
            .accounts
            .get_mut(address)
            .ok_or(StateError::UnknownAccount(*address))?;
        account.storage.insert(key, value);
        Ok(())
    }

    /// Read contract code.
    #[must_use]
    pub fn get_code(&self, address: &Address) -> Option<Vec<u8>> {
        self.read()
            .accounts
            .get(address)
            .map(|account| account.code.clone())
    }

    /// Deploy contract code. Code is write-once.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::CodeAlreadySet`] on redeployment and
    /// [`StateError::UnknownAccount`] for a missing account.
    pub fn set_code(&self, address: &Address, code: Vec<u8>) -> Result<(), StateError> {
        let mut inner = self.write();
        let account = inner
            .accounts
            .get_mut(address)
            .ok_or(StateError::UnknownAccount(*address))?;
        if !account.code.is_empty() {
            return Err(StateError::CodeAlreadySet(*address));
        }
        account.code = code;
        Ok(())
    }

    /// Overwrite an account balance (emergency-exit path).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownAccount`] for a missing account.
    pub fn set_balance(&self, address: &Address, balance: u64) -> Result<(), StateError> {
        let mut inner = self.write();
        let account = inner
            .accounts
            .get_mut(address)
            .ok_or(StateError::UnknownAccount(*address))?;
        account.balance = balance;
        Ok(())
    }

    /// Raise an account nonce. Lowering it is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NonceRegression`] or
    /// [`StateError::UnknownAccount`].
    pub fn set_nonce(&self, address: &Address, nonce: u64) -> Result<(), StateError> {
        let mut inner = self.write();
        let account = inner
            .accounts
            .get_mut(address)
            .ok_or(StateError::UnknownAccount(*address))?;
        if nonce < account.nonce {
            return Err(StateError::NonceRegression {
                address: *address,
                current: account.nonce,
                requested: nonce,
            });
        }
        account.nonce = nonce;
        Ok(())
    }

    /// Emergency-exit mutation: zero the balance and bump the nonce in one
    /// atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownAccount`] for a missing account.
    pub fn apply_exit(&self, address: &Address) -> Result<(), StateError> {
        let mut inner = self.write();
        let account = inner
            .accounts
            .get_mut(address)
            .ok_or(StateError::UnknownAccount(*address))?;
        account.balance = 0;
        account.nonce += 1;
        tracing::info!(%address, "processed emergency exit");
        Ok(())
    }

    /// Produce an independent deep copy for simulation and replay.
    #[must_use]
    pub fn clone_store(&self) -> StateStore {
        let inner = self.read().clone();
        StateStore {
            scheme: Arc::clone(&self.scheme),
            inner: RwLock::new(inner),
        }
    }

    /// The signature scheme accounts are verified under.
    #[must_use]
    pub fn scheme(&self) -> Arc<dyn SignatureScheme> {
        Arc::clone(&self.scheme)
    }
}

/// Deterministic root: BLAKE3 over canonical account bytes in address order.
#[must_use]
pub fn compute_state_root(accounts: &Accounts) -> Hash {
    let mut hasher = Blake3Hasher::new();
    for account in accounts.values() {
        hasher.update(&account.canonical_bytes());
    }
    hasher.finalize()
}

fn verify_against(
    accounts: &Accounts,
    tx: &Transaction,
    scheme: &dyn SignatureScheme,
) -> Result<(), TransactionError> {
    let sender = accounts
        .get(&tx.sender)
        .ok_or(TransactionError::UnknownSender)?;

    if scheme
        .verify(&sender.public_key, &tx.hash(), &tx.signature)
        .is_err()
    {
        return Err(TransactionError::InvalidSignature);
    }

    if tx.nonce != sender.nonce + 1 {
        return Err(TransactionError::InvalidNonce {
            expected: sender.nonce + 1,
            got: tx.nonce,
        });
    }

    let required = tx.total_cost();
    if sender.balance < required {
        return Err(TransactionError::InsufficientBalance {
            required,
            available: sender.balance,
        });
    }

    Ok(())
}

/// Mutate accounts for a transaction that already validated.
fn apply_unchecked(accounts: &mut Accounts, history: &mut History, tx: &Transaction) {
    if let Some(sender) = accounts.get_mut(&tx.sender) {
        sender.balance -= tx.total_cost();
        sender.nonce += 1;
    }

    let recipient = accounts
        .entry(tx.recipient)
        .or_insert_with(|| Account::new(tx.recipient, 0, Vec::new()));
    recipient.balance += tx.amount;

    for address in [tx.sender, tx.recipient] {
        let ring = history.entry(address).or_default();
        if ring.len() == MAX_HISTORY_PER_ACCOUNT {
            ring.pop_front();
        }
        ring.push_back(tx.clone());
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::Ed25519Scheme;

    fn scheme() -> Arc<dyn SignatureScheme> {
        Arc::new(Ed25519Scheme::new())
    }

    fn funded_store() -> (StateStore, shared_crypto::Keypair, Address) {
        let scheme = scheme();
        let keypair = scheme.keypair_from_seed([1u8; 32]);
        let address = Address::from_public_key(&keypair.public);
        let store = StateStore::new(Arc::clone(&scheme));
        store.add_account(Account::new(address, 1000, keypair.public.clone()));
        (store, keypair, address)
    }

    fn signed_transfer(
        store: &StateStore,
        keypair: &shared_crypto::Keypair,
        sender: Address,
        recipient: Address,
        amount: u64,
        nonce: u64,
    ) -> Transaction {
        let mut tx = Transaction::new(sender, recipient, amount, nonce, 1, 21_000, Vec::new());
        tx.signature = store
            .scheme()
            .sign(&keypair.secret, &tx.hash())
            .expect("signing");
        tx
    }

    #[test]
    fn test_single_transfer() {
        let (store, keypair, sender) = funded_store();
        let recipient = Address::new([0xBB; 20]);
        store.add_account(Account::new(recipient, 0, Vec::new()));

        let tx = signed_transfer(&store, &keypair, sender, recipient, 100, 1);
        let root_before = store.get_state_root();

        store.apply_transaction(&tx).unwrap();

        let sender_account = store.get_account(&sender).unwrap();
        assert_eq!(sender_account.nonce, 1);
        assert_eq!(sender_account.balance, 1000 - 100 - tx.gas_used_estimate());
        assert_eq!(store.get_account(&recipient).unwrap().balance, 100);

        store.commit_state();
        assert_ne!(store.get_state_root(), root_before);
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let (store, _keypair, sender) = funded_store();
        let mut tx = Transaction::new(
            sender,
            Address::new([0xBB; 20]),
            100,
            1,
            1,
            21_000,
            Vec::new(),
        );
        tx.signature = vec![0u8; 64];

        assert_eq!(
            store.apply_transaction(&tx),
            Err(StateError::Transaction(TransactionError::InvalidSignature))
        );
    }

    #[test]
    fn test_bad_nonce_rejected() {
        let (store, keypair, sender) = funded_store();
        let tx = signed_transfer(&store, &keypair, sender, Address::new([0xBB; 20]), 10, 5);
        assert!(matches!(
            store.apply_transaction(&tx),
            Err(StateError::Transaction(TransactionError::InvalidNonce {
                expected: 1,
                got: 5
            }))
        ));
    }

    #[test]
    fn test_insufficient_balance_rejected() {
        let (store, keypair, sender) = funded_store();
        let tx = signed_transfer(&store, &keypair, sender, Address::new([0xBB; 20]), 10_000, 1);
        assert!(matches!(
            store.apply_transaction(&tx),
            Err(StateError::Transaction(
                TransactionError::InsufficientBalance { .. }
            ))
        ));
    }

    #[test]
    fn test_batch_all_or_nothing() {
        let (store, keypair, sender) = funded_store();
        let recipient = Address::new([0xBB; 20]);
        store.commit_state();
        let root_before = store.get_state_root();

        let good1 = signed_transfer(&store, &keypair, sender, recipient, 100, 1);
        let mut bad = signed_transfer(&store, &keypair, sender, recipient, 100, 2);
        bad.signature = vec![0u8; 64];
        let good2 = signed_transfer(&store, &keypair, sender, recipient, 100, 3);

        let result = store.apply_transactions(&[good1, bad, good2]);
        assert!(result.is_err());

        // Nothing changed: balances, nonces and the root are untouched.
        let sender_account = store.get_account(&sender).unwrap();
        assert_eq!(sender_account.balance, 1000);
        assert_eq!(sender_account.nonce, 0);
        assert!(store.get_account(&recipient).is_none());
        store.commit_state();
        assert_eq!(store.get_state_root(), root_before);
    }

    #[test]
    fn test_batch_nonce_chain_applies() {
        let (store, keypair, sender) = funded_store();
        let recipient = Address::new([0xBB; 20]);

        let tx1 = signed_transfer(&store, &keypair, sender, recipient, 10, 1);
        let tx2 = signed_transfer(&store, &keypair, sender, recipient, 10, 2);
        store.apply_transactions(&[tx1, tx2]).unwrap();

        assert_eq!(store.get_account(&sender).unwrap().nonce, 2);
        assert_eq!(store.get_account(&recipient).unwrap().balance, 20);
    }

    #[test]
    fn test_root_deterministic_across_histories() {
        // Two stores arriving at the same account mapping report the same
        // root regardless of operation order.
        let scheme = scheme();
        let a = StateStore::new(Arc::clone(&scheme));
        let b = StateStore::new(Arc::clone(&scheme));

        let acc1 = Account::new(Address::new([1; 20]), 10, Vec::new());
        let acc2 = Account::new(Address::new([2; 20]), 20, Vec::new());

        a.add_account(acc1.clone());
        a.add_account(acc2.clone());
        b.add_account(acc2);
        b.add_account(acc1);

        a.commit_state();
        b.commit_state();
        assert_eq!(a.get_state_root(), b.get_state_root());
    }

    #[test]
    fn test_commit_and_rollback() {
        let (store, keypair, sender) = funded_store();
        store.commit_state();
        let committed_root = store.get_state_root();

        let tx = signed_transfer(&store, &keypair, sender, Address::new([9; 20]), 50, 1);
        store.apply_transaction(&tx).unwrap();
        store.commit_state();
        assert_ne!(store.get_state_root(), committed_root);

        store.rollback_state();
        assert_eq!(store.get_state_root(), committed_root);
        assert_eq!(store.get_account(&sender).unwrap().balance, 1000);
    }

    #[test]
    fn test_clone_is_independent() {
        let (store, keypair, sender) = funded_store();
        let copy = store.clone_store();

        let tx = signed_transfer(&store, &keypair, sender, Address::new([9; 20]), 50, 1);
        copy.apply_transaction(&tx).unwrap();

        assert_eq!(store.get_account(&sender).unwrap().balance, 1000);
        assert_ne!(copy.get_account(&sender).unwrap().balance, 1000);
    }

    #[test]
    fn test_code_is_write_once() {
        let (store, _keypair, sender) = funded_store();
        store.set_code(&sender, vec![0x60]).unwrap();
        assert_eq!(
            store.set_code(&sender, vec![0x61]),
            Err(StateError::CodeAlreadySet(sender))
        );
        assert_eq!(store.get_code(&sender).unwrap(), vec![0x60]);
    }

    #[test]
    fn test_nonce_never_decreases() {
        let (store, _keypair, sender) = funded_store();
        store.set_nonce(&sender, 4).unwrap();
        assert!(matches!(
            store.set_nonce(&sender, 3),
            Err(StateError::NonceRegression { .. })
        ));
    }

    #[test]
    fn test_history_recorded_and_bounded() {
        let (store, keypair, sender) = funded_store();
        let recipient = Address::new([0xBB; 20]);

        for nonce in 1..=3 {
            let tx = signed_transfer(&store, &keypair, sender, recipient, 1, nonce);
            store.apply_transaction(&tx).unwrap();
        }

        assert_eq!(store.account_history(&sender).len(), 3);
        assert_eq!(store.account_history(&recipient).len(), 3);
    }

    #[test]
    fn test_storage_roundtrip() {
        let (store, _keypair, sender) = funded_store();
        store
            .set_storage(&sender, vec![1, 2], vec![3, 4])
            .unwrap();
        assert_eq!(store.get_storage(&sender, &[1, 2]).unwrap(), vec![3, 4]);
        assert!(store.get_storage(&sender, &[9]).is_none());
    }
}
