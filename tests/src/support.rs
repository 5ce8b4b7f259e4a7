//! Shared fixtures for the integration suite.

use qr_03_state::StateStore;
use shared_crypto::{Ed25519Scheme, Keypair, SignatureScheme};
use shared_types::{Account, Address, Transaction};
use std::sync::Arc;

/// A funded account with its signing keys.
pub struct TestAccount {
    /// The derived address.
    pub address: Address,
    /// Owner keys.
    pub keys: Keypair,
}

/// Build a state store seeded with `count` accounts of `balance` each.
pub fn seeded_state(count: usize, balance: u64) -> (Arc<StateStore>, Vec<TestAccount>) {
    let scheme: Arc<dyn SignatureScheme> = Arc::new(Ed25519Scheme::new());
    let state = Arc::new(StateStore::new(Arc::clone(&scheme)));

    let mut accounts = Vec::with_capacity(count);
    for i in 0..count {
        let keys = scheme.keypair_from_seed([i as u8 + 1; 32]);
        let address = Address::from_public_key(&keys.public);
        state.add_account(Account::new(address, balance, keys.public.clone()));
        accounts.push(TestAccount { address, keys });
    }
    state.commit_state();
    (state, accounts)
}

/// Build and sign a transfer between two seeded accounts.
pub fn transfer(
    state: &StateStore,
    from: &TestAccount,
    to: &TestAccount,
    amount: u64,
    nonce: u64,
) -> Transaction {
    let mut tx = Transaction::new(
        from.address,
        to.address,
        amount,
        nonce,
        1,
        21_000,
        Vec::new(),
    );
    tx.signature = state
        .scheme()
        .sign(&from.keys.secret, &tx.hash())
        .expect("signing test transaction");
    tx
}
