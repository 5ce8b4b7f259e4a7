//! Account-state scenarios: single transfers, failing batches, and the
//! parallel processor's dependency guarantees.

use crate::support::{seeded_state, transfer};
use qr_07_batch::{partition, BatchProcessor, ProcessorConfig};
use std::sync::Arc;

#[test]
fn single_transfer_moves_value_and_root() {
    let (state, accounts) = seeded_state(2, 1000);
    let tx = transfer(&state, &accounts[0], &accounts[1], 100, 1);
    let gas = tx.gas_used_estimate();
    let root_before = state.get_state_root();

    state.apply_transaction(&tx).unwrap();

    let sender = state.get_account(&accounts[0].address).unwrap();
    assert_eq!(sender.balance, 1000 - 100 - gas);
    assert_eq!(sender.nonce, 1);
    assert_eq!(
        state.get_account(&accounts[1].address).unwrap().balance,
        1000 + 100
    );

    state.commit_state();
    assert_ne!(state.get_state_root(), root_before);
}

#[test]
fn batch_with_invalid_middle_transaction_changes_nothing() {
    let (state, accounts) = seeded_state(2, 1000);
    state.commit_state();
    let root_before = state.get_state_root();

    let good1 = transfer(&state, &accounts[0], &accounts[1], 50, 1);
    let mut bad = transfer(&state, &accounts[0], &accounts[1], 50, 2);
    bad.signature = vec![0u8; 64];
    let good2 = transfer(&state, &accounts[0], &accounts[1], 50, 3);

    assert!(state.apply_transactions(&[good1, bad, good2]).is_err());

    let sender = state.get_account(&accounts[0].address).unwrap();
    let recipient = state.get_account(&accounts[1].address).unwrap();
    assert_eq!(sender.balance, 1000);
    assert_eq!(sender.nonce, 0);
    assert_eq!(recipient.balance, 1000);
    state.commit_state();
    assert_eq!(state.get_state_root(), root_before);
}

#[test]
fn parallel_partition_respects_dependencies_end_to_end() {
    let (state, accounts) = seeded_state(5, 10_000);
    let processor = BatchProcessor::start(ProcessorConfig::default(), Arc::clone(&state));

    // [A->B, C->D, A->E]: the two A-transactions must not share a layer.
    let batch = vec![
        transfer(&state, &accounts[0], &accounts[1], 10, 1),
        transfer(&state, &accounts[2], &accounts[3], 10, 1),
        transfer(&state, &accounts[0], &accounts[4], 10, 2),
    ];

    let layers = partition(&batch);
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].len(), 2);
    assert_eq!(layers[1].len(), 1);

    let outcome = processor.submit_batch(&batch).unwrap();
    assert!(outcome.all_applied());

    // Final balances match a serial application of the same order.
    let sender_a = state.get_account(&accounts[0].address).unwrap();
    assert_eq!(sender_a.nonce, 2);
    assert_eq!(
        state.get_account(&accounts[4].address).unwrap().balance,
        10_010
    );
}

#[test]
fn state_roots_agree_across_operation_orders() {
    let (state_a, accounts) = seeded_state(3, 500);
    let (state_b, _) = seeded_state(3, 500);

    // Apply the same transfers in a different interleaving; the final
    // account mapping and therefore the root must agree.
    let tx1 = transfer(&state_a, &accounts[0], &accounts[1], 10, 1);
    let tx2 = transfer(&state_a, &accounts[2], &accounts[1], 20, 1);

    state_a.apply_transaction(&tx1).unwrap();
    state_a.apply_transaction(&tx2).unwrap();
    state_b.apply_transactions(&[tx2.clone(), tx1.clone()]).unwrap();

    state_a.commit_state();
    state_b.commit_state();
    assert_eq!(state_a.get_state_root(), state_b.get_state_root());
}
