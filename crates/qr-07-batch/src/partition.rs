//! # Dependency Partitioning
//!
//! Two transactions conflict iff they share any address in
//! `{sender, recipient}`. The partitioner layers a batch into sub-batches
//! where no two members conflict; sub-batches apply serially in order,
//! members in parallel.

use shared_types::{Address, Transaction};
use std::collections::HashMap;

/// True iff the two transactions touch a common account.
#[must_use]
pub fn conflicts(a: &Transaction, b: &Transaction) -> bool {
    a.sender == b.sender
        || a.sender == b.recipient
        || a.recipient == b.sender
        || a.recipient == b.recipient
}

/// Greedy layering: each transaction lands in the earliest sub-batch after
/// every earlier transaction it conflicts with. Input order is preserved
/// inside each layer, so applying layers serially is equivalent to some
/// valid serial order of the original batch.
#[must_use]
pub fn partition(transactions: &[Transaction]) -> Vec<Vec<Transaction>> {
    let mut layers: Vec<Vec<Transaction>> = Vec::new();
    // Earliest layer an address is still free in.
    let mut next_free: HashMap<Address, usize> = HashMap::new();

    for tx in transactions {
        let level = next_free
            .get(&tx.sender)
            .copied()
            .unwrap_or(0)
            .max(next_free.get(&tx.recipient).copied().unwrap_or(0));

        if level == layers.len() {
            layers.push(Vec::new());
        }
        layers[level].push(tx.clone());

        next_free.insert(tx.sender, level + 1);
        next_free.insert(tx.recipient, level + 1);
    }

    layers
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(sender: u8, recipient: u8, nonce: u64) -> Transaction {
        Transaction::new(
            Address::new([sender; 20]),
            Address::new([recipient; 20]),
            1,
            nonce,
            1,
            21_000,
            Vec::new(),
        )
    }

    #[test]
    fn test_conflict_rule() {
        assert!(conflicts(&tx(1, 2, 1), &tx(1, 3, 2))); // shared sender
        assert!(conflicts(&tx(1, 2, 1), &tx(3, 1, 1))); // sender vs recipient
        assert!(conflicts(&tx(1, 2, 1), &tx(3, 2, 1))); // shared recipient
        assert!(!conflicts(&tx(1, 2, 1), &tx(3, 4, 1)));
    }

    #[test]
    fn test_independent_transactions_share_a_layer() {
        let layers = partition(&[tx(1, 2, 1), tx(3, 4, 1), tx(5, 6, 1)]);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].len(), 3);
    }

    #[test]
    fn test_shared_sender_splits_layers() {
        // [A->B, C->D, A->E] layers into [{A->B, C->D}, {A->E}].
        let a_to_b = tx(1, 2, 1);
        let c_to_d = tx(3, 4, 1);
        let a_to_e = tx(1, 5, 2);
        let layers = partition(&[a_to_b.clone(), c_to_d.clone(), a_to_e.clone()]);

        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0], vec![a_to_b, c_to_d]);
        assert_eq!(layers[1], vec![a_to_e]);
    }

    #[test]
    fn test_no_layer_contains_conflicting_pair() {
        let batch = vec![
            tx(1, 2, 1),
            tx(2, 3, 1),
            tx(4, 5, 1),
            tx(1, 6, 2),
            tx(5, 1, 1),
            tx(7, 8, 1),
        ];
        for layer in partition(&batch) {
            for i in 0..layer.len() {
                for j in (i + 1)..layer.len() {
                    assert!(!conflicts(&layer[i], &layer[j]));
                }
            }
        }
    }

    #[test]
    fn test_chain_degenerates_to_serial() {
        // Every transaction touches account 1, so each gets its own layer.
        let batch = vec![tx(1, 2, 1), tx(1, 3, 2), tx(4, 1, 1)];
        let layers = partition(&batch);
        assert_eq!(layers.len(), 3);
    }

    #[test]
    fn test_empty_batch() {
        assert!(partition(&[]).is_empty());
    }
}
