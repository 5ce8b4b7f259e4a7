//! Contract execution against live state, and artifact persistence to the
//! file store.

use crate::support::seeded_state;
use qr_04_evm::{opcodes as op, VmError};
use qr_07_batch::{BatchProcessor, ContractCall, ProcessorConfig};
use qr_08_storage::{FileStore, RollupStore};
use std::sync::Arc;

#[test]
fn contract_stores_and_reads_through_state() {
    let (state, accounts) = seeded_state(2, 1000);
    let processor = BatchProcessor::start(ProcessorConfig::default(), Arc::clone(&state));
    let contract = accounts[1].address;

    // SSTORE slot 1 = 0x2A, SLOAD it back, return the word.
    state
        .set_code(
            &contract,
            vec![
                op::PUSH1, 0x2A, op::PUSH1, 1, op::SSTORE, op::PUSH1, 1, op::SLOAD, op::PUSH1,
                0, op::MSTORE, op::PUSH1, 32, op::PUSH1, 0, op::RETURN,
            ],
        )
        .unwrap();

    let result = processor
        .execute_contract(&ContractCall {
            contract_address: contract,
            caller: accounts[0].address,
            input: Vec::new(),
            gas_limit: 100_000,
        })
        .unwrap();
    assert!(result.success);
    assert_eq!(result.return_data[31], 0x2A);

    // The write landed in account storage, visible outside the VM.
    let mut key = [0u8; 32];
    key[31] = 1;
    let stored = state.get_storage(&contract, &key).unwrap();
    assert_eq!(stored[31], 0x2A);
}

#[test]
fn identical_calls_are_deterministic() {
    let (state, accounts) = seeded_state(2, 1000);
    let processor = BatchProcessor::start(ProcessorConfig::default(), Arc::clone(&state));
    let contract = accounts[1].address;
    state
        .set_code(
            &contract,
            vec![
                op::PUSH1, 7, op::PUSH1, 6, op::MUL, op::PUSH1, 0, op::MSTORE, op::PUSH1, 32,
                op::PUSH1, 0, op::RETURN,
            ],
        )
        .unwrap();

    let call = ContractCall {
        contract_address: contract,
        caller: accounts[0].address,
        input: Vec::new(),
        gas_limit: 100_000,
    };
    let first = processor.execute_contract(&call).unwrap();
    let second = processor.execute_contract(&call).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.return_data[31], 42);
}

#[test]
fn out_of_gas_surfaces_as_failed_execution() {
    let (state, accounts) = seeded_state(2, 1000);
    let processor = BatchProcessor::start(ProcessorConfig::default(), Arc::clone(&state));
    let contract = accounts[1].address;
    state
        .set_code(&contract, vec![op::PUSH1, 1, op::PUSH1, 2, op::ADD])
        .unwrap();

    let result = processor
        .execute_contract(&ContractCall {
            contract_address: contract,
            caller: accounts[0].address,
            input: Vec::new(),
            gas_limit: 4,
        })
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.error, Some(VmError::OutOfGas));
    assert_eq!(result.gas_used, 4);
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let (state, accounts) = seeded_state(2, 1000);
    let tx = crate::support::transfer(&state, &accounts[0], &accounts[1], 5, 1);

    {
        let store = FileStore::open(dir.path()).unwrap();
        store.put_tx(&tx.hash(), &tx.canonical_bytes()).unwrap();
        store.put_block(1, b"block one").unwrap();
        store.sync().unwrap();
    }

    let store = FileStore::open(dir.path()).unwrap();
    let restored =
        shared_types::Transaction::from_canonical_bytes(&store.get_tx(&tx.hash()).unwrap().unwrap())
            .unwrap();
    assert_eq!(restored, tx);
    assert_eq!(store.block_numbers().unwrap(), vec![1]);
}
