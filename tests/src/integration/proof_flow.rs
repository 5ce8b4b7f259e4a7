//! Proof-path scenarios: QZKP happy/tampered paths, transition proofs,
//! fraud detection symmetry, exits, and persistence of the artifacts.

use crate::support::{seeded_state, transfer};
use qr_01_quantum::{Complex, QState};
use qr_02_zkp::{QzkpProver, QzkpVerifier, VerificationResult};
use qr_05_rollup::{
    EmergencyExit, FraudVerifier, RollupStateTransition, FRAUD_NORM_THRESHOLD,
};
use qr_08_storage::{MemoryStore, RollupStore};
use shared_types::Batch;
use std::sync::Arc;

fn uniform_state(num_qubits: usize) -> QState {
    let mut state = QState::new(num_qubits).unwrap();
    for q in 0..num_qubits {
        state.apply_hadamard(q).unwrap();
    }
    state
}

#[test]
fn qzkp_happy_path_dimension_16() {
    // |ψ⟩ = (1,1,...,1)/4 over dimension 16, 8 measurement draws, 4 phase
    // angles, seed 42: proof verifies as Valid with confidence >= 0.95.
    let state = uniform_state(4);
    let mut prover = QzkpProver::with_seed(42);
    let proof = prover.prove(&state).unwrap();
    assert_eq!(proof.measurement_outcomes.len(), 8);
    assert_eq!(proof.phase_angles.len(), 4);

    let report = QzkpVerifier::new().verify(&proof, &state);
    assert_eq!(report.result, VerificationResult::Valid);
    assert!(report.confidence >= 0.95);
}

#[test]
fn qzkp_tampered_state_never_valid() {
    let state = uniform_state(4);
    let mut prover = QzkpProver::with_seed(42);
    let proof = prover.prove(&state).unwrap();

    // The verifier is handed a state whose amplitude 0 was raised to 0.5.
    let mut tampered = state;
    tampered.set_amplitude(0, Complex::real(0.5)).unwrap();

    let report = QzkpVerifier::new().verify(&proof, &tampered);
    assert_ne!(report.result, VerificationResult::Valid);
}

#[test]
fn transition_proof_roundtrip_and_persistence() {
    let (state, accounts) = seeded_state(2, 5000);
    let scheme = state.scheme();
    let node_keys = scheme.keypair_from_seed([0xEE; 32]);
    let mut rollup = RollupStateTransition::new(Arc::clone(&scheme), node_keys, 7);

    let batch = Batch::seal(
        1,
        vec![
            transfer(&state, &accounts[0], &accounts[1], 100, 1),
            transfer(&state, &accounts[0], &accounts[1], 100, 2),
        ],
        1_700_000_000_000,
    )
    .unwrap();

    let proof = rollup.generate_transition_proof(&batch, &state).unwrap();
    rollup
        .verify_transition(&proof, &state, &batch.transactions)
        .unwrap();

    // Artifacts survive serialization through the store.
    let store = MemoryStore::new();
    let bytes = bincode::serialize(&proof).unwrap();
    store.put_proof(batch.batch_number, &bytes).unwrap();
    let restored: qr_05_rollup::StateTransitionProof =
        bincode::deserialize(&store.get_proof(batch.batch_number).unwrap().unwrap()).unwrap();
    assert_eq!(restored.post_state_root, proof.post_state_root);
    rollup
        .verify_transition(&restored, &state, &batch.transactions)
        .unwrap();
}

#[test]
fn fraud_symmetry_detects_exactly_the_divergence() {
    let (pre, accounts) = seeded_state(2, 2000);
    let scheme = pre.scheme();
    let tx = transfer(&pre, &accounts[0], &accounts[1], 300, 1);

    // Honest replay: no fraud.
    let honest = pre.clone_store();
    honest.apply_transactions(std::slice::from_ref(&tx)).unwrap();
    let mut fraud = FraudVerifier::new(Arc::clone(&scheme), 11);
    let proof = fraud
        .generate_fraud_proof(&pre, &honest, vec![tx.clone()])
        .unwrap();
    assert!(!fraud.verify_fraud_proof(&proof).unwrap().fraud_detected);

    // Divergent post-state: fraud detected.
    let dishonest = pre.clone_store();
    dishonest.apply_transactions(std::slice::from_ref(&tx)).unwrap();
    dishonest.set_balance(&accounts[1].address, 999_999).unwrap();
    let proof = fraud
        .generate_fraud_proof(&pre, &dishonest, vec![tx])
        .unwrap();
    let verdict = fraud.verify_fraud_proof(&proof).unwrap();
    assert!(verdict.fraud_detected);
    assert!(verdict.difference_norm > FRAUD_NORM_THRESHOLD);
}

#[test]
fn emergency_exit_against_committed_state() {
    let (state, accounts) = seeded_state(1, 8_800);
    let exit = EmergencyExit::new(state.scheme());

    let proof = exit
        .generate_proof(&accounts[0].address, &state, &accounts[0].keys.secret)
        .unwrap();
    exit.process_exit(&proof, &state).unwrap();

    let account = state.get_account(&accounts[0].address).unwrap();
    assert_eq!(account.balance, 0);
    assert_eq!(account.nonce, 1);

    // The consumed proof no longer matches the moved state.
    assert!(exit.verify_proof(&proof, &state).is_err());
}
