//! Consensus and node-pipeline scenarios: the witness threshold boundary,
//! full batch production, L1 anchoring and the framed transport.

use crate::support::{seeded_state, transfer};
use node_runtime::{NodeConfig, RollupNode};
use qr_06_consensus::{BatchConfig, ConsensusError, PobpcEngine};
use qr_08_storage::MemoryStore;
use qr_09_bridge::{L1Bridge, MockBridge};
use qr_10_p2p::{NetEvent, NetMessage, P2pConfig, P2pTransport};
use shared_bus::RollupEvent;
use shared_crypto::{Ed25519Scheme, SignatureScheme};
use std::sync::Arc;

#[test]
fn consensus_threshold_with_mixed_votes() {
    // W=7, τ=0.67: ⌈7·0.67⌉ = 5 valid signatures reach consensus; one
    // fewer does not.
    let scheme: Arc<dyn SignatureScheme> = Arc::new(Ed25519Scheme::new());
    let config = BatchConfig {
        witness_count: 7,
        consensus_threshold: 0.67,
        ..BatchConfig::default()
    };
    let engine = PobpcEngine::with_seed(config, Arc::clone(&scheme), 42);

    for i in 0..10u8 {
        let keys = scheme.keypair_from_seed([i + 1; 32]);
        if i < 5 {
            engine
                .register_local_witness(
                    &format!("w{i:02}"),
                    keys.public.clone(),
                    keys.secret.to_vec(),
                )
                .unwrap();
        } else {
            engine.register_witness(&format!("w{i:02}"), keys.public).unwrap();
        }
    }

    for i in 0..10u8 {
        engine.submit_transaction(vec![i; 64]).unwrap();
    }
    let mut proof = engine.generate_batch_proof().unwrap();
    assert_eq!(proof.transaction_count, 10);
    assert_eq!(proof.witness_signatures.len(), 5);

    // Two invalid votes ride along.
    proof.witness_signatures.push(("w08".into(), vec![0u8; 64]));
    proof.witness_signatures.push(("w09".into(), vec![0u8; 64]));
    assert!(engine.has_reached_consensus(&proof));

    // Flipping one valid signature to garbage drops below the threshold.
    proof.witness_signatures[0].1 = vec![0u8; 64];
    assert!(matches!(
        engine.verify_batch_proof(&proof),
        Err(ConsensusError::ConsensusNotReached {
            valid: 4,
            required: 5
        })
    ));
}

#[tokio::test]
async fn node_pipeline_produces_and_anchors() {
    let bridge = Arc::new(MockBridge::new());
    let scheme: Arc<dyn SignatureScheme> = Arc::new(Ed25519Scheme::new());
    let node = RollupNode::assemble(
        NodeConfig::default(),
        Arc::clone(&scheme),
        Arc::new(MemoryStore::new()),
        Arc::clone(&bridge) as Arc<dyn L1Bridge>,
        None,
    )
    .unwrap();

    // Fund two accounts on the node's state.
    let (seed_state, accounts) = seeded_state(2, 9_000);
    for account in seed_state.accounts_snapshot().into_values() {
        node.state().add_account(account);
    }
    node.state().commit_state();

    let mut events = node.bus().subscribe();
    let tx = transfer(&seed_state, &accounts[0], &accounts[1], 250, 1);
    node.submit_transaction(tx).unwrap();

    let produced = node.produce_batch().await.unwrap();
    assert_eq!(produced.batch.len(), 1);

    // The bus narrates the pipeline: submission, sealing, proving,
    // consensus, anchoring.
    let mut seen_consensus = false;
    for _ in 0..5 {
        if let Ok(envelope) = events.recv().await {
            if matches!(envelope.event, RollupEvent::ConsensusReached { .. }) {
                seen_consensus = true;
            }
        }
    }
    assert!(seen_consensus);

    // The anchored commitment carries the post-state root and satisfied
    // the contract's proof-prefix rule.
    let commitments = bridge.accepted_commitments();
    assert_eq!(commitments.len(), 1);
    assert_eq!(commitments[0].state_root, produced.transition.post_state_root);
    assert_eq!(commitments[0].batch_hash, produced.batch.batch_hash);
}

#[tokio::test]
async fn transport_carries_transactions_between_nodes() {
    let (a, mut a_events) = P2pTransport::bind(P2pConfig::default()).await.unwrap();
    let (b, mut b_events) = P2pTransport::bind(P2pConfig::default()).await.unwrap();

    a.connect(b.local_addr()).await.unwrap();
    assert!(matches!(
        a_events.recv().await.unwrap(),
        NetEvent::PeerConnected(_)
    ));
    assert!(matches!(
        b_events.recv().await.unwrap(),
        NetEvent::PeerConnected(_)
    ));

    let (state, accounts) = seeded_state(2, 100);
    let tx = transfer(&state, &accounts[0], &accounts[1], 1, 1);
    a.broadcast(&NetMessage::Transaction(tx.canonical_bytes()));

    let event = b_events.recv().await.unwrap();
    let NetEvent::Message {
        message: NetMessage::Transaction(bytes),
        ..
    } = event
    else {
        panic!("expected a transaction message");
    };
    let decoded = shared_types::Transaction::from_canonical_bytes(&bytes).unwrap();
    assert_eq!(decoded.hash(), tx.hash());
}
