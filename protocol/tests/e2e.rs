//! End-to-end integration tests for the Hoplock protocol.
//!
//! These exercise the full transaction lifecycle over the in-memory
//! topology driver: setup fan-out, four sequential lock establishments,
//! and the backward release wave, plus the admission and tag-checking
//! behavior visible through the public API.
//!
//! Each test stands alone with its own network and parameter set. No
//! shared state, no test ordering dependencies.

use hoplock_protocol::config::HOP_FEE;
use hoplock_protocol::crypto::GroupParams;
use hoplock_protocol::topology::Network;
use hoplock_protocol::wire::{Envelope, NodeAddr, SessionId, StateTag};
use hoplock_protocol::wire::messages::{LockOpen, Payload};
use hoplock_protocol::{Node, ProtocolError};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Spins up a network of `n` nodes named `node_0..node_{n-1}`.
fn network(n: usize) -> (Network, Vec<NodeAddr>) {
    let net = Network::new(GroupParams::generate());
    let addrs = (0..n).map(|i| net.add_node(format!("node_{i}"))).collect();
    (net, addrs)
}

// ---------------------------------------------------------------------------
// 1. Full Payment Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn five_node_payment_lifecycle() {
    let (net, addrs) = network(5);

    // node_0 pays 50 across node_1..node_4.
    let receipt = net.begin(&addrs[0], 50, &addrs[1..]).expect("payment");

    // Four sequential lock establishments, each relay keeping the fee.
    let lock_amounts: Vec<u64> = receipt.locks.iter().map(|(_, a)| *a).collect();
    assert_eq!(lock_amounts, vec![50, 49, 48, 47]);
    let lockers: Vec<&str> = receipt.locks.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(lockers, vec!["node_1", "node_2", "node_3", "node_4"]);

    // Backward release 4→3→2→1, with the sender's own check closing the
    // wave. Every hop reports VALID KEY: true.
    let checkers: Vec<&str> = receipt
        .release_checks
        .iter()
        .map(|(n, _)| n.as_str())
        .collect();
    assert_eq!(checkers, vec!["node_3", "node_2", "node_1", "node_0"]);
    assert!(receipt.all_keys_valid());

    // Everyone is back to idle.
    for addr in &addrs {
        assert!(net.is_idle(addr).expect("registered"));
    }
}

#[test]
fn minimum_path_of_two_hops_works() {
    let (net, addrs) = network(3);
    let receipt = net.begin(&addrs[0], 10, &addrs[1..]).expect("payment");
    assert_eq!(receipt.locks.len(), 2);
    assert_eq!(receipt.release_checks.len(), 2);
    assert!(receipt.all_keys_valid());
}

#[test]
fn long_path_still_releases_cleanly() {
    let (net, addrs) = network(9);
    let receipt = net.begin(&addrs[0], 100, &addrs[1..]).expect("payment");
    assert_eq!(receipt.locks.len(), 8);
    assert!(receipt.all_keys_valid());
    let last = receipt.locks.last().expect("final lock");
    assert_eq!(last.1, 100 - 7 * HOP_FEE);
}

#[test]
fn sequential_payments_over_the_same_path() {
    let (net, addrs) = network(5);
    for _ in 0..5 {
        let receipt = net
            .begin_blocking(&addrs[0], 50, &addrs[1..])
            .expect("payment");
        assert!(receipt.all_keys_valid());
    }
}

#[test]
fn distinct_senders_can_alternate() {
    let (net, addrs) = network(5);

    let forward = net.begin(&addrs[0], 50, &addrs[1..]).expect("forward");
    assert!(forward.all_keys_valid());

    // The same nodes, paid the other way around.
    let back_path: Vec<NodeAddr> = addrs[..4].iter().rev().cloned().collect();
    let backward = net.begin(&addrs[4], 50, &back_path).expect("backward");
    assert!(backward.all_keys_valid());
}

// ---------------------------------------------------------------------------
// 2. Admission Guard
// ---------------------------------------------------------------------------

#[test]
fn second_begin_on_busy_node_is_already_busy() {
    let params = GroupParams::generate();
    let mut node = Node::new(params, NodeAddr::from("node_0"));
    let path = vec![NodeAddr::from("node_1"), NodeAddr::from("node_2")];

    node.begin_transaction(50, &path).expect("first begin");
    let before = node.session_id().cloned().expect("in flight");

    let err = node.begin_transaction(10, &path).unwrap_err();
    assert!(matches!(err, ProtocolError::AlreadyBusy));

    // The in-flight session is exactly as it was.
    assert_eq!(node.session_id(), Some(&before));
    assert_eq!(node.state_tag(), StateTag::LockSender3);
}

#[test]
fn single_hop_path_is_too_short() {
    let params = GroupParams::generate();
    let mut node = Node::new(params, NodeAddr::from("node_0"));
    let err = node
        .begin_transaction(50, &[NodeAddr::from("node_1")])
        .unwrap_err();
    assert!(matches!(err, ProtocolError::PathTooShort { .. }));
    assert!(node.is_idle());
}

// ---------------------------------------------------------------------------
// 3. Expected-State Tagging
// ---------------------------------------------------------------------------

#[test]
fn mistagged_message_is_a_state_mismatch() {
    let params = GroupParams::generate();
    let mut node = Node::new(params.clone(), NodeAddr::from("node_1"));

    let env = Envelope {
        session: SessionId {
            origin: NodeAddr::from("node_0"),
            seq: 1,
        },
        expected: StateTag::LockRecipient6,
        payload: Payload::LockOpen(LockOpen {
            amount: 50,
            pk: params.exp(&params.random_scalar()),
        }),
    };
    let err = node.receive(env).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::StateMismatch {
            expected: StateTag::LockRecipient6,
            actual: StateTag::WaitSetup,
        }
    ));
    // No side effects: the node never left idle.
    assert!(node.is_idle());
}

#[test]
fn well_tagged_but_wrong_payload_is_rejected() {
    let params = GroupParams::generate();
    let mut node = Node::new(params.clone(), NodeAddr::from("node_1"));

    // Correct tag for an idle node, but not a setup payload.
    let env = Envelope {
        session: SessionId {
            origin: NodeAddr::from("node_0"),
            seq: 1,
        },
        expected: StateTag::WaitSetup,
        payload: Payload::LockOpen(LockOpen {
            amount: 50,
            pk: params.exp(&params.random_scalar()),
        }),
    };
    let err = node.receive(env).unwrap_err();
    assert!(matches!(err, ProtocolError::UnexpectedPayload { .. }));
    assert!(node.is_idle());
}
