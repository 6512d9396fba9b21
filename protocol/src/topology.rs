//! # Topology Driver
//!
//! Thin orchestration over the state machine: a registry of named nodes,
//! an in-memory FIFO message pump, and the `begin` entry point that
//! kicks a sender off and drives the exchange to quiescence.
//!
//! The pump is deliberately boring. Every node emits at most one message
//! per step (the initiator's setup fan-out excepted), and each message
//! is generated in causal order, so draining a FIFO queue reproduces the
//! strict request/response discipline of the protocol — exactly one
//! message in flight per session at any moment.
//!
//! Each node sits behind its own `parking_lot::Mutex`, so all session
//! mutation is serialized per node even when multiple transactions run
//! from different threads. An idle-gate condvar per node backs
//! [`Network::begin_blocking`], which serializes repeated transactions
//! for benchmarking — the gate is a convenience, not a correctness
//! requirement.
//!
//! A real deployment would replace this module with a transport that
//! moves [`Envelope`](crate::wire::Envelope) bytes between processes;
//! nothing in the session layer would notice.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

use crate::crypto::GroupParams;
use crate::error::ProtocolError;
use crate::session::Node;
use crate::wire::{NodeAddr, Outbound, SessionId};

/// What a completed transaction looked like from the driver's seat.
#[derive(Debug)]
pub struct TransactionReceipt {
    /// The session that ran.
    pub session: SessionId,
    /// Each lock acceptance in chain order: `(accepting node, amount)`.
    pub locks: Vec<(NodeAddr, u64)>,
    /// Each release-time key check in propagation order:
    /// `(verifying node, VALID KEY boolean)`.
    pub release_checks: Vec<(NodeAddr, bool)>,
}

impl TransactionReceipt {
    /// True iff at least one hop verified a key and none reported false.
    pub fn all_keys_valid(&self) -> bool {
        !self.release_checks.is_empty() && self.release_checks.iter().all(|(_, valid)| *valid)
    }
}

/// Idle/busy flag with a condvar, one per registered node.
struct IdleGate {
    state: Mutex<bool>,
    cv: Condvar,
}

impl IdleGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(true),
            cv: Condvar::new(),
        }
    }

    fn set(&self, idle: bool) {
        let mut state = self.state.lock();
        *state = idle;
        if idle {
            self.cv.notify_all();
        }
    }

    fn wait(&self) {
        let mut state = self.state.lock();
        while !*state {
            self.cv.wait(&mut state);
        }
    }
}

struct Registered {
    node: Mutex<Node>,
    idle: IdleGate,
}

/// An in-memory network of protocol nodes sharing one parameter set.
pub struct Network {
    params: GroupParams,
    nodes: DashMap<NodeAddr, Arc<Registered>>,
}

impl Network {
    /// A network over the given shared parameters.
    pub fn new(params: GroupParams) -> Self {
        Self {
            params,
            nodes: DashMap::new(),
        }
    }

    /// The shared parameters every registered node was built with.
    pub fn params(&self) -> &GroupParams {
        &self.params
    }

    /// Register a fresh node under `name` and return its address.
    pub fn add_node(&self, name: impl Into<String>) -> NodeAddr {
        let addr = NodeAddr::new(name);
        let node = Node::new(self.params.clone(), addr.clone());
        self.nodes.insert(
            addr.clone(),
            Arc::new(Registered {
                node: Mutex::new(node),
                idle: IdleGate::new(),
            }),
        );
        addr
    }

    /// Whether the named node is currently idle.
    pub fn is_idle(&self, addr: &NodeAddr) -> Result<bool, ProtocolError> {
        Ok(self.entry(addr)?.node.lock().is_idle())
    }

    /// Block until the named node returns to idle. Returns immediately
    /// if it already is.
    pub fn wait_idle(&self, addr: &NodeAddr) -> Result<(), ProtocolError> {
        let entry = self.entry(addr)?;
        entry.idle.wait();
        Ok(())
    }

    /// Start a transaction from `initiator` over `path` and drive it to
    /// completion.
    ///
    /// Returns [`ProtocolError::AlreadyBusy`] without side effects if
    /// the initiator has a session in flight. Any fail-stop error from a
    /// hop aborts the drive and propagates; the erring node is already
    /// back to idle, upstream hops keep their dangling sessions (lock
    /// recovery is out of scope for the core).
    pub fn begin(
        &self,
        initiator: &NodeAddr,
        amount: u64,
        path: &[NodeAddr],
    ) -> Result<TransactionReceipt, ProtocolError> {
        for hop in path {
            if !self.nodes.contains_key(hop) {
                return Err(ProtocolError::UnknownPeer(hop.clone()));
            }
        }
        let entry = self.entry(initiator)?;

        let (session, step) = {
            let mut node = entry.node.lock();
            let step = node.begin_transaction(amount, path)?;
            let session = node
                .session_id()
                .cloned()
                .ok_or(ProtocolError::Invariant("initiator has no session after begin"))?;
            (session, step)
        };
        entry.idle.set(false);

        tracing::debug!(session = %session, "driving transaction to quiescence");
        // The pump reopens the initiator's gate when its own release
        // check completes the session; on failure the gate stays shut.
        self.pump(session, step.outbound)
    }

    /// Blocking variant of [`Network::begin`]: waits on the initiator's
    /// idle gate first, so sequential transactions can be issued from a
    /// loop (or several threads) without busy-retrying `AlreadyBusy`.
    pub fn begin_blocking(
        &self,
        initiator: &NodeAddr,
        amount: u64,
        path: &[NodeAddr],
    ) -> Result<TransactionReceipt, ProtocolError> {
        loop {
            self.wait_idle(initiator)?;
            match self.begin(initiator, amount, path) {
                // Another thread won the race for the gate; wait again.
                Err(ProtocolError::AlreadyBusy) => continue,
                other => return other,
            }
        }
    }

    /// FIFO delivery loop: pop, deliver, enqueue whatever the step
    /// produced, until the network quiesces.
    fn pump(
        &self,
        session: SessionId,
        outbound: Vec<Outbound>,
    ) -> Result<TransactionReceipt, ProtocolError> {
        let mut receipt = TransactionReceipt {
            session,
            locks: Vec::new(),
            release_checks: Vec::new(),
        };
        let mut queue: VecDeque<Outbound> = outbound.into();

        while let Some(out) = queue.pop_front() {
            let entry = self.entry(&out.to)?;
            let (result, idle_now) = {
                let mut node = entry.node.lock();
                let result = node.receive(out.envelope);
                let idle_now = node.is_idle();
                (result, idle_now)
            };
            entry.idle.set(idle_now);
            let step = match result {
                Ok(step) => step,
                Err(err) => {
                    tracing::warn!(
                        to = %out.to,
                        %err,
                        fail_stop = err.is_fail_stop(),
                        "delivery failed, aborting drive"
                    );
                    return Err(err);
                }
            };

            if let Some(amount) = step.lock_established {
                receipt.locks.push((out.to.clone(), amount));
            }
            if let Some(valid) = step.key_valid {
                receipt.release_checks.push((out.to.clone(), valid));
            }
            queue.extend(step.outbound);
        }
        Ok(receipt)
    }

    fn entry(&self, addr: &NodeAddr) -> Result<Arc<Registered>, ProtocolError> {
        self.nodes
            .get(addr)
            .map(|r| Arc::clone(&r))
            .ok_or_else(|| ProtocolError::UnknownPeer(addr.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn five_node_network() -> (Network, Vec<NodeAddr>) {
        let net = Network::new(GroupParams::generate());
        let addrs: Vec<NodeAddr> = (0..5).map(|i| net.add_node(format!("node_{i}"))).collect();
        (net, addrs)
    }

    #[test]
    fn five_node_payment_end_to_end() {
        let (net, addrs) = five_node_network();
        let receipt = net.begin(&addrs[0], 50, &addrs[1..]).expect("payment");

        assert!(receipt.all_keys_valid());
        assert_eq!(receipt.locks.len(), 4);
        assert_eq!(receipt.release_checks.len(), 4);
        for addr in &addrs {
            assert!(net.is_idle(addr).unwrap());
        }
    }

    #[test]
    fn unknown_initiator_is_rejected() {
        let (net, addrs) = five_node_network();
        let ghost = NodeAddr::from("node_99");
        let err = net.begin(&ghost, 50, &addrs[1..]).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownPeer(_)));
    }

    #[test]
    fn unknown_hop_is_rejected_before_setup_starts() {
        let (net, addrs) = five_node_network();
        let path = vec![addrs[1].clone(), NodeAddr::from("node_99")];
        let err = net.begin(&addrs[0], 50, &path).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownPeer(_)));
        assert!(net.is_idle(&addrs[0]).unwrap());
    }

    #[test]
    fn wait_idle_returns_immediately_on_idle_node() {
        let (net, addrs) = five_node_network();
        net.wait_idle(&addrs[2]).expect("idle node");
    }

    #[test]
    fn blocking_begin_serializes_concurrent_transactions() {
        let (net, addrs) = five_node_network();
        let net = Arc::new(net);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let net = Arc::clone(&net);
                let addrs = addrs.clone();
                thread::spawn(move || {
                    net.begin_blocking(&addrs[0], 50, &addrs[1..])
                        .expect("blocking payment")
                })
            })
            .collect();

        for handle in handles {
            let receipt = handle.join().expect("thread");
            assert!(receipt.all_keys_valid());
        }
        for addr in addrs.iter() {
            assert!(net.is_idle(addr).unwrap());
        }
    }

    #[test]
    fn receipts_carry_fee_decremented_amounts() {
        let (net, addrs) = five_node_network();
        let receipt = net.begin(&addrs[0], 50, &addrs[1..]).expect("payment");
        let amounts: Vec<u64> = receipt.locks.iter().map(|(_, a)| *a).collect();
        assert_eq!(amounts, vec![50, 49, 48, 47]);

        // Release wave runs recipient back to sender.
        let checkers: Vec<&NodeAddr> = receipt.release_checks.iter().map(|(n, _)| n).collect();
        assert_eq!(
            checkers,
            vec![&addrs[3], &addrs[2], &addrs[1], &addrs[0]]
        );
    }
}
