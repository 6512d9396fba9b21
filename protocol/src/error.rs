//! Error taxonomy for the lock protocol.
//!
//! Four of these are fail-stop for the session that hits them —
//! [`StateMismatch`](ProtocolError::StateMismatch),
//! [`ProofInvalid`](ProtocolError::ProofInvalid),
//! [`CommitmentInvalid`](ProtocolError::CommitmentInvalid) and
//! [`SignatureInvalid`](ProtocolError::SignatureInvalid): the session is
//! logged, torn down irrecoverably, and the node returns to idle. A
//! single falsified check voids the lock chain's atomicity guarantee, so
//! there is no retry and no partial rollback.
//!
//! [`AlreadyBusy`](ProtocolError::AlreadyBusy) is the only recoverable
//! error — the admission guard turning away a second transaction while
//! one is in flight. Callers may retry later or wait on the idle gate.
//!
//! [`SessionMismatch`](ProtocolError::SessionMismatch) and
//! [`StaleSession`](ProtocolError::StaleSession) are rejections of the
//! *message*, not of the in-flight session: a stray or replayed envelope
//! must not give an attacker a way to kill a healthy session.

use thiserror::Error;

use crate::wire::{NodeAddr, SessionId, StateTag};

/// Everything that can go wrong inside the protocol engine.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The inbound envelope expects the receiver in a different state.
    /// Fail-stop: reordering, forgery, or session cross-talk.
    #[error("protocol state mismatch: message expects {expected}, node is in {actual}")]
    StateMismatch {
        /// State the sender tagged the message with.
        expected: StateTag,
        /// State the receiving node is actually in.
        actual: StateTag,
    },

    /// A NIZK proof failed verification. Fail-stop.
    #[error("invalid proof: {0}")]
    ProofInvalid(&'static str),

    /// A commitment did not open to the revealed value. Fail-stop —
    /// this is the wormhole-resistance check tripping.
    #[error("invalid commitment opening")]
    CommitmentInvalid,

    /// A Schnorr share failed its verification equation. Fail-stop.
    #[error("invalid signature share: {0}")]
    SignatureInvalid(&'static str),

    /// The admission guard: a transaction was started on a node that
    /// already holds an in-flight session. Recoverable — retry later.
    #[error("node is busy with an in-flight session")]
    AlreadyBusy,

    /// The envelope belongs to a different session than the active one.
    /// The message is rejected; the active session is untouched.
    #[error("session mismatch: active {active}, message carries {got}")]
    SessionMismatch {
        /// Identifier of the session this node is running.
        active: SessionId,
        /// Identifier the envelope carried.
        got: SessionId,
    },

    /// A setup message reusing the identifier space of a session this
    /// node already completed. Rejected without side effects.
    #[error("stale session {0}: not newer than the last completed from that origin")]
    StaleSession(SessionId),

    /// The payload variant does not belong to the receiver's state even
    /// though the expected-state tag matched. Fail-stop, same class as a
    /// state mismatch.
    #[error("unexpected {payload} payload in state {state}")]
    UnexpectedPayload {
        /// Wire name of the offending payload.
        payload: &'static str,
        /// State the node was in.
        state: StateTag,
    },

    /// A transaction path shorter than the protocol minimum.
    #[error("path too short: need at least {min} hops, got {got}")]
    PathTooShort {
        /// Minimum number of hops after the initiator.
        min: usize,
        /// Hops actually supplied.
        got: usize,
    },

    /// The topology driver was asked to deliver to an unregistered node.
    #[error("unknown peer {0}")]
    UnknownPeer(NodeAddr),

    /// Wire encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// A session field that must be populated in the current state was
    /// not. Indicates a bug in the transition logic, not peer behavior.
    #[error("session invariant violated: {0}")]
    Invariant(&'static str),
}

impl ProtocolError {
    /// Whether this error tears down the session that produced it.
    /// Everything except the admission rejection and pure message
    /// rejections is fail-stop.
    pub fn is_fail_stop(&self) -> bool {
        !matches!(
            self,
            ProtocolError::AlreadyBusy
                | ProtocolError::SessionMismatch { .. }
                | ProtocolError::StaleSession(_)
                | ProtocolError::UnknownPeer(_)
                | ProtocolError::PathTooShort { .. }
        )
    }
}
