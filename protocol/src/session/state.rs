//! Per-session data and the phase union.
//!
//! A node holds at most one [`SessionState`] at a time — created at
//! setup entry (initiator) or on the first setup receipt (relay and
//! recipient), destroyed when the node returns to idle after release
//! completes or the session aborts. All fields are per-instance; nothing
//! here is ever shared between nodes.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;

use crate::crypto::{Commitment, DlogProof, LockDescriptor, Opening};
use crate::wire::{NodeAddr, SessionId, StateTag};

/// Where a session currently stands, with the ephemeral data each
/// waiting state needs to finish its step.
///
/// Idle is represented by the *absence* of a session, so this union only
/// covers in-flight states. The transient entry-action states of the
/// protocol description (setup entry, lock-sender entry, release entry)
/// are transition functions on [`super::Node`], not variants.
#[derive(Debug)]
pub enum Phase {
    /// Awaiting the lock opening from the left neighbor.
    LockRecipient2,
    /// Awaiting the recipient's key and nonce commitment from the right.
    LockSender3,
    /// Awaiting the sender's nonce reveal.
    LockRecipient4(RecipientNonce),
    /// Awaiting the recipient's share and commitment opening.
    LockSender5(SenderNonce),
    /// Awaiting the combined share that closes the lock.
    LockRecipient6(PendingLock),
    /// Lock chain extended rightward; awaiting the release value.
    WaitRelease,
}

impl Phase {
    /// The expected-state tag this phase answers to on the wire.
    pub fn tag(&self) -> StateTag {
        match self {
            Phase::LockRecipient2 => StateTag::LockRecipient2,
            Phase::LockSender3 => StateTag::LockSender3,
            Phase::LockRecipient4(_) => StateTag::LockRecipient4,
            Phase::LockSender5(_) => StateTag::LockSender5,
            Phase::LockRecipient6(_) => StateTag::LockRecipient6,
            Phase::WaitRelease => StateTag::WaitRelease,
        }
    }
}

/// Lock recipient's stash between committing to its nonce and learning
/// the sender's.
#[derive(Debug)]
pub struct RecipientNonce {
    /// Nonce scalar `r`.
    pub(crate) r: Scalar,
    /// Nonce point `R = g^r`.
    pub(crate) big_r: RistrettoPoint,
    /// Amount the lock under construction is for.
    pub(crate) amount: u64,
    /// Knowledge proof for `R`, revealed later.
    pub(crate) proof: DlogProof,
    /// Opening of the commitment sent to the sender.
    pub(crate) opening: Opening,
}

/// Lock sender's stash between revealing its nonce and receiving the
/// recipient's share.
#[derive(Debug)]
pub struct SenderNonce {
    /// Nonce scalar `r`.
    pub(crate) r: Scalar,
    /// Nonce point `R = g^r`.
    pub(crate) big_r: RistrettoPoint,
    /// The recipient's nonce commitment, checked against the reveal.
    pub(crate) commitment: Commitment,
}

/// Lock recipient's stash while the sender assembles the combined share.
#[derive(Debug)]
pub struct PendingLock {
    /// Combined nonce-and-blinding point `R_prev + R + Y_prev`.
    pub(crate) rfactor: RistrettoPoint,
    /// This node's nonce point.
    pub(crate) big_r: RistrettoPoint,
    /// The sender's nonce point.
    pub(crate) big_r_prev: RistrettoPoint,
    /// The lock challenge `e`, already fixed by the transcript.
    pub(crate) challenge: Scalar,
}

/// Everything one node knows about its in-flight transaction.
#[derive(Debug)]
pub struct SessionState {
    /// The transaction identifier every envelope must carry.
    pub(crate) id: SessionId,
    /// Current phase plus its ephemeral data.
    pub(crate) phase: Phase,
    /// Left neighbor on the path; `None` at the initiator.
    pub(crate) left: Option<NodeAddr>,
    /// Right neighbor on the path; `None` at the final recipient.
    pub(crate) right: Option<NodeAddr>,
    /// Predecessor's cumulative blinding element `Y'`; `None` at the
    /// initiator, which starts the chain.
    pub(crate) y_prev: Option<RistrettoPoint>,
    /// This node's cumulative blinding element `Y = Y'·g^y`.
    pub(crate) cum: RistrettoPoint,
    /// This node's local blinding scalar.
    pub(crate) y: Scalar,
    /// Release-key slot, rfactor half. Populated when release reaches
    /// this node.
    pub(crate) key_w0: Option<RistrettoPoint>,
    /// Release-key slot, value half. The true accumulated total at the
    /// final recipient right after setup; everywhere else empty until
    /// release propagates in.
    pub(crate) key_value: Option<Scalar>,
    /// Pairwise-blinded identifier with the left neighbor.
    pub(crate) pk_left: Option<RistrettoPoint>,
    /// Pairwise-blinded identifier with the right neighbor.
    pub(crate) pk_right: Option<RistrettoPoint>,
    /// Committed lock descriptor toward the left neighbor.
    pub(crate) lock_left: Option<LockDescriptor>,
    /// Committed lock descriptor toward the right neighbor.
    pub(crate) lock_right: Option<LockDescriptor>,
    /// Left lock's `(rfactor, combined share)`.
    pub(crate) share_left: Option<(RistrettoPoint, Scalar)>,
    /// Right lock's combined share.
    pub(crate) share_right: Option<Scalar>,
}

impl SessionState {
    /// The session's identifier.
    pub fn id(&self) -> &SessionId {
        &self.id
    }
}
