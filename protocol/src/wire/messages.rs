//! Protocol payloads.
//!
//! One variant per message the state machine can emit. The shapes follow
//! the three phases: one setup message per hop, five lock messages per
//! adjacent pair, one release message per hop on the way back.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use crate::crypto::{Commitment, DlogProof, Opening};

use super::envelope::NodeAddr;

/// The payload of a wire envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Setup-phase share of the blinding chain, one per hop.
    Setup(SetupHop),
    /// Lock step a: the sender opens a lock toward its right neighbor.
    LockOpen(LockOpen),
    /// Lock step b: the recipient answers with its key and a nonce
    /// commitment.
    LockCommit(LockCommit),
    /// Lock step c: the sender reveals its nonce with a knowledge proof.
    LockNonce(LockNonce),
    /// Lock step d: the recipient opens its commitment and sends its
    /// partial share.
    LockShare(LockShare),
    /// Lock step e: the sender returns the combined share.
    LockDone(LockDone),
    /// Release-phase key material, propagating right to left.
    Release(Release),
}

impl Payload {
    /// Wire name of the variant, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Setup(_) => "Setup",
            Payload::LockOpen(_) => "LockOpen",
            Payload::LockCommit(_) => "LockCommit",
            Payload::LockNonce(_) => "LockNonce",
            Payload::LockShare(_) => "LockShare",
            Payload::LockDone(_) => "LockDone",
            Payload::Release(_) => "Release",
        }
    }
}

/// One hop's slice of the verifiable additive secret-sharing chain.
///
/// Every intermediate hop receives a fresh blinding scalar, the
/// cumulative blinding element up to its predecessor, and a proof that
/// the running total is well formed. Only the final hop receives the
/// true accumulated total in `key`; everyone else gets `None` and learns
/// their lock's key during Release.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetupHop {
    /// Predecessor's cumulative blinding element `Y_{i-1}`.
    pub y_prev: RistrettoPoint,
    /// This hop's local blinding scalar `y_i` (zero at the final hop).
    pub y: Scalar,
    /// Left neighbor for this session.
    pub left: NodeAddr,
    /// Right neighbor for this session; `None` at the final hop.
    pub right: Option<NodeAddr>,
    /// The true release key total — populated only for the final hop.
    pub key: Option<Scalar>,
    /// Statement `g^(Σ y)` the proof speaks about.
    pub statement: RistrettoPoint,
    /// Proof of knowledge of the running blinding total.
    pub proof: DlogProof,
}

/// Lock opening: amount under negotiation and the sender's identity key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockOpen {
    /// Amount this lock is for.
    pub amount: u64,
    /// Sender's public identity element.
    pub pk: RistrettoPoint,
}

/// The recipient's identity key and its committed nonce package.
///
/// Commit-then-reveal: the commitment pins the recipient's nonce before
/// the sender reveals its own, so neither side can bias the combined
/// exponent after seeing the other's value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockCommit {
    /// Recipient's public identity element.
    pub pk: RistrettoPoint,
    /// Commitment to the recipient's nonce point and knowledge proof.
    pub commitment: Commitment,
}

/// The sender's nonce point with its knowledge proof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockNonce {
    /// Sender's nonce point `R = g^r`.
    pub nonce: RistrettoPoint,
    /// Proof of knowledge of `r`.
    pub proof: DlogProof,
}

/// The recipient's partial share plus everything needed to check it:
/// nonce, knowledge proof, and the opening of the earlier commitment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockShare {
    /// Amount the lock message text binds.
    pub amount: u64,
    /// Recipient's nonce point, now revealed.
    pub nonce: RistrettoPoint,
    /// Recipient's partial share `s = r + e·sk`.
    pub share: Scalar,
    /// The lock's message text.
    pub message: String,
    /// Proof of knowledge of the nonce.
    pub proof: DlogProof,
    /// Opening of the commitment sent in [`LockCommit`].
    pub opening: Opening,
}

/// The combined share closing the lock between two neighbors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockDone {
    /// Amount the finished lock is for.
    pub amount: u64,
    /// The lock's message text.
    pub message: String,
    /// Combined share `sp = s + r + e·sk`.
    pub share: Scalar,
}

/// Release key material: the lock's rfactor and its unlocking scalar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// The rfactor of the lock being released.
    pub w0: RistrettoPoint,
    /// The unlocking scalar.
    pub w: Scalar,
}
