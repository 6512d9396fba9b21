//! # Schnorr Share Algebra
//!
//! The conditional locks between adjacent hops are two-party Schnorr-style
//! signatures assembled from partial shares. This module holds the pieces
//! the session layer combines:
//!
//! ```text
//! challenge:      e  = H(pk_pair, rfactor, message)
//! partial share:  s  = r + e·sk
//! share check:    s·G == R + e·pk          (R: the signer's nonce sum)
//! release check:  w·G == W0 + e·pk_pair    (W0: the lock's rfactor)
//! ```
//!
//! `pk_pair` is the pairwise-blinded identifier `pk_a + pk_b`, so a lock
//! binds two neighbors without exposing which global identities they are.
//! `rfactor` folds the cumulative blinding element into the nonce sum,
//! which is exactly what makes the final release value carry the blinding
//! total backward through the chain.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::group::{abbrev, GroupParams};
use super::hash::Transcript;

/// Transcript label for lock challenges.
const CHALLENGE_LABEL: &str = "lock-challenge";

/// A committed lock descriptor: the lock's message text and the
/// pairwise-blinded key it binds. One per adjacent neighbor.
#[derive(Clone, PartialEq, Eq)]
pub struct LockDescriptor {
    /// The human-readable payment statement the lock signs.
    pub message: String,
    /// Pairwise-blinded identifier `pk_self + pk_peer`.
    pub pk: RistrettoPoint,
}

impl fmt::Debug for LockDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockDescriptor")
            .field("message", &self.message)
            .field("pk", &abbrev(&self.pk))
            .finish()
    }
}

/// The unlocking value for a lock: the rfactor it was formed over and
/// the scalar that opens it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseKey {
    /// The lock's combined nonce-and-blinding point.
    pub w0: RistrettoPoint,
    /// The unlocking scalar.
    pub w: Scalar,
}

/// The lock challenge `e = H(pk_pair, rfactor, message)`. Both sides of a
/// lock compute it independently and must agree.
pub fn challenge(
    params: &GroupParams,
    pk_pair: &RistrettoPoint,
    rfactor: &RistrettoPoint,
    message: &str,
) -> Scalar {
    Transcript::new(params, CHALLENGE_LABEL)
        .point(pk_pair)
        .point(rfactor)
        .bytes(message.as_bytes())
        .finalize()
}

/// One party's partial signature share `s = r + e·sk`.
pub fn partial_share(r: &Scalar, e: &Scalar, sk: &Scalar) -> Scalar {
    r + e * sk
}

/// The share verification equation `s·G == nonces + e·pk`.
///
/// Covers both uses in the protocol: a single partial share against the
/// counterparty's nonce and key, and a combined share against the nonce
/// sum and the pairwise-blinded key.
pub fn verify_share(
    params: &GroupParams,
    s: &Scalar,
    nonces: &RistrettoPoint,
    pk: &RistrettoPoint,
    e: &Scalar,
) -> bool {
    params.exp(s) == nonces + e * pk
}

/// Validate a propagated release key against a lock this node holds:
/// `w·G == W0 + e·pk` with `e` recomputed from the lock's own text.
pub fn verify_release(params: &GroupParams, lock: &LockDescriptor, key: &ReleaseKey) -> bool {
    let e = challenge(params, &lock.pk, &key.w0, &lock.message);
    verify_share(params, &key.w, &key.w0, &lock.pk, &e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::NodeKeypair;

    fn params() -> GroupParams {
        GroupParams::generate()
    }

    /// Builds the two-party lock exactly as adjacent hops do, returning
    /// the pieces tests need to poke at.
    struct Lock {
        pk_pair: RistrettoPoint,
        rfactor: RistrettoPoint,
        e: Scalar,
        combined: Scalar,
        nonce_sum: RistrettoPoint,
    }

    fn build_lock(p: &GroupParams, message: &str) -> (NodeKeypair, NodeKeypair, Lock) {
        let sender = NodeKeypair::generate(p);
        let recipient = NodeKeypair::generate(p);
        let pk_pair = sender.public() + recipient.public();

        let r_s = p.random_scalar();
        let r_t = p.random_scalar();
        let blinding = p.exp(&p.random_scalar());
        let nonce_sum = p.exp(&r_s) + p.exp(&r_t);
        let rfactor = nonce_sum + blinding;

        let e = challenge(p, &pk_pair, &rfactor, message);
        let s_t = partial_share(&r_t, &e, recipient.secret());
        let combined = s_t + partial_share(&r_s, &e, sender.secret());

        (
            sender,
            recipient,
            Lock {
                pk_pair,
                rfactor,
                e,
                combined,
                nonce_sum,
            },
        )
    }

    #[test]
    fn partial_share_satisfies_its_equation() {
        let p = params();
        let kp = NodeKeypair::generate(&p);
        let r = p.random_scalar();
        let e = p.random_scalar();
        let s = partial_share(&r, &e, kp.secret());
        assert!(verify_share(&p, &s, &p.exp(&r), kp.public(), &e));
    }

    #[test]
    fn combined_share_satisfies_pair_equation() {
        let p = params();
        let (_, _, lock) = build_lock(&p, "pay 50 to node_2");
        assert!(verify_share(
            &p,
            &lock.combined,
            &lock.nonce_sum,
            &lock.pk_pair,
            &lock.e
        ));
    }

    #[test]
    fn tampered_secret_key_fails() {
        let p = params();
        let kp = NodeKeypair::generate(&p);
        let wrong = NodeKeypair::generate(&p);
        let r = p.random_scalar();
        let e = p.random_scalar();
        let s = partial_share(&r, &e, wrong.secret());
        assert!(!verify_share(&p, &s, &p.exp(&r), kp.public(), &e));
    }

    #[test]
    fn tampered_nonce_fails() {
        let p = params();
        let kp = NodeKeypair::generate(&p);
        let r = p.random_scalar();
        let e = p.random_scalar();
        let s = partial_share(&r, &e, kp.secret());
        let wrong_nonce = p.exp(&p.random_scalar());
        assert!(!verify_share(&p, &s, &wrong_nonce, kp.public(), &e));
    }

    #[test]
    fn tampered_amount_changes_challenge_and_fails() {
        let p = params();
        let (_, _, lock) = build_lock(&p, "pay 50 to node_2");
        let e_tampered = challenge(&p, &lock.pk_pair, &lock.rfactor, "pay 51 to node_2");
        assert_ne!(lock.e, e_tampered);
        assert!(!verify_share(
            &p,
            &lock.combined,
            &lock.nonce_sum,
            &lock.pk_pair,
            &e_tampered
        ));
    }

    #[test]
    fn release_key_validates_against_lock() {
        // A lock releases when the holder learns the blinding scalar that
        // separates the combined share from the rfactor equation.
        let p = params();
        let message = "pay 49 to node_3";

        let sender = NodeKeypair::generate(&p);
        let recipient = NodeKeypair::generate(&p);
        let pk_pair = sender.public() + recipient.public();

        let r_s = p.random_scalar();
        let r_t = p.random_scalar();
        let y_total = p.random_scalar();
        let rfactor = p.exp(&r_s) + p.exp(&r_t) + p.exp(&y_total);

        let e = challenge(&p, &pk_pair, &rfactor, message);
        let combined = partial_share(&r_t, &e, recipient.secret())
            + partial_share(&r_s, &e, sender.secret());

        let lock = LockDescriptor {
            message: message.to_string(),
            pk: pk_pair,
        };
        let key = ReleaseKey {
            w0: rfactor,
            w: combined + y_total,
        };
        assert!(verify_release(&p, &lock, &key));

        let bad = ReleaseKey {
            w0: rfactor,
            w: combined,
        };
        assert!(!verify_release(&p, &lock, &bad));
    }
}
