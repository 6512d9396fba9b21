//! # Hash Commitments
//!
//! A hiding and binding commitment to a byte string:
//!
//! ```text
//! commit(m):  r ← 32 random bytes;  c = BLAKE3_keyed(domain, r ‖ m)
//! ```
//!
//! The lock protocol uses this for its wormhole-resistance step: the lock
//! recipient commits to its nonce (and the nonce's knowledge proof)
//! *before* learning the sender's nonce, so neither side can bias the
//! combined Schnorr exponent after seeing the other's contribution.
//!
//! Keying the hash with the [`GroupParams`] domain means a commitment
//! produced under one parameter set never opens under another.

use curve25519_dalek::ristretto::RistrettoPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::group::GroupParams;
use super::nizk::DlogProof;

/// The decommitment value. Reveal it to open the commitment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening([u8; 32]);

/// The commitment value. Safe to transmit before the opening.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment([u8; 32]);

/// Commit to `message`. Returns the opening (keep it secret until reveal
/// time) and the commitment (send it).
pub fn commit(params: &GroupParams, message: &[u8]) -> (Opening, Commitment) {
    let mut r = [0u8; 32];
    OsRng.fill_bytes(&mut r);
    let opening = Opening(r);
    let commitment = Commitment(digest(params, &opening, message));
    (opening, commitment)
}

/// Check that `(opening, message)` reproduces `commitment` exactly.
pub fn commit_verify(
    params: &GroupParams,
    commitment: &Commitment,
    opening: &Opening,
    message: &[u8],
) -> bool {
    // blake3::Hash compares in constant time; route the comparison
    // through it rather than comparing raw arrays.
    blake3::Hash::from(commitment.0) == blake3::Hash::from(digest(params, opening, message))
}

fn digest(params: &GroupParams, opening: &Opening, message: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_keyed(params.domain());
    hasher.update(&opening.0);
    hasher.update(message);
    *hasher.finalize().as_bytes()
}

/// Canonical encoding of a nonce point plus its knowledge proof — the
/// tuple the lock recipient commits to before the reveal.
pub fn nonce_bytes(nonce: &RistrettoPoint, proof: &DlogProof) -> [u8; 128] {
    let mut out = [0u8; 128];
    out[..32].copy_from_slice(nonce.compress().as_bytes());
    out[32..64].copy_from_slice(proof.u.compress().as_bytes());
    out[64..96].copy_from_slice(proof.c.as_bytes());
    out[96..].copy_from_slice(proof.z.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::nizk;

    fn params() -> GroupParams {
        GroupParams::generate()
    }

    #[test]
    fn commitment_opens_with_exact_inputs() {
        let p = params();
        let (opening, commitment) = commit(&p, b"nonce package");
        assert!(commit_verify(&p, &commitment, &opening, b"nonce package"));
    }

    #[test]
    fn changed_message_flips_the_result() {
        let p = params();
        let (opening, commitment) = commit(&p, b"nonce package");
        assert!(!commit_verify(&p, &commitment, &opening, b"nonce packagf"));
    }

    #[test]
    fn wrong_opening_rejected() {
        let p = params();
        let (_, commitment) = commit(&p, b"m");
        let (other_opening, _) = commit(&p, b"m");
        assert!(!commit_verify(&p, &commitment, &other_opening, b"m"));
    }

    #[test]
    fn commitments_are_hiding() {
        // Same message, fresh randomness: different commitment values.
        let p = params();
        let (_, c1) = commit(&p, b"m");
        let (_, c2) = commit(&p, b"m");
        assert_ne!(c1, c2);
    }

    #[test]
    fn different_params_do_not_cross_verify() {
        let p = params();
        let q = GroupParams::from_generators(
            *p.aux_generator(),
            *p.generator(),
        );
        let (opening, commitment) = commit(&p, b"m");
        assert!(!commit_verify(&q, &commitment, &opening, b"m"));
    }

    #[test]
    fn nonce_bytes_bind_every_component() {
        let p = params();
        let x = p.random_scalar();
        let (nonce, proof) = nizk::prove(&p, &x);
        let base = nonce_bytes(&nonce, &proof);

        let other = p.exp(&p.random_scalar());
        assert_ne!(base[..], nonce_bytes(&other, &proof)[..]);

        let (_, other_proof) = nizk::prove(&p, &x);
        assert_ne!(base[..], nonce_bytes(&nonce, &other_proof)[..]);
    }
}
