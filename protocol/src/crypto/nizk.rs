//! # NIZK Proof of Discrete-Log Knowledge
//!
//! A Schnorr sigma protocol made non-interactive with Fiat–Shamir: the
//! prover shows it knows `x` with `h = x·G` without revealing `x`.
//!
//! ```text
//! prove(x):   r ← random;  u = r·G;  c = H(G, h, u);  z = r + c·x
//! verify(h, (u, c, z)):  c == H(G, h, u)  ∧  z·G == u + c·h
//! ```
//!
//! The protocol leans on this in two places: every Setup hop receives a
//! proof that the accumulated blinding total is well formed, and every
//! lock nonce travels with a proof of its discrete log so a counterparty
//! cannot inject a nonce it does not control.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use super::group::GroupParams;
use super::hash::Transcript;

/// Transcript label for the Fiat–Shamir challenge.
const CHALLENGE_LABEL: &str = "nizk-dlog";

/// A non-interactive proof of knowledge of a discrete logarithm.
///
/// Carries the commitment point `u`, the challenge `c`, and the response
/// `z`. The statement `h` it proves travels alongside the proof in
/// whatever message uses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlogProof {
    /// Prover's commitment `u = r·G`.
    pub u: RistrettoPoint,
    /// Fiat–Shamir challenge `c = H(G, h, u)`.
    pub c: Scalar,
    /// Response `z = r + c·x`.
    pub z: Scalar,
}

/// Prove knowledge of `x`. Returns the statement `h = x·G` together with
/// the proof, since the caller invariably needs to transmit both.
pub fn prove(params: &GroupParams, x: &Scalar) -> (RistrettoPoint, DlogProof) {
    let h = params.exp(x);
    let r = params.random_scalar();
    let u = params.exp(&r);
    let c = challenge(params, &h, &u);
    let z = r + c * x;
    (h, DlogProof { u, c, z })
}

/// Verify a proof against its statement.
///
/// Recomputes the challenge from the transcript and checks both the
/// challenge equality and the verification equation. Returns `false` on
/// any mismatch; never panics.
pub fn verify(params: &GroupParams, statement: &RistrettoPoint, proof: &DlogProof) -> bool {
    if proof.c != challenge(params, statement, &proof.u) {
        return false;
    }
    params.exp(&proof.z) == proof.u + proof.c * statement
}

fn challenge(params: &GroupParams, statement: &RistrettoPoint, u: &RistrettoPoint) -> Scalar {
    Transcript::new(params, CHALLENGE_LABEL)
        .point(params.generator())
        .point(statement)
        .point(u)
        .finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GroupParams {
        GroupParams::generate()
    }

    #[test]
    fn proof_verifies_for_any_witness() {
        let p = params();
        for _ in 0..8 {
            let x = p.random_scalar();
            let (h, proof) = prove(&p, &x);
            assert!(verify(&p, &h, &proof));
        }
    }

    #[test]
    fn wrong_statement_rejected() {
        let p = params();
        let x = p.random_scalar();
        let (_, proof) = prove(&p, &x);
        let other = p.exp(&p.random_scalar());
        assert!(!verify(&p, &other, &proof));
    }

    #[test]
    fn tampered_commitment_rejected() {
        let p = params();
        let x = p.random_scalar();
        let (h, mut proof) = prove(&p, &x);
        proof.u = proof.u + p.exp(&Scalar::ONE);
        assert!(!verify(&p, &h, &proof));
    }

    #[test]
    fn tampered_challenge_rejected() {
        let p = params();
        let x = p.random_scalar();
        let (h, mut proof) = prove(&p, &x);
        proof.c += Scalar::ONE;
        assert!(!verify(&p, &h, &proof));
    }

    #[test]
    fn tampered_response_rejected() {
        let p = params();
        let x = p.random_scalar();
        let (h, mut proof) = prove(&p, &x);
        proof.z += Scalar::ONE;
        assert!(!verify(&p, &h, &proof));
    }

    #[test]
    fn proof_serialization_round_trip() {
        let p = params();
        let x = p.random_scalar();
        let (h, proof) = prove(&p, &x);
        let bytes = bincode::serialize(&proof).expect("serialize");
        let restored: DlogProof = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(proof, restored);
        assert!(verify(&p, &h, &restored));
    }
}
