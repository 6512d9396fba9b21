//! # Group Oracle
//!
//! The lock protocol is written against an abstract prime-order cyclic
//! group with a fixed generator. This module pins that abstraction to
//! Ristretto over Curve25519 (`curve25519-dalek`), which gives us a
//! prime-order group with no cofactor footguns and constant-time
//! arithmetic out of the box.
//!
//! Notation: the protocol literature writes `g^x` multiplicatively; in
//! dalek's additive notation that is `x · G`. The code uses the additive
//! form throughout.
//!
//! ## Shared parameters
//!
//! Every participating node must be constructed with the *same*
//! [`GroupParams`]. The parameter set carries the generator `g`, an
//! auxiliary generator `h`, and a 32-byte `domain` derived from both.
//! The domain keys all commitment and transcript hashing, so proofs and
//! commitments produced under one parameter set can never verify under
//! another — two networks with different parameters are cryptographically
//! disjoint even if they share node identities.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Shared group parameters, supplied to every node at construction.
///
/// Obtain them once from [`GroupParams::generate`] (or deserialize a
/// published set) and hand clones to each node. Nodes never mutate them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupParams {
    /// The group generator. `pk = sk · g`, blinding elements are `y · g`.
    g: RistrettoPoint,
    /// Auxiliary generator with unknown discrete log relative to `g`.
    /// Not used by the lock equations directly; it exists to bind the
    /// hashing domain and to leave room for Pedersen-style extensions.
    h: RistrettoPoint,
    /// Domain separator derived from `(g, h)`. Keys every commitment and
    /// transcript hash produced under this parameter set.
    domain: [u8; 32],
}

impl GroupParams {
    /// Produce the canonical parameter set: `g` is the Ristretto
    /// basepoint and `h` is derived from `g` by hash-to-group, so nobody
    /// knows `log_g(h)`.
    pub fn generate() -> Self {
        let g = RISTRETTO_BASEPOINT_POINT;

        // Nothing-up-my-sleeve h: expand g's encoding to 64 uniform bytes
        // and map onto the group.
        let mut xof = blake3::Hasher::new_derive_key("hoplock group aux generator");
        xof.update(g.compress().as_bytes());
        let mut wide = [0u8; 64];
        xof.finalize_xof().fill(&mut wide);
        let h = RistrettoPoint::from_uniform_bytes(&wide);

        Self::from_generators(g, h)
    }

    /// Build a parameter set from explicit generators. The caller is
    /// responsible for `h` having an unknown discrete log w.r.t. `g`.
    pub fn from_generators(g: RistrettoPoint, h: RistrettoPoint) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("hoplock group domain");
        hasher.update(g.compress().as_bytes());
        hasher.update(h.compress().as_bytes());
        let domain = *hasher.finalize().as_bytes();
        Self { g, h, domain }
    }

    /// The group generator.
    pub fn generator(&self) -> &RistrettoPoint {
        &self.g
    }

    /// The auxiliary generator.
    pub fn aux_generator(&self) -> &RistrettoPoint {
        &self.h
    }

    /// The 32-byte hashing domain bound to this parameter set.
    pub fn domain(&self) -> &[u8; 32] {
        &self.domain
    }

    /// Fresh uniformly random scalar from the OS RNG.
    pub fn random_scalar(&self) -> Scalar {
        Scalar::random(&mut OsRng)
    }

    /// Group exponentiation `base^x`, i.e. `x · base` in additive form.
    pub fn pow(&self, base: &RistrettoPoint, x: &Scalar) -> RistrettoPoint {
        x * base
    }

    /// `g^x` for the fixed generator — the most common exponentiation in
    /// the protocol (public keys, blinding elements, nonce points).
    pub fn exp(&self, x: &Scalar) -> RistrettoPoint {
        x * self.g
    }
}

/// Truncated hex rendering of a group element for logs. Eight bytes is
/// plenty to tell elements apart in a trace and keeps lines readable.
pub fn abbrev(point: &RistrettoPoint) -> String {
    hex::encode(&point.compress().as_bytes()[..8])
}

/// Truncated hex rendering of a scalar for logs.
pub fn abbrev_scalar(scalar: &Scalar) -> String {
    hex::encode(&scalar.as_bytes()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_deterministic() {
        let a = GroupParams::generate();
        let b = GroupParams::generate();
        assert_eq!(a.generator(), b.generator());
        assert_eq!(a.aux_generator(), b.aux_generator());
        assert_eq!(a.domain(), b.domain());
    }

    #[test]
    fn aux_generator_differs_from_generator() {
        let params = GroupParams::generate();
        assert_ne!(params.generator(), params.aux_generator());
    }

    #[test]
    fn domain_binds_both_generators() {
        let params = GroupParams::generate();
        let swapped = GroupParams::from_generators(*params.aux_generator(), *params.generator());
        assert_ne!(params.domain(), swapped.domain());
    }

    #[test]
    fn exp_matches_pow_on_generator() {
        let params = GroupParams::generate();
        let x = params.random_scalar();
        assert_eq!(params.exp(&x), params.pow(params.generator(), &x));
    }

    #[test]
    fn random_scalars_are_distinct() {
        let params = GroupParams::generate();
        assert_ne!(params.random_scalar(), params.random_scalar());
    }

    #[test]
    fn params_serialization_round_trip() {
        let params = GroupParams::generate();
        let json = serde_json::to_string(&params).expect("serialize");
        let restored: GroupParams = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(params.generator(), restored.generator());
        assert_eq!(params.domain(), restored.domain());
    }
}
