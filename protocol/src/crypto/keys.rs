//! # Node Identity Keys
//!
//! Every node holds one static keypair `(sk, pk = sk·G)` in the protocol
//! group. The public key doubles as the node's cryptographic identity and
//! as one half of the pairwise-blinded lock identifiers (`pk_self + pk_peer`)
//! that hide which two real identities a lock binds.
//!
//! ## Security considerations
//!
//! - Keys are generated from `OsRng` at node construction. There is no
//!   key import path in the core — identities are ephemeral to a process.
//! - The secret scalar is never serialized and never logged. `Debug`
//!   prints the public key only.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use std::fmt;

use super::group::{abbrev, GroupParams};

/// A node's static identity keypair in the protocol group.
///
/// Intentionally implements neither `Serialize` nor `Clone`: the secret
/// half should not be copied around casually. The session layer borrows
/// the keypair from the node that owns it.
pub struct NodeKeypair {
    sk: Scalar,
    pk: RistrettoPoint,
}

impl NodeKeypair {
    /// Generate a fresh identity under the given parameters.
    pub fn generate(params: &GroupParams) -> Self {
        let sk = params.random_scalar();
        let pk = params.exp(&sk);
        Self { sk, pk }
    }

    /// The public identity element `pk = sk·G`. Safe to share; the
    /// protocol exchanges it in lock-opening messages.
    pub fn public(&self) -> &RistrettoPoint {
        &self.pk
    }

    /// The secret scalar. Needed by the session layer to form partial
    /// signature shares (`s = r + e·sk`). Don't pass it anywhere else.
    pub fn secret(&self) -> &Scalar {
        &self.sk
    }
}

impl fmt::Debug for NodeKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secret scalar, not even partially.
        write!(f, "NodeKeypair(pk={})", abbrev(&self.pk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_matches_secret() {
        let params = GroupParams::generate();
        let kp = NodeKeypair::generate(&params);
        assert_eq!(*kp.public(), params.exp(kp.secret()));
    }

    #[test]
    fn generated_identities_are_distinct() {
        let params = GroupParams::generate();
        let a = NodeKeypair::generate(&params);
        let b = NodeKeypair::generate(&params);
        assert_ne!(a.public(), b.public());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let params = GroupParams::generate();
        let kp = NodeKeypair::generate(&params);
        let rendered = format!("{:?}", kp);
        assert!(rendered.starts_with("NodeKeypair(pk="));
        assert!(!rendered.contains(&hex::encode(kp.secret().as_bytes())));
    }
}
