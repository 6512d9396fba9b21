//! # Cryptographic Primitives for Hoplock
//!
//! Everything the lock protocol composes, with no protocol knowledge of
//! its own. We deliberately chose boring, well-audited building blocks:
//!
//! - **Ristretto over Curve25519** for the group — prime order, no
//!   cofactor footguns, constant-time arithmetic (`curve25519-dalek`).
//! - **SHA-512** for Fiat–Shamir challenges — the canonical wide-reduce
//!   path into the dalek scalar field.
//! - **BLAKE3** for commitments and domain derivation — because we live
//!   in the future.
//!
//! The submodules:
//!
//! - **group** — the prime-order group oracle and the shared parameter
//!   set every node must agree on.
//! - **hash** — transcript hashing into the scalar field.
//! - **keys** — a node's static identity keypair `(sk, pk = sk·G)`.
//! - **nizk** — non-interactive zero-knowledge proof of discrete-log
//!   knowledge (Schnorr sigma protocol, Fiat–Shamir transformed).
//! - **commitment** — hiding/binding hash commitments, used for the
//!   commit-then-reveal nonce exchange.
//! - **schnorr** — the two-party partial-signature algebra the locks are
//!   made of: challenges, shares, and the verification equations.
//!
//! Every `verify_*` here returns a `bool` and never panics on adversarial
//! input. Abort policy belongs to the caller — the session layer decides
//! what a `false` means.

pub mod commitment;
pub mod group;
pub mod hash;
pub mod keys;
pub mod nizk;
pub mod schnorr;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use commitment::{commit, commit_verify, Commitment, Opening};
pub use group::GroupParams;
pub use hash::Transcript;
pub use keys::NodeKeypair;
pub use nizk::DlogProof;
pub use schnorr::{LockDescriptor, ReleaseKey};
