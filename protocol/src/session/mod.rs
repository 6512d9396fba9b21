//! # Transaction State Machine
//!
//! The per-node protocol engine: one [`Node`] owns at most one
//! [`SessionState`] at a time and advances it through the three phases —
//!
//! - **Setup**: the initiator walks the path once, handing every hop a
//!   slice of a verifiable additive secret-sharing chain of blinding
//!   scalars. Only the final hop learns the true accumulated total.
//! - **Lock**: hop by hop, adjacent pairs build Schnorr-style
//!   conditional locks over a commit-then-reveal nonce exchange. Every
//!   node first plays the lock *recipient* toward its left neighbor,
//!   then — if it is a relay — re-enters as *sender* toward its right.
//! - **Release**: the final recipient derives the unlocking value and it
//!   propagates backward; each hop validates its own lock's key, reports
//!   the boolean, and forwards the rewritten value left.
//!
//! Transitions are explicit functions dispatched over a tagged phase
//! union; there is no entry-action virtual dispatch. Every verification
//! failure is fail-stop for the session: a typed error comes back, the
//! session is destroyed, and the node returns to idle.

pub mod node;
pub mod state;

pub use node::{Node, Step};
pub use state::SessionState;
