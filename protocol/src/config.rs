//! # Protocol Constants
//!
//! Every magic number in Hoplock lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong.
//!
//! These values are part of the protocol contract between nodes —
//! changing them on one node and not another means sessions abort on
//! the first verification that disagrees.

/// Protocol version string, stamped by the node binary and negotiable
/// by an outer transport layer.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Fixed fee a relay keeps per forwarded hop: each relay re-opens the
/// next lock for `amount - HOP_FEE`.
///
/// Deliberately a plain constant with plain subtraction — the fee and
/// balance policy of a real deployment lives above this crate, and the
/// core does not enforce non-negativity of the forwarded amount.
pub const HOP_FEE: u64 = 1;

/// Minimum number of hops after the initiator: at least one relay and
/// the final recipient. Shorter paths have no lock chain to build.
pub const MIN_PATH_HOPS: usize = 2;
