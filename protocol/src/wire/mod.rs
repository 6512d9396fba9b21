//! # Wire Message Protocol
//!
//! The protocol runs over an opaque, reliable, ordered, point-to-point
//! byte channel; framing and connection handling belong to an outer
//! layer. What this module owns is the *synchronization discipline*:
//!
//! - every payload travels inside an [`Envelope`] tagged with the
//!   [`SessionId`] it belongs to and the [`StateTag`] the sender expects
//!   the receiver to be in;
//! - a receiver whose state does not match the tag rejects the message
//!   outright — that mismatch signals reordering, forgery, or an
//!   overlapping session and is never silently retried;
//! - exchange is strictly request/response per session: one outbound
//!   message, then wait. No pipelining of hops inside one session.
//!
//! [`Envelope::to_bytes`]/[`Envelope::from_bytes`] give the byte-channel
//! encoding (bincode); the in-memory topology driver skips it and hands
//! envelopes across directly.

pub mod envelope;
pub mod messages;

pub use envelope::{Envelope, NodeAddr, Outbound, SessionId, StateTag};
pub use messages::{
    LockCommit, LockDone, LockNonce, LockOpen, LockShare, Payload, Release, SetupHop,
};
