// Copyright (c) 2026 Hoplock Contributors. MIT License.
// See LICENSE for details.

//! # Hoplock Protocol — Core Library
//!
//! The node-local engine of a multi-hop payment-channel lock: a sender
//! establishes a chain of cryptographically linked conditional locks
//! across a path of relays, then the locks unlock atomically backward
//! from recipient to sender. Relays learn nothing about the endpoints
//! beyond their immediate neighbors — lock identifiers are pairwise
//! blinded and the release values are masked by an additively shared
//! blinding chain.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of
//! the engine:
//!
//! - **crypto** — The group oracle and the primitives the protocol
//!   composes: NIZK proofs of knowledge, hash commitments, Schnorr-style
//!   partial signatures. No protocol knowledge.
//! - **wire** — The tagged message envelope and payload types. Every
//!   message carries the state its sender expects the receiver to be in;
//!   anything else is rejected on arrival.
//! - **session** — The per-node state machine: Setup, Lock, and Release
//!   phases over a single in-flight session. The hard part.
//! - **topology** — Path iteration and role kickoff: an in-memory
//!   network registry and the FIFO pump that drives a transaction to
//!   quiescence.
//! - **config** — Protocol constants.
//! - **error** — The one error taxonomy everything above shares.
//!
//! ## Design stance
//!
//! 1. Every verification failure is fail-stop for its session — a typed
//!    error, a torn-down session, an idle node. Never a process exit.
//! 2. One session per node, enforced at admission. Concurrency lives in
//!    the driver, never inside a session.
//! 3. Crypto primitives return booleans; policy lives in the session
//!    layer. If it checks money, it has tests.

pub mod config;
pub mod crypto;
pub mod error;
pub mod session;
pub mod topology;
pub mod wire;

pub use error::ProtocolError;
pub use session::{Node, Step};
pub use topology::{Network, TransactionReceipt};
pub use wire::{Envelope, NodeAddr, SessionId, StateTag};
