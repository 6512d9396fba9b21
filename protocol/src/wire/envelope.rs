//! Envelope, addressing, and the expected-state tag.
//!
//! The envelope is the only thing that ever crosses the byte channel.
//! Its `expected` field is the synchronization heart of the protocol:
//! the sender stamps the state it believes the receiver is in, and the
//! receiver refuses anything stamped otherwise. On top of the state tag,
//! the [`SessionId`] binds every message to one transaction — a
//! monotonically increasing per-origin sequence number, so stale
//! messages from completed sessions are rejected even when they happen
//! to carry a matching state name.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProtocolError;

use super::messages::Payload;

/// Address of a node, as known to the external transport.
///
/// The core treats addresses as opaque routable names; the in-memory
/// topology driver resolves them against its registry, a TCP transport
/// would resolve them to sockets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAddr(String);

impl NodeAddr {
    /// Wrap a transport-level name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The underlying name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of one in-flight transaction.
///
/// `seq` comes from the initiating node's monotone counter, drawn at
/// `begin`. A node that has completed (or aborted) session `(origin, n)`
/// rejects any later setup from `origin` with `seq <= n`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId {
    /// Address of the node that initiated the transaction.
    pub origin: NodeAddr,
    /// Monotone per-origin sequence number.
    pub seq: u64,
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.origin, self.seq)
    }
}

/// The protocol states a message can expect its receiver to be in.
///
/// An idle node advertises `WaitSetup` — from the outside, "idle" and
/// "ready for a setup message" are the same thing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateTag {
    /// Idle; the first setup message of a session is admissible.
    WaitSetup,
    /// Lock recipient awaiting the opening amount and sender key.
    LockRecipient2,
    /// Lock sender awaiting the recipient's key and nonce commitment.
    LockSender3,
    /// Lock recipient awaiting the sender's nonce and proof.
    LockRecipient4,
    /// Lock sender awaiting the recipient's share and commitment opening.
    LockSender5,
    /// Lock recipient awaiting the combined share.
    LockRecipient6,
    /// Lock sender holding a finished lock, awaiting the release value.
    WaitRelease,
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateTag::WaitSetup => "WAIT_SETUP",
            StateTag::LockRecipient2 => "LOCK_RECIPIENT_2",
            StateTag::LockSender3 => "LOCK_SENDER_3",
            StateTag::LockRecipient4 => "LOCK_RECIPIENT_4",
            StateTag::LockSender5 => "LOCK_SENDER_5",
            StateTag::LockRecipient6 => "LOCK_RECIPIENT_6",
            StateTag::WaitRelease => "WAIT_RELEASE",
        };
        f.write_str(name)
    }
}

/// One protocol message as it crosses the channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The transaction this message belongs to.
    pub session: SessionId,
    /// State the sender expects the receiver to be in.
    pub expected: StateTag,
    /// The actual protocol payload.
    pub payload: Payload,
}

impl Envelope {
    /// Encode for the external byte channel.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(self).map_err(|e| ProtocolError::Codec(e.to_string()))
    }

    /// Decode from the external byte channel.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        bincode::deserialize(bytes).map_err(|e| ProtocolError::Codec(e.to_string()))
    }
}

/// An envelope plus where the transport should deliver it.
///
/// Routing is a transport concern, so the destination rides outside the
/// wire record rather than inside it.
#[derive(Clone, Debug)]
pub struct Outbound {
    /// Destination address.
    pub to: NodeAddr,
    /// The wire record to deliver.
    pub envelope: Envelope,
}
