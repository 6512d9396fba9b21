//! The per-node protocol engine.
//!
//! A [`Node`] is one participant: a static identity keypair, the shared
//! group parameters, and at most one in-flight [`SessionState`]. It
//! consumes inbound envelopes and produces outbound ones; it never
//! touches a transport. The topology driver (or a test harness, or a
//! real network layer) moves the envelopes.
//!
//! ## Admission and synchronization
//!
//! - [`Node::begin_transaction`] on a busy node fails with
//!   [`ProtocolError::AlreadyBusy`] and leaves the in-flight session
//!   untouched — the only recoverable error in the engine.
//! - Every inbound envelope must carry the active session's id and the
//!   expected-state tag matching the node's current state. Wrong session
//!   ids and stale setups are rejected without touching the session;
//!   a wrong state tag is fail-stop.
//! - Verification failures (proof, commitment, share) are fail-stop:
//!   the session is logged and destroyed, the node returns to idle, and
//!   the typed error propagates to the caller. No retries, no partial
//!   rollback — a single falsified check voids the chain's atomicity.

use std::collections::HashMap;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;

use crate::config;
use crate::crypto::group::{abbrev, abbrev_scalar};
use crate::crypto::{commitment, nizk, schnorr};
use crate::crypto::{GroupParams, LockDescriptor, NodeKeypair, ReleaseKey};
use crate::error::ProtocolError;
use crate::wire::messages::{
    LockCommit, LockDone, LockNonce, LockOpen, LockShare, Payload, Release, SetupHop,
};
use crate::wire::{Envelope, NodeAddr, Outbound, SessionId, StateTag};

use super::state::{Phase, PendingLock, RecipientNonce, SenderNonce, SessionState};

/// What one protocol step produced, beyond mutating the node.
///
/// `outbound` is everything the transport must now deliver, in order.
/// The two observation fields surface the contract outputs the driver
/// reports: a lock acceptance with its amount, and the release-time
/// `VALID KEY` boolean.
#[derive(Debug, Default)]
pub struct Step {
    /// Messages to deliver next, in order.
    pub outbound: Vec<Outbound>,
    /// Set when this step accepted a lock from the left neighbor;
    /// carries the locked amount.
    pub lock_established: Option<u64>,
    /// Set when this step validated a propagated release key against
    /// this node's own right lock.
    pub key_valid: Option<bool>,
}

impl Step {
    fn send(outbound: Vec<Outbound>) -> Self {
        Step {
            outbound,
            ..Step::default()
        }
    }
}

/// One protocol participant.
pub struct Node {
    params: GroupParams,
    keypair: NodeKeypair,
    addr: NodeAddr,
    session: Option<SessionState>,
    /// Monotone counter feeding [`SessionId::seq`] for sessions this
    /// node initiates.
    next_seq: u64,
    /// Highest completed (or aborted) sequence number per origin, for
    /// stale-session rejection.
    completed: HashMap<NodeAddr, u64>,
}

impl Node {
    /// Construct a node with a fresh identity under shared parameters.
    pub fn new(params: GroupParams, addr: NodeAddr) -> Self {
        let keypair = NodeKeypair::generate(&params);
        tracing::debug!(node = %addr, pk = %abbrev(keypair.public()), "node constructed");
        Self {
            params,
            keypair,
            addr,
            session: None,
            next_seq: 0,
            completed: HashMap::new(),
        }
    }

    /// This node's transport address.
    pub fn addr(&self) -> &NodeAddr {
        &self.addr
    }

    /// This node's public identity element.
    pub fn public_key(&self) -> &RistrettoPoint {
        self.keypair.public()
    }

    /// The shared group parameters this node was constructed with.
    pub fn params(&self) -> &GroupParams {
        &self.params
    }

    /// Whether the node has no session in flight.
    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    /// Identifier of the in-flight session, if any.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    /// The expected-state tag inbound messages must currently carry.
    /// An idle node answers to `WAIT_SETUP`.
    pub fn state_tag(&self) -> StateTag {
        match &self.session {
            None => StateTag::WaitSetup,
            Some(sess) => sess.phase.tag(),
        }
    }

    /// Initiate a transaction over `path` (the ordered hops after this
    /// node; the last entry is the final recipient).
    ///
    /// Runs the whole Setup phase synchronously — one setup envelope per
    /// hop — and opens the first lock toward `path[0]`. The returned
    /// step's envelopes must be delivered in order.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::AlreadyBusy`] if a session is in flight (the
    /// session is left untouched), [`ProtocolError::PathTooShort`] if
    /// the path has fewer than [`config::MIN_PATH_HOPS`] hops.
    pub fn begin_transaction(
        &mut self,
        amount: u64,
        path: &[NodeAddr],
    ) -> Result<Step, ProtocolError> {
        if self.session.is_some() {
            return Err(ProtocolError::AlreadyBusy);
        }
        if path.len() < config::MIN_PATH_HOPS {
            return Err(ProtocolError::PathTooShort {
                min: config::MIN_PATH_HOPS,
                got: path.len(),
            });
        }

        self.next_seq += 1;
        let id = SessionId {
            origin: self.addr.clone(),
            seq: self.next_seq,
        };
        tracing::info!(
            node = %self.addr,
            session = %id,
            amount,
            hops = path.len(),
            "initiating transaction"
        );

        // Head of the blinding chain: the initiator's own scalar.
        let y0 = self.params.random_scalar();
        let y0_elem = self.params.exp(&y0);

        let mut outbound = Vec::with_capacity(path.len() + 1);
        let mut total = y0;
        let mut chain = y0_elem;
        let last = path.len() - 1;

        for (i, hop) in path[..last].iter().enumerate() {
            let y_i = self.params.random_scalar();
            total += y_i;
            let prev = chain;
            chain = prev + self.params.exp(&y_i);

            // Each hop gets a proof that the running total is well
            // formed; it needs that later to trust the release value.
            let (statement, proof) = nizk::prove(&self.params, &total);
            let left = if i == 0 {
                self.addr.clone()
            } else {
                path[i - 1].clone()
            };
            outbound.push(Outbound {
                to: hop.clone(),
                envelope: Envelope {
                    session: id.clone(),
                    expected: StateTag::WaitSetup,
                    payload: Payload::Setup(SetupHop {
                        y_prev: prev,
                        y: y_i,
                        left,
                        right: Some(path[i + 1].clone()),
                        key: None,
                        statement,
                        proof,
                    }),
                },
            });
        }

        // The final hop is the only one handed the true accumulated
        // total; its own blinding scalar is zero.
        let (statement, proof) = nizk::prove(&self.params, &total);
        outbound.push(Outbound {
            to: path[last].clone(),
            envelope: Envelope {
                session: id.clone(),
                expected: StateTag::WaitSetup,
                payload: Payload::Setup(SetupHop {
                    y_prev: chain,
                    y: Scalar::ZERO,
                    left: path[last - 1].clone(),
                    right: None,
                    key: Some(total),
                    statement,
                    proof,
                }),
            },
        });

        // Straight into Lock as sender for the first hop.
        outbound.push(self.lock_open_msg(&id, &path[0], amount));
        self.session = Some(SessionState {
            id,
            phase: Phase::LockSender3,
            left: None,
            right: Some(path[0].clone()),
            y_prev: None,
            cum: y0_elem,
            y: y0,
            key_w0: None,
            key_value: None,
            pk_left: None,
            pk_right: None,
            lock_left: None,
            lock_right: None,
            share_left: None,
            share_right: None,
        });

        Ok(Step::send(outbound))
    }

    /// Process one inbound envelope and advance the state machine.
    ///
    /// Admission order matters: message-level rejections (wrong session,
    /// stale setup) come first and leave any in-flight session intact;
    /// only then is the expected-state tag compared, and a mismatch is
    /// fail-stop for the session.
    pub fn receive(&mut self, env: Envelope) -> Result<Step, ProtocolError> {
        let Envelope {
            session: sid,
            expected,
            payload,
        } = env;

        // A stray or replayed envelope must not be able to take down a
        // healthy session, so these checks reject the message only.
        if let Some(sess) = &self.session {
            if sid != sess.id {
                let err = ProtocolError::SessionMismatch {
                    active: sess.id.clone(),
                    got: sid,
                };
                tracing::warn!(node = %self.addr, %err, "rejecting envelope");
                return Err(err);
            }
        } else if let Some(&last) = self.completed.get(&sid.origin) {
            if sid.seq <= last {
                let err = ProtocolError::StaleSession(sid);
                tracing::warn!(node = %self.addr, %err, "rejecting envelope");
                return Err(err);
            }
        }

        let actual = self.state_tag();
        if expected != actual {
            let err = ProtocolError::StateMismatch { expected, actual };
            tracing::error!(
                node = %self.addr,
                session = %sid,
                %err,
                "fail-stop: tearing down session"
            );
            if let Some(sess) = self.session.take() {
                self.completed.insert(sess.id.origin.clone(), sess.id.seq);
            }
            return Err(err);
        }

        let had_session = self.session.is_some();
        let result = match self.session.take() {
            None => match payload {
                Payload::Setup(m) => self.on_setup(sid.clone(), m),
                other => Err(ProtocolError::UnexpectedPayload {
                    payload: other.kind(),
                    state: actual,
                }),
            },
            Some(sess) => self.advance(sess, payload),
        };

        match result {
            Ok((next, step)) => {
                let finished = next.is_none();
                self.session = next;
                if finished {
                    self.completed.insert(sid.origin.clone(), sid.seq);
                    tracing::debug!(node = %self.addr, session = %sid, "session complete, node idle");
                }
                Ok(step)
            }
            Err(err) => {
                tracing::error!(
                    node = %self.addr,
                    session = %sid,
                    %err,
                    "fail-stop: tearing down session"
                );
                if had_session {
                    self.completed.insert(sid.origin.clone(), sid.seq);
                }
                Err(err)
            }
        }
    }

    /// First setup receipt: verify the blinding-chain proof, extend the
    /// chain, and take the lock-recipient position toward the left.
    fn on_setup(
        &mut self,
        id: SessionId,
        m: SetupHop,
    ) -> Result<(Option<SessionState>, Step), ProtocolError> {
        if !nizk::verify(&self.params, &m.statement, &m.proof) {
            return Err(ProtocolError::ProofInvalid("setup blinding-chain proof"));
        }

        let cum = m.y_prev + self.params.exp(&m.y);
        tracing::debug!(
            node = %self.addr,
            session = %id,
            y_prev = %abbrev(&m.y_prev),
            cum = %abbrev(&cum),
            y = %abbrev_scalar(&m.y),
            has_key = m.key.is_some(),
            "setup accepted, awaiting lock from the left"
        );

        let sess = SessionState {
            id,
            phase: Phase::LockRecipient2,
            left: Some(m.left),
            right: m.right,
            y_prev: Some(m.y_prev),
            cum,
            y: m.y,
            key_w0: None,
            key_value: m.key,
            pk_left: None,
            pk_right: None,
            lock_left: None,
            lock_right: None,
            share_left: None,
            share_right: None,
        };
        Ok((Some(sess), Step::default()))
    }

    /// Dispatch one payload against the current phase. Consumes the
    /// session and hands it back unless the session just finished.
    fn advance(
        &mut self,
        mut sess: SessionState,
        payload: Payload,
    ) -> Result<(Option<SessionState>, Step), ProtocolError> {
        let phase = sess.phase;
        match (phase, payload) {
            // Lock step b: blend keys, commit to a fresh nonce before
            // the sender reveals its own.
            (Phase::LockRecipient2, Payload::LockOpen(m)) => {
                let pk_left = self.keypair.public() + m.pk;
                sess.pk_left = Some(pk_left);

                let r = self.params.random_scalar();
                let (big_r, proof) = nizk::prove(&self.params, &r);
                let (opening, com) =
                    commitment::commit(&self.params, &commitment::nonce_bytes(&big_r, &proof));

                let left = sess
                    .left
                    .clone()
                    .ok_or(ProtocolError::Invariant("lock recipient without left"))?;
                let out = Outbound {
                    to: left,
                    envelope: Envelope {
                        session: sess.id.clone(),
                        expected: StateTag::LockSender3,
                        payload: Payload::LockCommit(LockCommit {
                            pk: *self.keypair.public(),
                            commitment: com,
                        }),
                    },
                };
                sess.phase = Phase::LockRecipient4(RecipientNonce {
                    r,
                    big_r,
                    amount: m.amount,
                    proof,
                    opening,
                });
                Ok((Some(sess), Step::send(vec![out])))
            }

            // Lock step c: blend keys on the sender side and reveal the
            // sender nonce with its knowledge proof.
            (Phase::LockSender3, Payload::LockCommit(m)) => {
                sess.pk_right = Some(self.keypair.public() + m.pk);

                let r = self.params.random_scalar();
                let (big_r, proof) = nizk::prove(&self.params, &r);

                let right = sess
                    .right
                    .clone()
                    .ok_or(ProtocolError::Invariant("lock sender without right"))?;
                let out = Outbound {
                    to: right,
                    envelope: Envelope {
                        session: sess.id.clone(),
                        expected: StateTag::LockRecipient4,
                        payload: Payload::LockNonce(LockNonce {
                            nonce: big_r,
                            proof,
                        }),
                    },
                };
                sess.phase = Phase::LockSender5(SenderNonce {
                    r,
                    big_r,
                    commitment: m.commitment,
                });
                Ok((Some(sess), Step::send(vec![out])))
            }

            // Lock step d: fold the sender nonce and the predecessor
            // blinding into the rfactor, fix the challenge, and hand
            // over this side's partial share plus the commitment opening.
            (Phase::LockRecipient4(st), Payload::LockNonce(m)) => {
                if !nizk::verify(&self.params, &m.nonce, &m.proof) {
                    return Err(ProtocolError::ProofInvalid("lock nonce proof"));
                }
                let y_prev = sess
                    .y_prev
                    .ok_or(ProtocolError::Invariant("lock recipient without y_prev"))?;
                let pk_left = sess
                    .pk_left
                    .ok_or(ProtocolError::Invariant("lock recipient without pk_left"))?;

                let rfactor = m.nonce + st.big_r + y_prev;
                let message = lock_message(st.amount, &self.addr);
                let e = schnorr::challenge(&self.params, &pk_left, &rfactor, &message);
                let share = schnorr::partial_share(&st.r, &e, self.keypair.secret());

                let left = sess
                    .left
                    .clone()
                    .ok_or(ProtocolError::Invariant("lock recipient without left"))?;
                let out = Outbound {
                    to: left,
                    envelope: Envelope {
                        session: sess.id.clone(),
                        expected: StateTag::LockSender5,
                        payload: Payload::LockShare(LockShare {
                            amount: st.amount,
                            nonce: st.big_r,
                            share,
                            message,
                            proof: st.proof,
                            opening: st.opening,
                        }),
                    },
                };
                sess.phase = Phase::LockRecipient6(PendingLock {
                    rfactor,
                    big_r: st.big_r,
                    big_r_prev: m.nonce,
                    challenge: e,
                });
                Ok((Some(sess), Step::send(vec![out])))
            }

            // Lock step e: the wormhole-resistance step. The recipient
            // committed to its nonce before learning ours, so the
            // opening must reproduce the commitment exactly; then check
            // the partial share and form the combined one.
            (Phase::LockSender5(st), Payload::LockShare(m)) => {
                if !nizk::verify(&self.params, &m.nonce, &m.proof) {
                    return Err(ProtocolError::ProofInvalid("lock share nonce proof"));
                }
                if !commitment::commit_verify(
                    &self.params,
                    &st.commitment,
                    &m.opening,
                    &commitment::nonce_bytes(&m.nonce, &m.proof),
                ) {
                    return Err(ProtocolError::CommitmentInvalid);
                }

                let pk_right = sess
                    .pk_right
                    .ok_or(ProtocolError::Invariant("lock sender without pk_right"))?;
                let rfactor = st.big_r + m.nonce + sess.cum;
                let e = schnorr::challenge(&self.params, &pk_right, &rfactor, &m.message);

                // The counterparty key is the blinded pair minus our own
                // contribution.
                let counter_pk = pk_right - self.keypair.public();
                if !schnorr::verify_share(&self.params, &m.share, &m.nonce, &counter_pk, &e) {
                    return Err(ProtocolError::SignatureInvalid("recipient partial share"));
                }

                let combined = m.share + schnorr::partial_share(&st.r, &e, self.keypair.secret());
                sess.lock_right = Some(LockDescriptor {
                    message: m.message.clone(),
                    pk: pk_right,
                });
                sess.share_right = Some(combined);

                let right = sess
                    .right
                    .clone()
                    .ok_or(ProtocolError::Invariant("lock sender without right"))?;
                tracing::info!(
                    node = %self.addr,
                    right = %right,
                    message = %m.message,
                    "lock extended rightward, awaiting release"
                );
                let out = Outbound {
                    to: right,
                    envelope: Envelope {
                        session: sess.id.clone(),
                        expected: StateTag::LockRecipient6,
                        payload: Payload::LockDone(LockDone {
                            amount: m.amount,
                            message: m.message,
                            share: combined,
                        }),
                    },
                };
                sess.phase = Phase::WaitRelease;
                Ok((Some(sess), Step::send(vec![out])))
            }

            // Lock step f: record the finished lock, check the combined
            // share, then either extend the chain (relay) or flip to
            // release (final recipient).
            (Phase::LockRecipient6(st), Payload::LockDone(m)) => {
                let pk_left = sess
                    .pk_left
                    .ok_or(ProtocolError::Invariant("lock recipient without pk_left"))?;
                sess.lock_left = Some(LockDescriptor {
                    message: m.message.clone(),
                    pk: pk_left,
                });
                sess.share_left = Some((st.rfactor, m.share));

                let nonce_sum = st.big_r_prev + st.big_r;
                if !schnorr::verify_share(
                    &self.params,
                    &m.share,
                    &nonce_sum,
                    &pk_left,
                    &st.challenge,
                ) {
                    return Err(ProtocolError::SignatureInvalid("combined lock share"));
                }

                tracing::info!(
                    node = %self.addr,
                    left = ?sess.left,
                    message = %m.message,
                    rfactor = %abbrev(&st.rfactor),
                    share = %abbrev_scalar(&m.share),
                    "lock established with left neighbor"
                );

                let mut step = Step {
                    lock_established: Some(m.amount),
                    ..Step::default()
                };
                match sess.key_value {
                    // Relay: extend the lock chain rightward, keeping
                    // the per-hop fee.
                    None => {
                        let right = sess
                            .right
                            .clone()
                            .ok_or(ProtocolError::Invariant("relay without right neighbor"))?;
                        let forwarded = m.amount.saturating_sub(config::HOP_FEE);
                        step.outbound
                            .push(self.lock_open_msg(&sess.id, &right, forwarded));
                        sess.phase = Phase::LockSender3;
                        Ok((Some(sess), step))
                    }
                    // Final recipient: the key slot already holds the
                    // true total, so release starts here.
                    Some(value) => {
                        sess.phase = Phase::WaitRelease;
                        self.start_release(sess, value, step)
                    }
                }
            }

            // Release propagation: validate our own right lock's key,
            // report the boolean, and keep the wave moving left.
            (Phase::WaitRelease, Payload::Release(m)) => {
                sess.key_w0 = Some(m.w0);
                sess.key_value = Some(m.w);

                let lock = sess
                    .lock_right
                    .clone()
                    .ok_or(ProtocolError::Invariant("release without right lock"))?;
                let valid =
                    schnorr::verify_release(&self.params, &lock, &ReleaseKey { w0: m.w0, w: m.w });
                tracing::info!(node = %self.addr, session = %sess.id, valid, "VALID KEY");

                let step = Step {
                    key_valid: Some(valid),
                    ..Step::default()
                };
                sess.phase = Phase::WaitRelease;
                if sess.left.is_some() {
                    self.start_release(sess, m.w, step)
                } else {
                    // The initiator has no left neighbor; the wave ends.
                    Ok((None, step))
                }
            }

            (phase, payload) => Err(ProtocolError::UnexpectedPayload {
                payload: payload.kind(),
                state: phase.tag(),
            }),
        }
    }

    /// Derive this node's release value from its left lock and send it
    /// left. The session is finished either way — release is the last
    /// thing a node does.
    fn start_release(
        &self,
        sess: SessionState,
        value: Scalar,
        mut step: Step,
    ) -> Result<(Option<SessionState>, Step), ProtocolError> {
        let (w0, w1) = sess
            .share_left
            .ok_or(ProtocolError::Invariant("release without left lock share"))?;
        let sr = sess.share_right.unwrap_or(Scalar::ZERO);

        // Rewrite the unlocking value for the left lock: strip our own
        // right share and blinding scalar, add our left share.
        let w = w1 + value - (sr + sess.y);
        tracing::info!(
            node = %self.addr,
            session = %sess.id,
            w0 = %abbrev(&w0),
            w = %abbrev_scalar(&w),
            "release key derived"
        );

        if let Some(left) = sess.left {
            step.outbound.push(Outbound {
                to: left,
                envelope: Envelope {
                    session: sess.id,
                    expected: StateTag::WaitRelease,
                    payload: Payload::Release(Release { w0, w }),
                },
            });
        }
        Ok((None, step))
    }

    /// The lock-opening message a sender emits when it (re)enters the
    /// lock phase toward its right neighbor.
    fn lock_open_msg(&self, id: &SessionId, right: &NodeAddr, amount: u64) -> Outbound {
        tracing::debug!(
            node = %self.addr,
            right = %right,
            amount,
            "opening lock toward right neighbor"
        );
        Outbound {
            to: right.clone(),
            envelope: Envelope {
                session: id.clone(),
                expected: StateTag::LockRecipient2,
                payload: Payload::LockOpen(LockOpen {
                    amount,
                    pk: *self.keypair.public(),
                }),
            },
        }
    }
}

/// The statement a lock signs: binds the amount and the lock recipient.
fn lock_message(amount: u64, recipient: &NodeAddr) -> String {
    format!("I'll pay {amount} to {recipient}")
}
