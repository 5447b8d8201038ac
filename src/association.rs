//! Per-peer association state machine (§4.7): one instance per configured
//! peer, draining a [`ReliableTransport`]'s inbound request channel and
//! dispatching by message type to the heartbeat/association/session
//! handlers below, backed by a [`SessionStore`].

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::accessor::Accessor;
use crate::error::PfcpResult;
use crate::ie::primitives::{Cause, Fseid, NodeId, RecoveryTimeStamp, UserPlaneIpResourceInformation};
use crate::ie::{schema, Ie, IeType};
use crate::merge;
use crate::message::{Message, MsgType};
use crate::session::SessionStore;
use crate::transport::{InboundRequest, ReliableTransport};
use crate::validator;

/// The boundary to the application's session lifecycle decisions (§6
/// "Application callback contract"). `Err(cause)` rejects the operation
/// with that cause code.
pub trait SessionCallbacks: Send + Sync {
    /// Called for both fresh establishments and the post-merge path of a
    /// successful modification.
    fn on_session_establishment(&self, local_seid: u64, ies: &[Ie]) -> Result<(), Cause>;
    /// Called at most once per session, on deletion.
    fn on_session_deletion(&self, local_seid: u64) -> Result<(), Cause>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssocState {
    Initial,
    Associated,
    Released,
}

#[derive(Default)]
struct PeerInfo {
    node_id: Option<String>,
    recovery_timestamp: Option<RecoveryTimeStamp>,
}

static SEID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generates a SEID unique enough for random-mode session keying. Not
/// cryptographically random — the session store only needs collision
/// avoidance, not unpredictability (§1 Non-goals: no cryptographic
/// authentication in scope).
fn random_u64() -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let counter = SEID_COUNTER.fetch_add(1, Ordering::Relaxed);
    nanos.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(counter)
}

/// One instance per configured peer (§4.7). Holds the peer's session store
/// and, once [`Association::run`] is called, a consumer thread draining
/// its transport's inbound request channel.
pub struct Association {
    transport: Arc<ReliableTransport>,
    local_node_id: NodeId,
    local_signalling_ipv4: Ipv4Addr,
    up_resource_ipv4: Option<Ipv4Addr>,
    /// When true, a session's local SEID equals the peer's F-SEID; when
    /// false, a fresh random SEID is assigned per establishment.
    compatibility_mode: bool,
    state: Mutex<AssocState>,
    peer: Mutex<PeerInfo>,
    sessions: SessionStore,
    callbacks: Arc<dyn SessionCallbacks>,
}

impl Association {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: Arc<ReliableTransport>,
        local_node_id: NodeId,
        local_signalling_ipv4: Ipv4Addr,
        up_resource_ipv4: Option<Ipv4Addr>,
        compatibility_mode: bool,
        callbacks: Arc<dyn SessionCallbacks>,
    ) -> Arc<Self> {
        Arc::new(Association {
            transport,
            local_node_id,
            local_signalling_ipv4,
            up_resource_ipv4,
            compatibility_mode,
            state: Mutex::new(AssocState::Initial),
            peer: Mutex::new(PeerInfo::default()),
            sessions: SessionStore::new(),
            callbacks,
        })
    }

    pub fn state(&self) -> bool {
        *self.state.lock().unwrap() == AssocState::Associated
    }

    /// Spawns the consumer thread draining `inbound` until the channel
    /// closes (peer/endpoint torn down).
    pub fn run(self: &Arc<Self>, inbound: Receiver<InboundRequest>) {
        let assoc = Arc::clone(self);
        thread::spawn(move || {
            while let Ok(req) = inbound.recv() {
                assoc.dispatch(req);
            }
        });
    }

    fn dispatch(&self, req: InboundRequest) {
        let result = match req.message.msg_type() {
            MsgType::AssociationSetupRequest => self.handle_association_setup(&req.message),
            MsgType::AssociationReleaseRequest => self.handle_association_release(&req.message),
            MsgType::HeartbeatRequest => self.handle_heartbeat(&req.message),
            MsgType::SessionEstablishmentRequest => self.handle_session_establishment(&req.message),
            MsgType::SessionModificationRequest => self.handle_session_modification(&req.message),
            MsgType::SessionDeletionRequest => self.handle_session_deletion(&req.message),
            other => {
                eprintln!("[assoc] no handler for inbound {:?}, dropping", other);
                return;
            }
        };

        match result {
            Ok(response) => {
                if let Err(e) = self.transport.send_response(req.sequence, response) {
                    eprintln!("[assoc] failed to send response: {}", e);
                }
            }
            Err(e) => eprintln!("[assoc] handler error: {}", e),
        }
    }

    fn handle_association_setup(&self, msg: &Message) -> PfcpResult<Message> {
        let node_id_str = msg
            .first_ie(IeType::NodeId)
            .and_then(Ie::leaf_bytes)
            .and_then(|b| NodeId::unmarshal(b).ok())
            .map(|id| id.as_string());
        let recovery = msg
            .first_ie(IeType::RecoveryTimeStamp)
            .and_then(Ie::leaf_bytes)
            .and_then(|b| RecoveryTimeStamp::unmarshal(b).ok());

        {
            let mut peer = self.peer.lock().unwrap();
            peer.node_id = node_id_str;
            peer.recovery_timestamp = recovery;
        }
        *self.state.lock().unwrap() = AssocState::Associated;

        let mut ies = vec![
            Ie::new(IeType::NodeId, self.local_node_id.marshal()),
            Ie::new(IeType::Cause, Cause::Accepted.marshal().to_vec()),
            Ie::new(IeType::RecoveryTimeStamp, RecoveryTimeStamp::now().marshal().to_vec()),
        ];
        if let Some(ipv4) = self.up_resource_ipv4 {
            ies.push(Ie::new(
                IeType::UserPlaneIpResourceInformation,
                UserPlaneIpResourceInformation::new(ipv4).marshal(),
            ));
        }
        Ok(Message::new(MsgType::AssociationSetupResponse, 0, ies))
    }

    fn handle_association_release(&self, _msg: &Message) -> PfcpResult<Message> {
        *self.state.lock().unwrap() = AssocState::Released;
        Ok(Message::new(MsgType::AssociationReleaseResponse, 0, vec![]))
    }

    fn handle_heartbeat(&self, msg: &Message) -> PfcpResult<Message> {
        if let Some(ts) = msg
            .first_ie(IeType::RecoveryTimeStamp)
            .and_then(Ie::leaf_bytes)
            .and_then(|b| RecoveryTimeStamp::unmarshal(b).ok())
        {
            let mut peer = self.peer.lock().unwrap();
            if let Some(prev) = peer.recovery_timestamp {
                if prev != ts {
                    eprintln!("[assoc] peer recovery timestamp changed ({:?} -> {:?}); peer likely restarted", prev, ts);
                }
            }
            peer.recovery_timestamp = Some(ts);
        }
        Ok(Message::new(
            MsgType::HeartbeatResponse,
            0,
            vec![Ie::new(IeType::RecoveryTimeStamp, RecoveryTimeStamp::now().marshal().to_vec())],
        ))
    }

    fn handle_session_establishment(&self, msg: &Message) -> PfcpResult<Message> {
        let mut acc = Accessor::for_message(msg);
        let peer_fseid = acc.as_fseid();
        if acc.finish().is_err() {
            return Ok(Message::new(
                MsgType::SessionEstablishmentResponse,
                0,
                vec![Ie::new(IeType::Cause, Cause::MandatoryIeMissing.marshal().to_vec())],
            ));
        }
        let peer_fseid = peer_fseid.expect("finish() returned Ok, so as_fseid succeeded");

        let mut established = msg.clone();
        let errors = validator::validate_message(&mut established);
        if !errors.is_empty() {
            eprintln!("[assoc] session establishment schema violations: {:?}", errors);
            return Ok(Message::new_with_seid(
                MsgType::SessionEstablishmentResponse,
                peer_fseid.seid,
                0,
                vec![Ie::new(IeType::Cause, Cause::Unspecified.marshal().to_vec())],
            ));
        }

        let local_seid = if self.compatibility_mode {
            peer_fseid.seid
        } else {
            self.fresh_random_seid()
        };
        self.sessions.insert(local_seid, peer_fseid.seid, established.ies.clone());

        match self.callbacks.on_session_establishment(local_seid, &established.ies) {
            Ok(()) => {
                let response_fseid = Fseid::new(local_seid, self.local_signalling_ipv4);
                Ok(Message::new_with_seid(
                    MsgType::SessionEstablishmentResponse,
                    peer_fseid.seid,
                    0,
                    vec![
                        Ie::new(IeType::NodeId, self.local_node_id.marshal()),
                        Ie::new(IeType::Cause, Cause::Accepted.marshal().to_vec()),
                        Ie::new(IeType::Fseid, response_fseid.marshal()),
                    ],
                ))
            }
            Err(cause) => {
                self.sessions.remove(local_seid);
                Ok(Message::new_with_seid(
                    MsgType::SessionEstablishmentResponse,
                    peer_fseid.seid,
                    0,
                    vec![
                        Ie::new(IeType::NodeId, self.local_node_id.marshal()),
                        Ie::new(IeType::Cause, cause.marshal().to_vec()),
                    ],
                ))
            }
        }
    }

    fn handle_session_modification(&self, msg: &Message) -> PfcpResult<Message> {
        let Some(local_seid) = msg.seid() else {
            return Ok(Message::new(
                MsgType::SessionModificationResponse,
                0,
                vec![Ie::new(IeType::Cause, Cause::Unspecified.marshal().to_vec())],
            ));
        };
        let Some(mut target) = self.sessions.get_ies(local_seid) else {
            return Ok(Message::new_with_seid(
                MsgType::SessionModificationResponse,
                local_seid,
                0,
                vec![Ie::new(IeType::Cause, Cause::SessionContextNotFound.marshal().to_vec())],
            ));
        };
        let peer_seid = self.sessions.peer_seid(local_seid).unwrap_or(local_seid);

        let attrs = schema::message_attrs(MsgType::SessionModificationRequest);
        let merge_errors = merge::apply(&mut target, &msg.ies, attrs);
        if !merge_errors.is_empty() {
            eprintln!("[assoc] merge failed for session {:#x}: {:?}", local_seid, merge_errors);
            self.sessions.remove(local_seid);
            return Ok(Message::new_with_seid(
                MsgType::SessionModificationResponse,
                peer_seid,
                0,
                vec![Ie::new(IeType::Cause, Cause::Unspecified.marshal().to_vec())],
            ));
        }
        merge::compact(&mut target);

        match self.callbacks.on_session_establishment(local_seid, &target) {
            Ok(()) => {
                // §4.7.A: keep the session reference intact, replaced in place.
                self.sessions.replace_ies(local_seid, target);
                Ok(Message::new_with_seid(
                    MsgType::SessionModificationResponse,
                    peer_seid,
                    0,
                    vec![Ie::new(IeType::Cause, Cause::Accepted.marshal().to_vec())],
                ))
            }
            Err(cause) => Ok(Message::new_with_seid(
                MsgType::SessionModificationResponse,
                peer_seid,
                0,
                vec![Ie::new(IeType::Cause, cause.marshal().to_vec())],
            )),
        }
    }

    fn handle_session_deletion(&self, msg: &Message) -> PfcpResult<Message> {
        let Some(local_seid) = msg.seid() else {
            return Ok(Message::new(
                MsgType::SessionDeletionResponse,
                0,
                vec![Ie::new(IeType::Cause, Cause::Unspecified.marshal().to_vec())],
            ));
        };
        let peer_seid = self.sessions.peer_seid(local_seid).unwrap_or(local_seid);
        self.sessions.remove(local_seid);

        let cause = match self.callbacks.on_session_deletion(local_seid) {
            Ok(()) => Cause::Accepted,
            Err(cause) => cause,
        };
        Ok(Message::new_with_seid(
            MsgType::SessionDeletionResponse,
            peer_seid,
            0,
            vec![Ie::new(IeType::Cause, cause.marshal().to_vec())],
        ))
    }

    fn fresh_random_seid(&self) -> u64 {
        loop {
            let candidate = random_u64();
            if candidate != 0 && !self.sessions.contains(candidate) {
                return candidate;
            }
        }
    }
}
