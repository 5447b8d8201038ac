//! SMF client library (§4.8): the initiator side of the protocol — builds an
//! association with a UPF peer, then creates/modifies/deletes sessions on
//! it. Every operation here is blocking, built atop [`ReliableTransport`].

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::{PfcpError, PfcpResult};
use crate::ie::primitives::{Cause, Fseid, NodeId, RecoveryTimeStamp};
use crate::ie::{Ie, IeType};
use crate::message::{Message, MsgType};
use crate::transport::{Endpoint, ReliableTransport};

static LOCAL_SEID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_local_seid() -> u64 {
    LOCAL_SEID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

fn cause_of(msg: &Message) -> PfcpResult<Cause> {
    let bytes = msg
        .first_ie(IeType::Cause)
        .and_then(Ie::leaf_bytes)
        .ok_or(PfcpError::MissingCauseCode)?;
    Cause::unmarshal(bytes)
}

fn reject_unless_accepted(msg: &Message) -> PfcpResult<()> {
    match cause_of(msg)? {
        Cause::Accepted => Ok(()),
        other => Err(PfcpError::PeerReject { cause: other.code() }),
    }
}

/// An SMF acting as initiator against one or more UPF peers, sharing a
/// single bound UDP endpoint (§4.8 `clone`).
pub struct Smf {
    endpoint: Endpoint,
    local_addr: SocketAddr,
    node_id: NodeId,
}

impl Smf {
    /// Binds `local_addr` and returns an SMF ready to associate with peers.
    pub fn bind(local_addr: SocketAddr, node_id: NodeId) -> PfcpResult<(Self, std::sync::mpsc::Receiver<crate::transport::Event>)> {
        let (endpoint, events) = Endpoint::bind(local_addr)?;
        let bound_addr = endpoint.local_addr()?;
        Ok((Smf { endpoint, local_addr: bound_addr, node_id }, events))
    }

    /// Creates an association with `peer_addr`: registers the peer, sends
    /// an Association Setup Request, blocks for a successful response, then
    /// launches a heartbeat-responder loop on the resulting transport.
    pub fn create_association(&self, peer_addr: SocketAddr) -> PfcpResult<PeerAssociation> {
        let peer = self.endpoint.register(peer_addr, None);
        let (transport, inbound) = ReliableTransport::new(peer, next_local_seid() as u32);

        let request = Message::new(
            MsgType::AssociationSetupRequest,
            0,
            vec![
                Ie::new(IeType::NodeId, self.node_id.marshal()),
                Ie::new(IeType::RecoveryTimeStamp, RecoveryTimeStamp::now().marshal().to_vec()),
            ],
        );
        let response = transport.send_request(request)?;
        reject_unless_accepted(&response)?;

        // Heartbeat-responder loop: anything that isn't a session op while
        // associated is, in this profile, just the peer's own heartbeats;
        // answer them so the association doesn't get dropped for silence.
        let hb_transport = Arc::clone(&transport);
        thread::spawn(move || {
            while let Ok(req) = inbound.recv() {
                if req.message.msg_type() == MsgType::HeartbeatRequest {
                    let reply = Message::new(
                        MsgType::HeartbeatResponse,
                        0,
                        vec![Ie::new(IeType::RecoveryTimeStamp, RecoveryTimeStamp::now().marshal().to_vec())],
                    );
                    let _ = hb_transport.send_response(req.sequence, reply);
                } else {
                    eprintln!("[smf] unexpected inbound request {:?}, ignoring", req.message.msg_type());
                }
            }
        });

        Ok(PeerAssociation { transport, local_ipv4: local_ipv4(self.local_addr), node_id: self.node_id.clone() })
    }

    /// Reuses this SMF's endpoint to associate with a second peer (§4.8
    /// `clone`).
    pub fn clone_to(&self, peer_addr: SocketAddr) -> PfcpResult<PeerAssociation> {
        self.create_association(peer_addr)
    }
}

fn local_ipv4(addr: SocketAddr) -> Ipv4Addr {
    match addr.ip() {
        std::net::IpAddr::V4(v4) => v4,
        std::net::IpAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
    }
}

/// A live association with one peer, able to create sessions on it.
pub struct PeerAssociation {
    transport: Arc<ReliableTransport>,
    local_ipv4: Ipv4Addr,
    node_id: NodeId,
}

impl PeerAssociation {
    /// Sends a Session Establishment Request carrying `ies` plus local
    /// node-id and F-SEID, awaits the response, and returns a handle to the
    /// resulting session holding both SEIDs.
    pub fn create_session(&self, ies: Vec<Ie>) -> PfcpResult<Session> {
        let local_seid = next_local_seid();
        let mut body = vec![
            Ie::new(IeType::NodeId, self.node_id.marshal()),
            Ie::new(IeType::Fseid, Fseid::new(local_seid, self.local_ipv4).marshal()),
        ];
        body.extend(ies);

        let request = Message::new(MsgType::SessionEstablishmentRequest, 0, body);
        let response = self.transport.send_request(request)?;
        reject_unless_accepted(&response)?;

        let peer_seid = response
            .first_ie(IeType::Fseid)
            .and_then(Ie::leaf_bytes)
            .map(Fseid::unmarshal)
            .transpose()?
            .map(|f| f.seid)
            .unwrap_or(local_seid);

        Ok(Session { transport: Arc::clone(&self.transport), local_seid, peer_seid })
    }
}

/// A session created against a peer, identified by both SEIDs — the local
/// one this end assigned, and the peer's own, which must be the header SEID
/// of every subsequent message sent to it (§9 "Local vs peer SEID").
pub struct Session {
    transport: Arc<ReliableTransport>,
    local_seid: u64,
    peer_seid: u64,
}

impl Session {
    pub fn local_seid(&self) -> u64 {
        self.local_seid
    }

    pub fn peer_seid(&self) -> u64 {
        self.peer_seid
    }

    /// Sends a Session Modification Request with `ies` and blocks for the
    /// response's Cause.
    pub fn modify(&self, ies: Vec<Ie>) -> PfcpResult<()> {
        let request = Message::new_with_seid(MsgType::SessionModificationRequest, self.peer_seid, 0, ies);
        let response = self.transport.send_request(request)?;
        reject_unless_accepted(&response)
    }

    /// Sends a Session Deletion Request and blocks for the response's Cause.
    pub fn delete(&self) -> PfcpResult<()> {
        let request = Message::new_with_seid(MsgType::SessionDeletionRequest, self.peer_seid, 0, vec![]);
        let response = self.transport.send_request(request)?;
        reject_unless_accepted(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn localhost(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    /// A minimal in-thread UPF stand-in: accepts association, accepts one
    /// session establishment, replies Accepted to modify/delete.
    fn spawn_stub_upf(socket: std::net::UdpSocket, local_seid: u64) {
        thread::spawn(move || {
            socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            let mut buf = [0u8; 1500];
            loop {
                let (n, src) = match socket.recv_from(&mut buf) {
                    Ok(v) => v,
                    Err(_) => return,
                };
                let req = match Message::unmarshal(&buf[..n]) {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                let reply = match req.msg_type() {
                    MsgType::AssociationSetupRequest => Message::new(
                        MsgType::AssociationSetupResponse,
                        req.sequence(),
                        vec![
                            Ie::new(IeType::NodeId, NodeId::V4(Ipv4Addr::new(192, 0, 2, 9)).marshal()),
                            Ie::new(IeType::Cause, Cause::Accepted.marshal().to_vec()),
                            Ie::new(IeType::RecoveryTimeStamp, RecoveryTimeStamp::from_unix_secs(1).marshal().to_vec()),
                        ],
                    ),
                    MsgType::SessionEstablishmentRequest => Message::new_with_seid(
                        MsgType::SessionEstablishmentResponse,
                        0,
                        req.sequence(),
                        vec![
                            Ie::new(IeType::NodeId, NodeId::V4(Ipv4Addr::new(192, 0, 2, 9)).marshal()),
                            Ie::new(IeType::Cause, Cause::Accepted.marshal().to_vec()),
                            Ie::new(IeType::Fseid, Fseid::new(local_seid, Ipv4Addr::new(192, 0, 2, 9)).marshal()),
                        ],
                    ),
                    MsgType::SessionModificationRequest | MsgType::SessionDeletionRequest => {
                        let resp_type = if req.msg_type() == MsgType::SessionModificationRequest {
                            MsgType::SessionModificationResponse
                        } else {
                            MsgType::SessionDeletionResponse
                        };
                        Message::new_with_seid(
                            resp_type,
                            req.seid().unwrap_or(0),
                            req.sequence(),
                            vec![Ie::new(IeType::Cause, Cause::Accepted.marshal().to_vec())],
                        )
                    }
                    _ => continue,
                };
                let bytes = reply.marshal().unwrap();
                let _ = socket.send_to(&bytes, src);
            }
        });
    }

    #[test]
    fn create_association_and_session_round_trip() {
        let upf_socket = std::net::UdpSocket::bind(localhost(0)).unwrap();
        let upf_addr = upf_socket.local_addr().unwrap();
        spawn_stub_upf(upf_socket, 0xCAFE);

        let (smf, _events) = Smf::bind(localhost(0), NodeId::V4(Ipv4Addr::new(192, 0, 2, 1))).unwrap();
        let assoc = smf.create_association(upf_addr).unwrap();

        let session = assoc
            .create_session(vec![Ie::new(IeType::PdnType, vec![1])])
            .unwrap();
        assert_eq!(session.peer_seid(), 0xCAFE);

        session.modify(vec![]).unwrap();
        session.delete().unwrap();
    }
}
