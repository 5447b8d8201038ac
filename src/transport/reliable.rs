//! Reliable request/response transport atop a single [`PeerHandle`] (§4.6).
//!
//! Sequence numbers correlate requests with responses across a retry loop
//! (N1 attempts, T1 apart); the responder side caches the serialized reply
//! so a retransmitted request gets the same bytes back rather than
//! re-running the handler.

use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PfcpError, PfcpResult};
use crate::message::{Message, MsgType};
use crate::transport::udp::PeerHandle;

/// Retransmission attempts before giving up on an outbound request.
pub const N1: u32 = 100;
/// Delay between retransmission attempts.
pub const T1: Duration = Duration::from_secs(1);
/// How long a responder cache entry survives after its reply is cached,
/// swept opportunistically on the next inbound request (§4.6.A).
pub const RESPONDER_TTL: Duration = Duration::from_secs(300);

fn is_response(msg_type: MsgType) -> bool {
    matches!(
        msg_type,
        MsgType::HeartbeatResponse
            | MsgType::PfdManagementResponse
            | MsgType::AssociationSetupResponse
            | MsgType::AssociationUpdateResponse
            | MsgType::AssociationReleaseResponse
            | MsgType::VersionNotSupportedResponse
            | MsgType::NodeReportResponse
            | MsgType::SessionSetDeletionResponse
            | MsgType::SessionSetModificationResponse
            | MsgType::SessionEstablishmentResponse
            | MsgType::SessionModificationResponse
            | MsgType::SessionDeletionResponse
            | MsgType::SessionReportResponse
    )
}

struct RequesterEntry {
    /// Taken (set to `None`) the moment a response is delivered, so a
    /// second response with the same sequence number is recognized as a
    /// duplicate rather than silently redelivered.
    reply_tx: Option<Sender<Message>>,
}

struct ResponderEntry {
    cached_reply: Option<Vec<u8>>,
    inserted_at: Instant,
}

/// An inbound request surfaced to the application layer, with its original
/// (pre-scrub) sequence number so the handler can address a reply back to
/// it via [`ReliableTransport::send_response`].
pub struct InboundRequest {
    pub sequence: u32,
    pub message: Message,
}

/// Request/response correlation atop a single peer connection.
pub struct ReliableTransport {
    peer: Arc<PeerHandle>,
    next_sequence: Mutex<u32>,
    requester: Mutex<HashMap<u32, RequesterEntry>>,
    responder: Mutex<HashMap<u32, ResponderEntry>>,
    request_tx: Sender<InboundRequest>,
}

impl ReliableTransport {
    /// Wraps `peer`, seeding `next_sequence` from `initial_sequence`
    /// (callers should pass a random 32-bit value; only the low 24 bits are
    /// used per §4.1). Spawns the dispatch loop and returns the transport
    /// plus the channel inbound requests are surfaced on.
    pub fn new(peer: PeerHandle, initial_sequence: u32) -> (Arc<Self>, mpsc::Receiver<InboundRequest>) {
        let (request_tx, request_rx) = mpsc::channel();
        let transport = Arc::new(ReliableTransport {
            peer: Arc::new(peer),
            next_sequence: Mutex::new(initial_sequence & 0x00ff_ffff),
            requester: Mutex::new(HashMap::new()),
            responder: Mutex::new(HashMap::new()),
            request_tx,
        });

        let dispatch = Arc::clone(&transport);
        thread::spawn(move || {
            while let Some(bytes) = dispatch.peer.recv() {
                dispatch.dispatch_inbound(&bytes);
            }
        });

        (transport, request_rx)
    }

    fn next_sequence(&self) -> u32 {
        let mut seq = self.next_sequence.lock().unwrap();
        let current = *seq;
        *seq = (*seq + 1) & 0x00ff_ffff;
        current
    }

    /// Sends `msg` (its sequence number is overwritten) and blocks for a
    /// response, retrying every `T1` up to `N1` times.
    pub fn send_request(&self, mut msg: Message) -> PfcpResult<Message> {
        let seq = self.next_sequence();
        msg.set_sequence(seq);
        let bytes = msg.marshal()?;

        let (tx, rx) = mpsc::channel();
        self.requester.lock().unwrap().insert(seq, RequesterEntry { reply_tx: Some(tx) });

        let mut attempts = 0;
        let result = loop {
            attempts += 1;
            if self.peer.send(bytes.clone()).is_err() {
                break Err(PfcpError::Io { reason: "send failed".to_string() });
            }
            match rx.recv_timeout(T1) {
                Ok(reply) => break Ok(reply),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if attempts >= N1 {
                        break Err(PfcpError::RequestTimeout { sequence: seq, attempts });
                    }
                    continue;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    break Err(PfcpError::RequestTimeout { sequence: seq, attempts });
                }
            }
        };

        self.requester.lock().unwrap().remove(&seq);
        result
    }

    /// Sends a reply to the inbound request identified by `sequence`,
    /// caching the serialized bytes for retransmission.
    pub fn send_response(&self, sequence: u32, mut msg: Message) -> PfcpResult<()> {
        msg.set_sequence(sequence);
        let bytes = msg.marshal()?;
        if let Some(entry) = self.responder.lock().unwrap().get_mut(&sequence) {
            entry.cached_reply = Some(bytes.clone());
            entry.inserted_at = Instant::now();
        }
        self.peer.send(bytes)
    }

    fn dispatch_inbound(&self, data: &[u8]) {
        let msg = match Message::unmarshal(data) {
            Ok(m) => m,
            Err(_) => return,
        };
        if is_response(msg.msg_type()) {
            self.handle_response(msg);
        } else {
            self.handle_request(msg);
        }
    }

    fn handle_response(&self, msg: Message) {
        let seq = msg.sequence();
        let mut map = self.requester.lock().unwrap();
        match map.get_mut(&seq) {
            Some(entry) => match entry.reply_tx.take() {
                Some(tx) => {
                    let _ = tx.send(msg);
                }
                None => { /* duplicate response for an already-delivered sequence; discard */ }
            },
            None => { /* response for a sequence we have no record of; discard */ }
        }
    }

    fn handle_request(&self, mut msg: Message) {
        let seq = msg.sequence();
        let mut map = self.responder.lock().unwrap();
        sweep(&mut map);

        match map.get(&seq) {
            Some(entry) => {
                if let Some(cached) = entry.cached_reply.clone() {
                    drop(map);
                    let _ = self.peer.send(cached);
                }
                // Else still processing: ignore the retransmission.
            }
            None => {
                map.insert(seq, ResponderEntry { cached_reply: None, inserted_at: Instant::now() });
                drop(map);
                msg.set_sequence(0);
                let _ = self.request_tx.send(InboundRequest { sequence: seq, message: msg });
            }
        }
    }
}

fn sweep(map: &mut HashMap<u32, ResponderEntry>) {
    let now = Instant::now();
    map.retain(|_, e| e.cached_reply.is_none() || now.duration_since(e.inserted_at) < RESPONDER_TTL);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::udp::Endpoint;
    use std::net::{SocketAddr, UdpSocket};

    fn localhost(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn request_gets_a_reply_without_retrying() {
        let (server_endpoint, _events) = Endpoint::bind(localhost(0)).unwrap();
        let server_addr = server_endpoint.local_addr().unwrap();

        let echo_socket = UdpSocket::bind(localhost(0)).unwrap();
        let echo_addr = echo_socket.local_addr().unwrap();

        let peer = server_endpoint.register(echo_addr, None);
        let (transport, _inbound) = ReliableTransport::new(peer, 1);

        // A miniature "echo peer": reads the request, flips it into a
        // heartbeat response with the same sequence number, replies.
        let echo_server_addr = server_addr;
        thread::spawn(move || {
            let mut buf = [0u8; 1500];
            let (n, src) = echo_socket.recv_from(&mut buf).unwrap();
            let req = Message::unmarshal(&buf[..n]).unwrap();
            let reply = Message::new(MsgType::HeartbeatResponse, req.sequence(), vec![]);
            let bytes = reply.marshal().unwrap();
            echo_socket.send_to(&bytes, echo_server_addr).unwrap();
        });

        let request = Message::new(MsgType::HeartbeatRequest, 0, vec![]);
        let reply = transport.send_request(request).unwrap();
        assert_eq!(reply.msg_type(), MsgType::HeartbeatResponse);
    }

    #[test]
    fn inbound_request_is_surfaced_with_scrubbed_sequence() {
        let (server_endpoint, _events) = Endpoint::bind(localhost(0)).unwrap();
        let server_addr = server_endpoint.local_addr().unwrap();

        let client_socket = UdpSocket::bind(localhost(0)).unwrap();
        let client_addr = client_socket.local_addr().unwrap();

        let peer = server_endpoint.register(client_addr, None);
        let (_transport, inbound) = ReliableTransport::new(peer, 1);

        let request = Message::new(MsgType::HeartbeatRequest, 42, vec![]);
        let bytes = request.marshal().unwrap();
        client_socket.send_to(&bytes, server_addr).unwrap();

        let received = inbound.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received.sequence, 42);
        assert_eq!(received.message.sequence(), 0);
    }
}
