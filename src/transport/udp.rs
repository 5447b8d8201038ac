//! UDP peer layer (§4.5): a bound endpoint that demultiplexes inbound
//! datagrams by source address to registered peer handles, surfacing
//! datagrams from unknown sources as [`Event::NewPeer`].

use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::PfcpResult;

const MAX_DATAGRAM: usize = 1500;

/// Events surfaced from the endpoint's receive loop that aren't routed to an
/// already-registered peer.
#[derive(Debug)]
pub enum Event {
    /// A datagram from a source address with no registered peer, plus that
    /// source address, so the consumer can register it and optionally
    /// recirculate the payload.
    NewPeer(Vec<u8>, SocketAddr),
    /// The receive loop's socket read failed; the loop has terminated.
    NetworkError(String),
}

struct Registration {
    /// Feeds inbound datagrams from this peer to its `PeerHandle::recv_rx`.
    inbound_tx: Sender<Vec<u8>>,
}

/// A bound UDP socket with a peer registry and a background receive loop.
pub struct Endpoint {
    socket: Arc<UdpSocket>,
    registry: Arc<Mutex<HashMap<SocketAddr, Registration>>>,
}

/// A handle to a registered peer: send outbound datagrams, receive inbound
/// ones. Dropping the handle does not unregister the peer — call
/// [`Endpoint::unregister`] explicitly.
pub struct PeerHandle {
    pub addr: SocketAddr,
    send_tx: Sender<Vec<u8>>,
    recv_rx: Receiver<Vec<u8>>,
}

impl PeerHandle {
    pub fn send(&self, bytes: Vec<u8>) -> PfcpResult<()> {
        self.send_tx
            .send(bytes)
            .map_err(|_| crate::error::PfcpError::Io { reason: "peer send worker is gone".to_string() })
    }

    /// Blocks until a datagram from this peer arrives.
    pub fn recv(&self) -> Option<Vec<u8>> {
        self.recv_rx.recv().ok()
    }
}

impl Endpoint {
    /// Binds a UDP socket at `local_addr` and starts its receive loop,
    /// returning the endpoint and the event channel for unrouted datagrams.
    pub fn bind(local_addr: SocketAddr) -> PfcpResult<(Self, Receiver<Event>)> {
        let socket = Arc::new(UdpSocket::bind(local_addr)?);
        let registry: Arc<Mutex<HashMap<SocketAddr, Registration>>> = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::channel();

        let recv_socket = Arc::clone(&socket);
        let recv_registry = Arc::clone(&registry);
        thread::spawn(move || {
            let mut buf = [0u8; MAX_DATAGRAM];
            loop {
                match recv_socket.recv_from(&mut buf) {
                    Ok((n, src)) => {
                        let payload = buf[..n].to_vec();
                        let registered = recv_registry.lock().unwrap().get(&src).map(|r| r.inbound_tx.clone());
                        match registered {
                            Some(tx) => {
                                let _ = tx.send(payload);
                            }
                            None => {
                                let _ = event_tx.send(Event::NewPeer(payload, src));
                            }
                        }
                    }
                    Err(e) => {
                        let _ = event_tx.send(Event::NetworkError(e.to_string()));
                        break;
                    }
                }
            }
        });

        Ok((Endpoint { socket, registry }, event_rx))
    }

    /// Registers `peer_addr`, starting a dedicated send worker. Outbound
    /// datagrams go to `override_port` on the same IP when given, otherwise
    /// to `peer_addr` itself (§4.5: "same IP" override).
    pub fn register(&self, peer_addr: SocketAddr, override_port: Option<u16>) -> PeerHandle {
        let target = match override_port {
            Some(port) => SocketAddr::new(peer_addr.ip(), port),
            None => peer_addr,
        };

        let (inbound_tx, inbound_rx) = mpsc::channel();
        let (send_tx, send_rx) = mpsc::channel::<Vec<u8>>();

        self.registry.lock().unwrap().insert(peer_addr, Registration { inbound_tx });

        let send_socket = Arc::clone(&self.socket);
        thread::spawn(move || {
            while let Ok(bytes) = send_rx.recv() {
                let _ = send_socket.send_to(&bytes, target);
            }
        });

        PeerHandle { addr: peer_addr, send_tx, recv_rx: inbound_rx }
    }

    /// Removes `peer_addr` from the registry; its send worker exits once its
    /// channel is dropped, and its recv channel is closed.
    pub fn unregister(&self, peer_addr: SocketAddr) {
        self.registry.lock().unwrap().remove(&peer_addr);
    }

    /// Re-delivers a datagram that arrived as [`Event::NewPeer`] to a peer
    /// just registered for that source address (§4.5 "recirculate").
    pub fn recirculate(&self, peer_addr: SocketAddr, payload: Vec<u8>) {
        if let Some(reg) = self.registry.lock().unwrap().get(&peer_addr) {
            let _ = reg.inbound_tx.send(payload);
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn localhost(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn registered_peer_receives_its_own_datagrams() {
        let (server, _events) = Endpoint::bind(localhost(0)).unwrap();
        let server_addr = server.local_addr().unwrap();

        let client_socket = UdpSocket::bind(localhost(0)).unwrap();
        let client_addr = client_socket.local_addr().unwrap();

        let peer = server.register(client_addr, None);
        client_socket.send_to(b"hello", server_addr).unwrap();

        let received = peer.recv().unwrap();
        assert_eq!(received, b"hello");
    }

    #[test]
    fn unknown_source_surfaces_new_peer_event() {
        let (server, events) = Endpoint::bind(localhost(0)).unwrap();
        let server_addr = server.local_addr().unwrap();

        let client_socket = UdpSocket::bind(localhost(0)).unwrap();
        client_socket.send_to(b"surprise", server_addr).unwrap();

        let event = events.recv_timeout(Duration::from_secs(2)).unwrap();
        match event {
            Event::NewPeer(payload, _addr) => assert_eq!(payload, b"surprise"),
            Event::NetworkError(e) => panic!("unexpected network error: {}", e),
        }
    }
}
