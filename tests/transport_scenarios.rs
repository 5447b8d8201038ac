//! End-to-end transport scenarios over real UDP sockets (§4.5, §4.6, §8).

use rs_pfcp::message::{Message, MsgType};
use rs_pfcp::transport::{Endpoint, Event, ReliableTransport};
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn localhost(port: u16) -> SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}

/// Scenario: a peer drops the first few retransmissions of a request, then
/// replies. The requester must keep retrying (well within N1) and hand back
/// the eventual reply rather than timing out.
#[test]
fn requester_survives_dropped_retransmissions_then_gets_its_reply() {
    let (server_endpoint, _events) = Endpoint::bind(localhost(0)).unwrap();
    let server_addr = server_endpoint.local_addr().unwrap();

    let flaky_socket = UdpSocket::bind(localhost(0)).unwrap();
    flaky_socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let flaky_addr = flaky_socket.local_addr().unwrap();

    let peer = server_endpoint.register(flaky_addr, None);
    let (transport, _inbound) = ReliableTransport::new(peer, 7);

    let seen = Arc::new(AtomicU32::new(0));
    let seen_in_thread = Arc::clone(&seen);
    let reply_from = server_addr;
    thread::spawn(move || {
        let mut buf = [0u8; 1500];
        loop {
            let (n, src) = match flaky_socket.recv_from(&mut buf) {
                Ok(v) => v,
                Err(_) => return,
            };
            let attempt = seen_in_thread.fetch_add(1, Ordering::SeqCst);
            if attempt < 2 {
                // Silently drop the first two attempts to force a retry.
                continue;
            }
            let req = Message::unmarshal(&buf[..n]).unwrap();
            let reply = Message::new(MsgType::HeartbeatResponse, req.sequence(), vec![]);
            flaky_socket.send_to(&reply.marshal().unwrap(), reply_from).unwrap();
            let _ = src;
            return;
        }
    });

    let request = Message::new(MsgType::HeartbeatRequest, 0, vec![]);
    let reply = transport.send_request(request).expect("should eventually receive a reply");
    assert_eq!(reply.msg_type(), MsgType::HeartbeatResponse);
    assert!(seen.load(Ordering::SeqCst) >= 3, "peer should have seen at least 3 attempts");
}

/// Scenario: a responder replays the exact cached bytes for a retransmitted
/// request rather than re-invoking the handler a second time.
#[test]
fn responder_replays_cached_reply_without_rerunning_handler() {
    let (server_endpoint, _events) = Endpoint::bind(localhost(0)).unwrap();
    let server_addr = server_endpoint.local_addr().unwrap();

    let client_socket = UdpSocket::bind(localhost(0)).unwrap();
    client_socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let client_addr = client_socket.local_addr().unwrap();

    let peer = server_endpoint.register(client_addr, None);
    let (transport, inbound) = ReliableTransport::new(peer, 1);

    let handled = Arc::new(AtomicU32::new(0));
    let handled_in_thread = Arc::clone(&handled);
    thread::spawn(move || {
        while let Ok(req) = inbound.recv() {
            handled_in_thread.fetch_add(1, Ordering::SeqCst);
            let reply = Message::new(MsgType::HeartbeatResponse, 0, vec![]);
            transport.send_response(req.sequence, reply).unwrap();
        }
    });

    let request = Message::new(MsgType::HeartbeatRequest, 99, vec![]);
    let bytes = request.marshal().unwrap();

    // First delivery: handler runs, a reply is cached and sent.
    client_socket.send_to(&bytes, server_addr).unwrap();
    let mut buf = [0u8; 1500];
    let (n1, _) = client_socket.recv_from(&mut buf).unwrap();
    let first_reply = buf[..n1].to_vec();

    // Retransmission with the same sequence: handler must not run again,
    // the exact same cached bytes come back.
    client_socket.send_to(&bytes, server_addr).unwrap();
    let (n2, _) = client_socket.recv_from(&mut buf).unwrap();
    let second_reply = buf[..n2].to_vec();

    assert_eq!(first_reply, second_reply);
    assert_eq!(handled.load(Ordering::SeqCst), 1, "handler should run exactly once despite the retransmission");
}

/// Scenario 6: a datagram from an address with no registered peer surfaces
/// as `Event::NewPeer`; the consumer registers that address and recirculates
/// the payload so the now-registered reliable transport picks it up as a
/// normal inbound request.
#[test]
fn unknown_peer_is_registered_and_its_triggering_datagram_recirculated() {
    let (server_endpoint, events) = Endpoint::bind(localhost(0)).unwrap();
    let server_addr = server_endpoint.local_addr().unwrap();

    let client_socket = UdpSocket::bind(localhost(0)).unwrap();
    let client_addr = client_socket.local_addr().unwrap();

    let heartbeat = Message::new(MsgType::HeartbeatRequest, 5, vec![]);
    client_socket.send_to(&heartbeat.marshal().unwrap(), server_addr).unwrap();

    let event = events.recv_timeout(Duration::from_secs(2)).unwrap();
    let (payload, addr) = match event {
        Event::NewPeer(payload, addr) => (payload, addr),
        Event::NetworkError(e) => panic!("unexpected network error: {e}"),
    };
    assert_eq!(addr, client_addr);

    let peer = server_endpoint.register(addr, None);
    let (_transport, inbound) = ReliableTransport::new(peer, 1);
    server_endpoint.recirculate(addr, payload);

    let received = inbound.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(received.sequence, 5);
    assert_eq!(received.message.msg_type(), MsgType::HeartbeatRequest);
}
