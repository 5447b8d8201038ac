//! A minimal UPF-side PFCP node: accepts associations from any SMF peer that
//! contacts it and runs the association/session state machine over each one.
use clap::Parser;
use network_interface::{NetworkInterface, NetworkInterfaceConfig};

use rs_pfcp::association::{Association, SessionCallbacks};
use rs_pfcp::ie::primitives::{Cause, NodeId};
use rs_pfcp::ie::Ie;
use rs_pfcp::message::{Message, MessageDisplay};
use rs_pfcp::transport::{Endpoint, Event, ReliableTransport};
use std::collections::HashMap;
use std::error::Error;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The network interface name (e.g. eth0) to bind to.
    #[arg(short, long)]
    interface: String,

    /// The port to bind to.
    #[arg(short, long, default_value_t = 8805)]
    port: u16,
}

fn resolve_ipv4(interface_name: &str) -> Result<Ipv4Addr, Box<dyn Error>> {
    let interfaces = NetworkInterface::show()?;
    let interface = interfaces
        .iter()
        .find(|iface| iface.name == interface_name)
        .ok_or_else(|| format!("Interface '{interface_name}' not found"))?;

    interface
        .addr
        .iter()
        .find_map(|addr| match addr {
            network_interface::Addr::V4(v4) => Some(v4.ip),
            _ => None,
        })
        .ok_or_else(|| "No valid IPv4 address found for interface".into())
}

/// Accepts every session it's asked to establish or delete, logging as it
/// goes. A real UPF would check resource availability here (§6 "Application
/// callback contract").
struct LoggingCallbacks;

impl SessionCallbacks for LoggingCallbacks {
    fn on_session_establishment(&self, local_seid: u64, ies: &[Ie]) -> Result<(), Cause> {
        println!("  [session {local_seid:016x}] establishing with {} IEs", ies.len());
        Ok(())
    }

    fn on_session_deletion(&self, local_seid: u64) -> Result<(), Cause> {
        println!("  [session {local_seid:016x}] deleted");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let local_ipv4 = resolve_ipv4(&args.interface)?;
    let bind_addr = SocketAddr::new(IpAddr::V4(local_ipv4), args.port);

    let (endpoint, events) = Endpoint::bind(bind_addr)?;
    println!("Listening on {}...", endpoint.local_addr()?);

    let node_id = NodeId::V4(local_ipv4);
    let callbacks: Arc<dyn SessionCallbacks> = Arc::new(LoggingCallbacks);
    let mut associations: HashMap<SocketAddr, Arc<Association>> = HashMap::new();

    loop {
        let event = match events.recv() {
            Ok(e) => e,
            Err(_) => break,
        };

        match event {
            Event::NewPeer(payload, addr) => {
                if associations.contains_key(&addr) {
                    continue;
                }
                println!("New peer contacted us: {addr}");
                if let Ok(msg) = Message::unmarshal(&payload) {
                    println!("=== First message from {addr} ({}) ===", msg.msg_name());
                    match msg.to_yaml() {
                        Ok(yaml) => println!("{yaml}"),
                        Err(e) => println!("failed to render message as YAML: {e}"),
                    }
                }

                let peer = endpoint.register(addr, None);
                let (transport, inbound) = ReliableTransport::new(peer, 1);
                let association = Association::new(
                    transport,
                    node_id.clone(),
                    local_ipv4,
                    Some(local_ipv4),
                    false,
                    Arc::clone(&callbacks),
                );
                association.run(inbound);
                endpoint.recirculate(addr, payload);
                associations.insert(addr, association);
            }
            Event::NetworkError(reason) => {
                eprintln!("network error, shutting down: {reason}");
                break;
            }
        }
    }

    Ok(())
}
