//! The UDP peer layer (§4.5) and reliable request/response transport (§4.6).

pub mod reliable;
pub mod udp;

pub use reliable::{InboundRequest, ReliableTransport, N1, RESPONDER_TTL, T1};
pub use udp::{Endpoint, Event, PeerHandle};
