//! # rs-pfcp
//!
//! A Rust implementation of PFCP (Packet Forwarding Control Protocol), the
//! control-plane protocol between the SMF and UPF in a 5G (and EPC) core,
//! per 3GPP TS 29.244.
//!
//! ## What is PFCP?
//!
//! PFCP is the communication protocol between Control Plane and User Plane
//! functions in 5G networks:
//! - **SMF (Session Management Function)** ↔ **UPF (User Plane Function)**
//! - Manages packet forwarding rules, traffic steering, and usage reporting
//! - Essential for 5G service orchestration, QoS enforcement, and network slicing
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_pfcp::ie::primitives::{Fseid, NodeId};
//! use rs_pfcp::ie::{Ie, IeType};
//! use rs_pfcp::message::{Message, MsgType};
//! use std::net::Ipv4Addr;
//!
//! let create_far = Ie::new_grouped(
//!     IeType::CreateFar,
//!     vec![
//!         Ie::new(IeType::FarId, 1u32.to_be_bytes().to_vec()),
//!         Ie::new(IeType::ApplyAction, vec![0x02]), // FORW
//!     ],
//! );
//!
//! let request = Message::new(
//!     MsgType::SessionEstablishmentRequest,
//!     1,
//!     vec![
//!         Ie::new(IeType::NodeId, NodeId::V4(Ipv4Addr::new(10, 0, 0, 1)).marshal()),
//!         Ie::new(IeType::Fseid, Fseid::new(0x1111_1111, Ipv4Addr::new(10, 0, 0, 1)).marshal()),
//!         create_far,
//!     ],
//! );
//!
//! // Serialize to bytes for network transmission.
//! let bytes = request.marshal().unwrap();
//!
//! // Parse a received message back.
//! let parsed = Message::unmarshal(&bytes).unwrap();
//! assert_eq!(parsed.msg_type(), MsgType::SessionEstablishmentRequest);
//! ```
//!
//! ## Module Organization
//!
//! - [`ie`] — Information Elements: the tagged tree, wire codec, schema tables, primitive encodings.
//! - [`message`] — PFCP messages (header + IE list) and their wire codec.
//! - [`accessor`] — Chainable, error-accumulating navigation of an IE tree.
//! - [`validator`] — Schema validation of a message or IE tree.
//! - [`merge`] — Applies a Session Modification Request onto a stored session.
//! - [`transport`] — UDP peer layer and reliable request/response transport.
//! - [`session`] — The session-state store (local SEID → {peer SEID, IE tree}).
//! - [`association`] — The per-peer association state machine (UPF/responder side).
//! - [`smf`] — The SMF client library (initiator side).
//! - [`error`] — The crate's error taxonomy.

pub mod accessor;
pub mod association;
pub mod error;
pub mod ie;
pub mod merge;
pub mod message;
pub mod session;
pub mod smf;
pub mod transport;
pub mod types;
pub mod validator;
