//! PFCP messages: an 8/16-byte header plus a flat run of top-level IEs (§3).

pub mod display;
pub mod header;

use crate::error::{PfcpError, PfcpResult};
use crate::ie::{schema, Ie, IeType};

pub use display::MessageDisplay;
pub use header::Header;

// Message Type definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MsgType {
    HeartbeatRequest = 1,
    HeartbeatResponse = 2,
    PfdManagementRequest = 3,
    PfdManagementResponse = 4,
    AssociationSetupRequest = 5,
    AssociationSetupResponse = 6,
    AssociationUpdateRequest = 7,
    AssociationUpdateResponse = 8,
    AssociationReleaseRequest = 9,
    AssociationReleaseResponse = 10,
    VersionNotSupportedResponse = 11,
    NodeReportRequest = 12,
    NodeReportResponse = 13,
    SessionSetDeletionRequest = 14,
    SessionSetDeletionResponse = 15,
    SessionSetModificationRequest = 16,
    SessionSetModificationResponse = 17,
    SessionEstablishmentRequest = 50,
    SessionEstablishmentResponse = 51,
    SessionModificationRequest = 52,
    SessionModificationResponse = 53,
    SessionDeletionRequest = 54,
    SessionDeletionResponse = 55,
    SessionReportRequest = 56,
    SessionReportResponse = 57,
    Unknown,
}

impl From<u8> for MsgType {
    fn from(v: u8) -> Self {
        match v {
            1 => MsgType::HeartbeatRequest,
            2 => MsgType::HeartbeatResponse,
            3 => MsgType::PfdManagementRequest,
            4 => MsgType::PfdManagementResponse,
            5 => MsgType::AssociationSetupRequest,
            6 => MsgType::AssociationSetupResponse,
            7 => MsgType::AssociationUpdateRequest,
            8 => MsgType::AssociationUpdateResponse,
            9 => MsgType::AssociationReleaseRequest,
            10 => MsgType::AssociationReleaseResponse,
            11 => MsgType::VersionNotSupportedResponse,
            12 => MsgType::NodeReportRequest,
            13 => MsgType::NodeReportResponse,
            14 => MsgType::SessionSetDeletionRequest,
            15 => MsgType::SessionSetDeletionResponse,
            16 => MsgType::SessionSetModificationRequest,
            17 => MsgType::SessionSetModificationResponse,
            50 => MsgType::SessionEstablishmentRequest,
            51 => MsgType::SessionEstablishmentResponse,
            52 => MsgType::SessionModificationRequest,
            53 => MsgType::SessionModificationResponse,
            54 => MsgType::SessionDeletionRequest,
            55 => MsgType::SessionDeletionResponse,
            56 => MsgType::SessionReportRequest,
            57 => MsgType::SessionReportResponse,
            _ => MsgType::Unknown,
        }
    }
}

/// A PFCP message: header plus a flat list of top-level IEs (§3 "Message").
///
/// Nothing here is specific to a message type — the schema tables in
/// [`crate::ie::schema`] carry that knowledge. A `Message` is valid PFCP
/// wire data once [`Message::unmarshal`] has parsed it; whether its IEs
/// satisfy its message type's schema is a separate question answered by
/// `crate::validator` (§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub ies: Vec<Ie>,
}

impl Message {
    /// Builds a request/response message with no SEID in the header.
    pub fn new(msg_type: MsgType, sequence_number: u32, ies: Vec<Ie>) -> Self {
        Message {
            header: Header::new(msg_type, false, 0, sequence_number),
            ies,
        }
    }

    /// Builds a session-level message, whose header carries a SEID (§4.1).
    pub fn new_with_seid(msg_type: MsgType, seid: u64, sequence_number: u32, ies: Vec<Ie>) -> Self {
        Message {
            header: Header::new(msg_type, true, seid, sequence_number),
            ies,
        }
    }

    pub fn msg_type(&self) -> MsgType {
        self.header.message_type
    }

    pub fn msg_name(&self) -> String {
        format!("{:?}", self.msg_type())
    }

    pub fn seid(&self) -> Option<u64> {
        self.header.has_seid.then_some(self.header.seid)
    }

    pub fn sequence(&self) -> u32 {
        self.header.sequence_number
    }

    pub fn set_sequence(&mut self, seq: u32) {
        self.header.sequence_number = seq & 0x00ff_ffff;
    }

    /// All top-level IEs of a given type, in wire order.
    pub fn ies(&self, ie_type: IeType) -> impl Iterator<Item = &Ie> {
        self.ies.iter().filter(move |ie| ie.ie_type == ie_type)
    }

    pub fn first_ie(&self, ie_type: IeType) -> Option<&Ie> {
        self.ies(ie_type).next()
    }

    fn body_len(&self) -> usize {
        self.ies.iter().map(Ie::marshaled_len).sum()
    }

    /// Total marshaled size, header included.
    pub fn marshaled_len(&self) -> usize {
        self.header.header_len() as usize + self.body_len()
    }

    /// Checks every IE's payload fits the 16-bit TLV length field (§4.1).
    pub fn check_size(&self) -> PfcpResult<()> {
        for ie in &self.ies {
            ie.check_size()?;
        }
        Ok(())
    }

    /// Serializes the message. The header's `length` field is recomputed
    /// from the body per §4.1 ("message length" excludes the 4 bytes of
    /// flags/type/length itself but includes the rest of the header).
    pub fn marshal(&self) -> PfcpResult<Vec<u8>> {
        self.check_size()?;
        let mut buf = Vec::with_capacity(self.marshaled_len());
        let mut header = self.header.clone();
        header.length = (header.header_len() - 4) as u16 + self.body_len() as u16;
        header.marshal_into(&mut buf);
        for ie in &self.ies {
            ie.marshal_into(&mut buf);
        }
        Ok(buf)
    }

    /// Parses a header and its IE run. Per §4.1, a declared header length
    /// that disagrees with the actual buffer length is `MalformedHeader`.
    pub fn unmarshal(data: &[u8]) -> PfcpResult<Self> {
        let header = Header::unmarshal(data)?;
        let body_start = header.header_len() as usize;
        let expected_total = body_start + header.length as usize - (body_start - 4);
        if expected_total != data.len() {
            return Err(PfcpError::MalformedHeader {
                expected: expected_total,
                actual: data.len(),
            });
        }
        let ies = crate::ie::parse_ies(&data[body_start..])?;
        Ok(Message { header, ies })
    }

    /// The schema attribute set for this message's type (§4.2), or empty if
    /// the type carries no mandatory top-level IEs in this profile.
    pub fn schema(&self) -> &'static [schema::AttrEntry] {
        schema::message_attrs(self.msg_type())
    }
}

/// Dispatches on the wire header's message type without fully decoding the
/// body; used by the transport layer to route before validating (§4.5/4.7).
pub fn peek_type(data: &[u8]) -> PfcpResult<MsgType> {
    Ok(Header::unmarshal(data)?.message_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ie::primitives::{Cause, RecoveryTimeStamp};

    fn heartbeat(seq: u32) -> Message {
        let ts = RecoveryTimeStamp::from_unix_secs(1_700_000_000);
        Message::new(
            MsgType::HeartbeatRequest,
            seq,
            vec![Ie::new(IeType::RecoveryTimeStamp, ts.marshal().to_vec())],
        )
    }

    #[test]
    fn test_msg_type_from_u8_heartbeat() {
        assert_eq!(MsgType::from(1), MsgType::HeartbeatRequest);
        assert_eq!(MsgType::from(2), MsgType::HeartbeatResponse);
    }

    #[test]
    fn test_msg_type_from_u8_session() {
        assert_eq!(MsgType::from(50), MsgType::SessionEstablishmentRequest);
        assert_eq!(MsgType::from(57), MsgType::SessionReportResponse);
    }

    #[test]
    fn test_msg_type_from_u8_unknown() {
        assert_eq!(MsgType::from(0), MsgType::Unknown);
        assert_eq!(MsgType::from(255), MsgType::Unknown);
    }

    #[test]
    fn round_trips_without_seid() {
        let msg = heartbeat(12345);
        let bytes = msg.marshal().unwrap();
        let parsed = Message::unmarshal(&bytes).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(parsed.sequence(), 12345);
        assert_eq!(parsed.seid(), None);
    }

    #[test]
    fn round_trips_with_seid() {
        let msg = Message::new_with_seid(
            MsgType::SessionModificationRequest,
            0x1234567890ABCDEF,
            77,
            vec![Ie::new(IeType::Cause, Cause::Accepted.marshal().to_vec())],
        );
        let bytes = msg.marshal().unwrap();
        let parsed = Message::unmarshal(&bytes).unwrap();
        assert_eq!(parsed.seid(), Some(0x1234567890ABCDEF));
        assert_eq!(parsed.sequence(), 77);
    }

    #[test]
    fn set_sequence_masks_to_24_bits() {
        let mut msg = heartbeat(0);
        msg.set_sequence(0xff12_3456);
        assert_eq!(msg.sequence(), 0x0012_3456);
    }

    #[test]
    fn first_ie_finds_by_type() {
        let msg = heartbeat(1);
        assert!(msg.first_ie(IeType::RecoveryTimeStamp).is_some());
        assert!(msg.first_ie(IeType::Cause).is_none());
    }

    #[test]
    fn rejects_mismatched_length_field() {
        let msg = heartbeat(1);
        let mut bytes = msg.marshal().unwrap();
        // Corrupt the length field so it no longer matches the buffer.
        bytes[2] = 0xff;
        bytes[3] = 0xff;
        let err = Message::unmarshal(&bytes).unwrap_err();
        assert!(matches!(err, PfcpError::MalformedHeader { .. }));
    }

    #[test]
    fn peek_type_reads_header_only() {
        let msg = heartbeat(1);
        let bytes = msg.marshal().unwrap();
        assert_eq!(peek_type(&bytes).unwrap(), MsgType::HeartbeatRequest);
    }

    #[test]
    fn schema_for_heartbeat_request_requires_recovery_timestamp() {
        let msg = heartbeat(1);
        let attrs = msg.schema();
        let recovery = schema::find_attr(attrs, IeType::RecoveryTimeStamp).unwrap();
        assert!(recovery.required);
    }
}
