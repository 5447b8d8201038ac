//! Byte-level encodings of the primitive (non-group) IE value shapes used by
//! the worked scenarios in §8 (§4.1 "Primitive encodings"). IPv6 is
//! out of scope (§1 Non-goals); every address field below is IPv4.

use crate::error::{PfcpError, PfcpResult};
use std::net::Ipv4Addr;

fn need(field: &str, buf: &[u8], n: usize) -> PfcpResult<()> {
    if buf.len() < n {
        Err(PfcpError::WrongLength { field: field.to_string() })
    } else {
        Ok(())
    }
}

/// Cause (§4.1): 1 byte. Only the values the worked scenarios and the
/// association/session handlers need are named; anything else round-trips
/// through `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Accepted,
    Unspecified,
    SessionContextNotFound,
    MandatoryIeMissing,
    NoEstablishedPfcpAssociation,
    Other(u8),
}

impl Cause {
    pub fn code(self) -> u8 {
        match self {
            Cause::Accepted => 1,
            Cause::Unspecified => 64,
            Cause::SessionContextNotFound => 65,
            Cause::MandatoryIeMissing => 66,
            Cause::NoEstablishedPfcpAssociation => 72,
            Cause::Other(c) => c,
        }
    }

    pub fn marshal(self) -> [u8; 1] {
        [self.code()]
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("Cause", buf, 1)?;
        Ok(match buf[0] {
            1 => Cause::Accepted,
            64 => Cause::Unspecified,
            65 => Cause::SessionContextNotFound,
            66 => Cause::MandatoryIeMissing,
            72 => Cause::NoEstablishedPfcpAssociation,
            c => Cause::Other(c),
        })
    }
}

impl From<u8> for Cause {
    fn from(c: u8) -> Self {
        Cause::unmarshal(&[c]).unwrap()
    }
}

/// Seconds between the NTP/PFCP epoch (1900-01-01 00:00:00 UTC) and the Unix
/// epoch (1970-01-01 00:00:00 UTC).
const NTP_UNIX_EPOCH_DELTA: u64 = 2_208_988_800;

/// RecoveryTimeStamp (§4.1): 4 bytes, seconds since 1900-01-01 UTC.
///
/// ```
/// use rs_pfcp::ie::primitives::RecoveryTimeStamp;
///
/// let ts = RecoveryTimeStamp::from_unix_secs(1_700_000_000);
/// let bytes = ts.marshal();
/// assert_eq!(RecoveryTimeStamp::unmarshal(&bytes).unwrap(), ts);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryTimeStamp(pub u32);

impl RecoveryTimeStamp {
    pub fn from_unix_secs(unix_secs: u64) -> Self {
        RecoveryTimeStamp((unix_secs + NTP_UNIX_EPOCH_DELTA) as u32)
    }

    pub fn now() -> Self {
        let unix_secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self::from_unix_secs(unix_secs)
    }

    pub fn marshal(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("RecoveryTimeStamp", buf, 4)?;
        Ok(RecoveryTimeStamp(u32::from_be_bytes(buf[0..4].try_into().unwrap())))
    }
}

/// NodeId (§4.1): 1-byte format (0=IPv4, 1=IPv6, 2=FQDN) then the payload.
/// IPv6 is out of scope; constructing `NodeId::V6` is not offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeId {
    V4(Ipv4Addr),
    Fqdn(String),
}

impl NodeId {
    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            NodeId::V4(addr) => {
                buf.push(0);
                buf.extend_from_slice(&addr.octets());
            }
            NodeId::Fqdn(name) => {
                buf.push(2);
                for label in name.split('.') {
                    buf.push(label.len() as u8);
                    buf.extend_from_slice(label.as_bytes());
                }
            }
        }
        buf
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("NodeId", buf, 1)?;
        match buf[0] {
            0 => {
                need("NodeId (IPv4)", buf, 5)?;
                Ok(NodeId::V4(Ipv4Addr::new(buf[1], buf[2], buf[3], buf[4])))
            }
            1 => Err(PfcpError::InvalidFieldEncoding {
                field: "NodeId".to_string(),
                reason: "IPv6 node-id is not supported".to_string(),
            }),
            2 => {
                let mut labels = Vec::new();
                let mut rest = &buf[1..];
                while !rest.is_empty() {
                    let len = rest[0] as usize;
                    need("NodeId (FQDN label)", rest, 1 + len)?;
                    labels.push(
                        std::str::from_utf8(&rest[1..1 + len])
                            .map_err(|_| PfcpError::InvalidFieldEncoding {
                                field: "NodeId".to_string(),
                                reason: "FQDN label is not valid UTF-8".to_string(),
                            })?
                            .to_string(),
                    );
                    rest = &rest[1 + len..];
                }
                Ok(NodeId::Fqdn(labels.join(".")))
            }
            fmt => Err(PfcpError::InvalidFieldEncoding {
                field: "NodeId".to_string(),
                reason: format!("unknown node-id format {}", fmt),
            }),
        }
    }

    /// Human-readable form used by the accessor's `as_node_id_string` (§4.3).
    pub fn as_string(&self) -> String {
        match self {
            NodeId::V4(addr) => addr.to_string(),
            NodeId::Fqdn(s) => s.clone(),
        }
    }
}

/// F-SEID (§4.1): 1-byte flags (bit1 V4, bit0 V6), 8-byte SEID, optional
/// 4-byte IPv4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fseid {
    pub seid: u64,
    pub ipv4: Option<Ipv4Addr>,
}

impl Fseid {
    const FLAG_V4: u8 = 0x02;

    pub fn new(seid: u64, ipv4: Ipv4Addr) -> Self {
        Fseid { seid, ipv4: Some(ipv4) }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(13);
        let mut flags = 0u8;
        if self.ipv4.is_some() {
            flags |= Self::FLAG_V4;
        }
        buf.push(flags);
        buf.extend_from_slice(&self.seid.to_be_bytes());
        if let Some(addr) = self.ipv4 {
            buf.extend_from_slice(&addr.octets());
        }
        buf
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("F-SEID", buf, 9)?;
        let flags = buf[0];
        let seid = u64::from_be_bytes(buf[1..9].try_into().unwrap());
        let ipv4 = if flags & Self::FLAG_V4 != 0 {
            need("F-SEID (IPv4)", buf, 13)?;
            Some(Ipv4Addr::new(buf[9], buf[10], buf[11], buf[12]))
        } else {
            None
        };
        Ok(Fseid { seid, ipv4 })
    }
}

/// F-TEID (§4.1): 1-byte flags (bit3 CHID, bit2 CH, bit1 V6, bit0 V4).
/// `teid`/`ipv4` are `None` when CH ("choose") is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fteid {
    pub teid: Option<u32>,
    pub ipv4: Option<Ipv4Addr>,
    pub choose: bool,
    pub choose_id: Option<u8>,
}

impl Fteid {
    const FLAG_V4: u8 = 0x01;
    const FLAG_CH: u8 = 0x04;
    const FLAG_CHID: u8 = 0x08;

    pub fn assigned(teid: u32, ipv4: Ipv4Addr) -> Self {
        Fteid { teid: Some(teid), ipv4: Some(ipv4), choose: false, choose_id: None }
    }

    pub fn choose_ipv4() -> Self {
        Fteid { teid: None, ipv4: None, choose: true, choose_id: None }
    }

    pub fn marshal(&self) -> Vec<u8> {
        if self.choose {
            let mut flags = Self::FLAG_V4 | Self::FLAG_CH;
            if let Some(id) = self.choose_id {
                flags |= Self::FLAG_CHID;
                return vec![flags, id];
            }
            return vec![flags];
        }
        let mut buf = Vec::with_capacity(9);
        buf.push(Self::FLAG_V4);
        buf.extend_from_slice(&self.teid.unwrap_or(0).to_be_bytes());
        buf.extend_from_slice(&self.ipv4.unwrap_or(Ipv4Addr::UNSPECIFIED).octets());
        buf
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("F-TEID", buf, 1)?;
        let flags = buf[0];
        if flags & Self::FLAG_CH != 0 {
            let choose_id = if flags & Self::FLAG_CHID != 0 {
                need("F-TEID (CHID)", buf, 2)?;
                Some(buf[1])
            } else {
                None
            };
            return Ok(Fteid { teid: None, ipv4: None, choose: true, choose_id });
        }
        need("F-TEID", buf, 9)?;
        let teid = u32::from_be_bytes(buf[1..5].try_into().unwrap());
        let ipv4 = Ipv4Addr::new(buf[5], buf[6], buf[7], buf[8]);
        Ok(Fteid { teid: Some(teid), ipv4: Some(ipv4), choose: false, choose_id: None })
    }
}

/// OuterHeaderCreation (§4.1): 2-byte flags, 4-byte TEID, 4-byte IPv4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OuterHeaderCreation {
    pub teid: u32,
    pub ipv4: Ipv4Addr,
}

impl OuterHeaderCreation {
    const FLAG_GTPU_UDP_IPV4: u16 = 0x0100;

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(10);
        buf.extend_from_slice(&Self::FLAG_GTPU_UDP_IPV4.to_be_bytes());
        buf.extend_from_slice(&self.teid.to_be_bytes());
        buf.extend_from_slice(&self.ipv4.octets());
        buf
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("OuterHeaderCreation", buf, 10)?;
        let teid = u32::from_be_bytes(buf[2..6].try_into().unwrap());
        let ipv4 = Ipv4Addr::new(buf[6], buf[7], buf[8], buf[9]);
        Ok(OuterHeaderCreation { teid, ipv4 })
    }
}

/// UE-IP-Address (§4.1): 1-byte flags (bit2 S/D, bit1 V4, bit0 V6), 4-byte
/// IPv4 when V4 is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeIpAddress {
    pub ipv4: Ipv4Addr,
}

impl UeIpAddress {
    const FLAG_V4: u8 = 0x02;

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = vec![Self::FLAG_V4];
        buf.extend_from_slice(&self.ipv4.octets());
        buf
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("UE-IP-Address", buf, 1)?;
        if buf[0] & Self::FLAG_V4 == 0 {
            return Err(PfcpError::InvalidFieldEncoding {
                field: "UE-IP-Address".to_string(),
                reason: "only IPv4 UE addresses are supported".to_string(),
            });
        }
        need("UE-IP-Address (IPv4)", buf, 5)?;
        Ok(UeIpAddress { ipv4: Ipv4Addr::new(buf[1], buf[2], buf[3], buf[4]) })
    }
}

/// Source-Interface / Destination-Interface value (3GPP TS 29.244 §8.2.2):
/// a 1-byte enumeration sharing the same encoding for both IE types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    Access,
    Core,
    SgiLan,
    CpFunction,
    Other(u8),
}

impl Interface {
    pub fn code(self) -> u8 {
        match self {
            Interface::Access => 0,
            Interface::Core => 1,
            Interface::SgiLan => 2,
            Interface::CpFunction => 3,
            Interface::Other(c) => c,
        }
    }

    pub fn marshal(self) -> [u8; 1] {
        [self.code()]
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("Interface", buf, 1)?;
        Ok(match buf[0] {
            0 => Interface::Access,
            1 => Interface::Core,
            2 => Interface::SgiLan,
            3 => Interface::CpFunction,
            c => Interface::Other(c),
        })
    }
}

bitflags::bitflags! {
    /// ApplyAction (§4.1): exactly one bit set among DROP/FORW/BUFF/NOCP.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ApplyAction: u8 {
        const DROP = 0x01;
        const FORW = 0x02;
        const BUFF = 0x04;
        const NOCP = 0x08;
    }
}

impl ApplyAction {
    pub fn marshal(self) -> [u8; 1] {
        [self.bits()]
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("ApplyAction", buf, 1)?;
        ApplyAction::from_bits(buf[0]).ok_or_else(|| PfcpError::InvalidFieldEncoding {
            field: "ApplyAction".to_string(),
            reason: format!("unknown bits in {:#04x}", buf[0]),
        })
    }
}

/// GateStatus (§4.1): bit2 UL-closed, bit0 DL-closed (0 = open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStatus {
    pub uplink_open: bool,
    pub downlink_open: bool,
}

impl GateStatus {
    pub fn open() -> Self {
        GateStatus { uplink_open: true, downlink_open: true }
    }

    pub fn marshal(self) -> [u8; 1] {
        let mut b = 0u8;
        if !self.uplink_open {
            b |= 0x04;
        }
        if !self.downlink_open {
            b |= 0x01;
        }
        [b]
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("GateStatus", buf, 1)?;
        Ok(GateStatus {
            uplink_open: buf[0] & 0x04 == 0,
            downlink_open: buf[0] & 0x01 == 0,
        })
    }
}

/// Packs a rate in bits/s into the 5-byte big-endian field MBR/GBR use for
/// each of uplink/downlink (§4.1: "packed into bits 79..40 by a helper that
/// writes 8 bytes big-endian and uses the low 5 bytes").
fn write_40(buf: &mut [u8], value_kbps: u64) {
    let bytes = value_kbps.to_be_bytes();
    buf.copy_from_slice(&bytes[3..8]);
}

fn read_40(buf: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[3..8].copy_from_slice(buf);
    u64::from_be_bytes(bytes)
}

/// MBR/GBR (§4.1): 10 bytes, two 40-bit unsigned big-endian integers
/// (uplink then downlink), units of kbps per 3GPP TS 29.244.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRatePair {
    pub uplink_kbps: u64,
    pub downlink_kbps: u64,
}

impl BitRatePair {
    pub fn marshal(self) -> [u8; 10] {
        let mut buf = [0u8; 10];
        write_40(&mut buf[0..5], self.uplink_kbps);
        write_40(&mut buf[5..10], self.downlink_kbps);
        buf
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("MBR/GBR", buf, 10)?;
        Ok(BitRatePair {
            uplink_kbps: read_40(&buf[0..5]),
            downlink_kbps: read_40(&buf[5..10]),
        })
    }
}

/// Network-Instance / APN-DNN (§4.1): 1-byte length prefix then the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelString(pub String);

impl LabelString {
    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = vec![self.0.len() as u8];
        buf.extend_from_slice(self.0.as_bytes());
        buf
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("Network-Instance/APN-DNN", buf, 1)?;
        let len = buf[0] as usize;
        need("Network-Instance/APN-DNN", buf, 1 + len)?;
        let s = std::str::from_utf8(&buf[1..1 + len])
            .map_err(|_| PfcpError::InvalidFieldEncoding {
                field: "Network-Instance/APN-DNN".to_string(),
                reason: "label is not valid UTF-8".to_string(),
            })?
            .to_string();
        Ok(LabelString(s))
    }
}

/// User-Plane-IP-Resource-Information (§4.7, association setup response):
/// the subset this crate emits — a flags byte (bit 6 = V4 present) then the
/// GTP-U IPv4 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPlaneIpResourceInformation {
    pub teid_range: u8,
    pub ipv4: Ipv4Addr,
}

impl UserPlaneIpResourceInformation {
    const FLAG_V4: u8 = 0x40;

    pub fn new(ipv4: Ipv4Addr) -> Self {
        UserPlaneIpResourceInformation { teid_range: 0, ipv4 }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = vec![Self::FLAG_V4 | (self.teid_range & 0x07)];
        buf.extend_from_slice(&self.ipv4.octets());
        buf
    }

    pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
        need("User-Plane-IP-Resource-Information", buf, 5)?;
        Ok(UserPlaneIpResourceInformation { teid_range: buf[0] & 0x07, ipv4: Ipv4Addr::new(buf[1], buf[2], buf[3], buf[4]) })
    }
}

macro_rules! uint_ie {
    ($name:ident, $ty:ty, $n:expr) => {
        #[doc = concat!("A ", stringify!($n), "-byte big-endian unsigned identifier/value.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub $ty);

        impl $name {
            pub fn marshal(self) -> [u8; $n] {
                let full = self.0.to_be_bytes();
                let mut out = [0u8; $n];
                out.copy_from_slice(&full[full.len() - $n..]);
                out
            }

            pub fn unmarshal(buf: &[u8]) -> PfcpResult<Self> {
                need(stringify!($name), buf, $n)?;
                let mut full = [0u8; std::mem::size_of::<$ty>()];
                let start = full.len() - $n;
                full[start..].copy_from_slice(&buf[..$n]);
                Ok($name(<$ty>::from_be_bytes(full)))
            }
        }
    };
}

uint_ie!(Precedence, u32, 4);
uint_ie!(FarId, u32, 4);
uint_ie!(QerId, u32, 4);
uint_ie!(UrrId, u32, 4);
uint_ie!(PdrId, u16, 2);
uint_ie!(BarId, u8, 1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cause_round_trips() {
        assert_eq!(Cause::Accepted.code(), 1);
        assert_eq!(Cause::unmarshal(&[66]).unwrap(), Cause::MandatoryIeMissing);
    }

    #[test]
    fn recovery_timestamp_round_trips() {
        let ts = RecoveryTimeStamp::from_unix_secs(1_700_000_000);
        let bytes = ts.marshal();
        assert_eq!(RecoveryTimeStamp::unmarshal(&bytes).unwrap(), ts);
    }

    #[test]
    fn node_id_fqdn_round_trips() {
        let id = NodeId::Fqdn("customer1.example.com".to_string());
        let bytes = id.marshal();
        let parsed = NodeId::unmarshal(&bytes).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.as_string(), "customer1.example.com");
    }

    #[test]
    fn node_id_ipv4_round_trips() {
        let id = NodeId::V4(Ipv4Addr::new(162, 118, 51, 1));
        let bytes = id.marshal();
        assert_eq!(NodeId::unmarshal(&bytes).unwrap(), id);
    }

    #[test]
    fn fseid_round_trips_with_ipv4() {
        let f = Fseid::new(1, Ipv4Addr::new(162, 118, 51, 1));
        let bytes = f.marshal();
        assert_eq!(bytes.len(), 13);
        assert_eq!(Fseid::unmarshal(&bytes).unwrap(), f);
    }

    #[test]
    fn fteid_assigned_round_trips() {
        let f = Fteid::assigned(1234, Ipv4Addr::new(162, 118, 51, 1));
        let bytes = f.marshal();
        assert_eq!(Fteid::unmarshal(&bytes).unwrap(), f);
    }

    #[test]
    fn fteid_choose_round_trips() {
        let f = Fteid::choose_ipv4();
        let bytes = f.marshal();
        let parsed = Fteid::unmarshal(&bytes).unwrap();
        assert!(parsed.choose);
        assert!(parsed.teid.is_none());
    }

    #[test]
    fn outer_header_creation_round_trips() {
        let ohc = OuterHeaderCreation { teid: 1, ipv4: Ipv4Addr::new(162, 117, 1, 1) };
        let bytes = ohc.marshal();
        assert_eq!(OuterHeaderCreation::unmarshal(&bytes).unwrap(), ohc);
    }

    #[test]
    fn ue_ip_address_round_trips() {
        let ue = UeIpAddress { ipv4: Ipv4Addr::new(14, 0, 0, 2) };
        let bytes = ue.marshal();
        assert_eq!(UeIpAddress::unmarshal(&bytes).unwrap(), ue);
    }

    #[test]
    fn interface_round_trips() {
        assert_eq!(Interface::unmarshal(&[2]).unwrap(), Interface::SgiLan);
        assert_eq!(Interface::Access.marshal(), [0]);
    }

    #[test]
    fn apply_action_is_a_single_bit() {
        let a = ApplyAction::FORW;
        assert_eq!(ApplyAction::unmarshal(&a.marshal()).unwrap(), a);
    }

    #[test]
    fn gate_status_default_is_open() {
        let g = GateStatus::open();
        assert_eq!(g.marshal(), [0x00]);
        assert_eq!(GateStatus::unmarshal(&[0x00]).unwrap(), g);
    }

    #[test]
    fn bit_rate_pair_round_trips_10mb_and_2560mb() {
        let r = BitRatePair { uplink_kbps: 10_000, downlink_kbps: 2_560_000 };
        let bytes = r.marshal();
        assert_eq!(BitRatePair::unmarshal(&bytes).unwrap(), r);
    }

    #[test]
    fn label_string_round_trips() {
        let l = LabelString("internet".to_string());
        let bytes = l.marshal();
        assert_eq!(LabelString::unmarshal(&bytes).unwrap(), l);
    }

    #[test]
    fn uint_ies_round_trip_at_their_native_width() {
        assert_eq!(PdrId::unmarshal(&PdrId(32768).marshal()).unwrap(), PdrId(32768));
        assert_eq!(FarId::unmarshal(&FarId(1_073_741_824).marshal()).unwrap(), FarId(1_073_741_824));
        assert_eq!(BarId::unmarshal(&BarId(1).marshal()).unwrap(), BarId(1));
    }
}
