//! Information Elements: the recursive tagged tree (§3 "IE node") and the
//! wire codec that serializes/parses it (§4.1).

pub mod ietype;
pub mod primitives;
pub mod schema;

pub use ietype::IeType;

use crate::error::{PfcpError, PfcpResult};

/// The body of an [`Ie`] node: either an opaque leaf payload, or an ordered
/// list of child nodes. A node is never both (§3 invariant) — this is
/// structural here rather than runtime-checked, per the §9 design note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IeBody {
    Leaf(Vec<u8>),
    Group(Vec<Ie>),
}

/// A single Information Element node in the IE tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ie {
    pub ie_type: IeType,
    /// Decoded IE-ID of this group, filled in by the validator (§4.2 step 3).
    /// `None` for leaves and for groups not yet validated.
    pub id: Option<u64>,
    pub body: IeBody,
}

impl Ie {
    /// Builds a new leaf IE.
    pub fn new(ie_type: IeType, payload: Vec<u8>) -> Self {
        Ie { ie_type, id: None, body: IeBody::Leaf(payload) }
    }

    /// Builds a new group IE from already-constructed children.
    pub fn new_grouped(ie_type: IeType, children: Vec<Ie>) -> Self {
        Ie { ie_type, id: None, body: IeBody::Group(children) }
    }

    /// The zero-type-code, empty placeholder a deletion leaves behind in a
    /// merge (§4.4, §9 "Null IE sentinel"). Skipped at serialization,
    /// ignored by validation.
    pub fn null_sentinel() -> Self {
        Ie { ie_type: IeType::Unknown, id: None, body: IeBody::Leaf(Vec::new()) }
    }

    pub fn is_null_sentinel(&self) -> bool {
        self.ie_type == IeType::Unknown
            && matches!(&self.body, IeBody::Leaf(b) if b.is_empty())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, IeBody::Leaf(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.body, IeBody::Group(_))
    }

    pub fn leaf_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            IeBody::Leaf(b) => Some(b),
            IeBody::Group(_) => None,
        }
    }

    pub fn children(&self) -> Option<&[Ie]> {
        match &self.body {
            IeBody::Group(c) => Some(c),
            IeBody::Leaf(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Ie>> {
        match &mut self.body {
            IeBody::Group(c) => Some(c),
            IeBody::Leaf(_) => None,
        }
    }

    /// The serialized payload length (not including this IE's own 4-byte TL
    /// header): leaf bytes as-is, or the concatenated marshaled size of every
    /// child for a group.
    pub fn payload_len(&self) -> usize {
        match &self.body {
            IeBody::Leaf(b) => b.len(),
            IeBody::Group(children) => children.iter().map(Ie::marshaled_len).sum(),
        }
    }

    /// Total marshaled size including the 4-byte TL header.
    pub fn marshaled_len(&self) -> usize {
        4 + self.payload_len()
    }

    /// Serializes this IE (and, for groups, its children depth-first) into a
    /// fresh buffer. The null sentinel serializes to nothing (§4.1).
    pub fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.marshaled_len());
        self.marshal_into(&mut buf);
        buf
    }

    pub fn marshal_into(&self, buf: &mut Vec<u8>) {
        if self.is_null_sentinel() {
            return;
        }
        let len = self.payload_len();
        buf.extend_from_slice(&(self.ie_type as u16).to_be_bytes());
        buf.extend_from_slice(&(len as u16).to_be_bytes());
        match &self.body {
            IeBody::Leaf(b) => buf.extend_from_slice(b),
            IeBody::Group(children) => {
                for child in children {
                    child.marshal_into(buf);
                }
            }
        }
    }

    /// Walks the tree checking every node's payload fits in a 16-bit length
    /// field (§4.1 `IeTooLarge`).
    pub fn check_size(&self) -> PfcpResult<()> {
        let len = self.payload_len();
        if len > 0xffff {
            return Err(PfcpError::IeTooLarge { ie_type: self.ie_type, len });
        }
        if let IeBody::Group(children) = &self.body {
            for child in children {
                child.check_size()?;
            }
        }
        Ok(())
    }

    /// Parses a single IE (and, if it is a schema-recognized group, its full
    /// subtree) from the front of `buf`, returning the node and the number of
    /// bytes consumed.
    pub fn read_one(buf: &[u8]) -> PfcpResult<(Ie, usize)> {
        if buf.len() < 4 {
            return Err(PfcpError::TruncatedHeader { reason: "IE TLV".to_string() });
        }
        let raw_type = u16::from_be_bytes([buf[0], buf[1]]);
        if raw_type > 0x7fff {
            return Err(PfcpError::VendorIeUnsupported { raw_type });
        }
        let ie_type = IeType::from(raw_type);
        let length = u16::from_be_bytes([buf[2], buf[3]]) as usize;
        if buf.len() < 4 + length {
            return Err(PfcpError::IeOverflow {
                ie_type,
                available: buf.len().saturating_sub(4),
                needed: length,
            });
        }
        let payload = &buf[4..4 + length];

        let body = if schema::is_group(ie_type) {
            IeBody::Group(parse_ies(payload)?)
        } else {
            IeBody::Leaf(payload.to_vec())
        };
        Ok((Ie { ie_type, id: None, body }, 4 + length))
    }
}

/// Parses a contiguous run of IEs (a message body, or a group IE's payload).
pub fn parse_ies(mut buf: &[u8]) -> PfcpResult<Vec<Ie>> {
    let mut out = Vec::new();
    while !buf.is_empty() {
        let (ie, consumed) = Ie::read_one(buf)?;
        out.push(ie);
        buf = &buf[consumed..];
    }
    Ok(out)
}
