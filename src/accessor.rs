//! Chainable, error-accumulating access into an IE tree (§4.3).
//!
//! [`Accessor`] wraps a slice of sibling IEs (a message's top-level IEs, or a
//! group IE's children) and lets callers walk down by type/id without a
//! cascade of `if let`. Each step records a miss rather than failing
//! immediately, so a caller extracting several fields from the same node
//! gets every error at once instead of one-at-a-time.

use crate::error::PfcpError;
use crate::ie::primitives::{
    ApplyAction, Cause, Fseid, Fteid, GateStatus, Interface, NodeId, OuterHeaderCreation, UeIpAddress,
};
use crate::ie::{Ie, IeType};

/// A view into a run of sibling IEs, with an accumulated error log.
pub struct Accessor<'a> {
    path: Vec<IeType>,
    siblings: &'a [Ie],
    errors: Vec<PfcpError>,
}

impl<'a> Accessor<'a> {
    pub fn new(siblings: &'a [Ie]) -> Self {
        Accessor { path: Vec::new(), siblings, errors: Vec::new() }
    }

    pub fn for_message(msg: &'a crate::message::Message) -> Self {
        Accessor::new(&msg.ies)
    }

    /// Descends into the first child of `ie_type`, switching the view to its
    /// children (or to an empty slice if it is a leaf or missing). Records
    /// [`PfcpError::IeNotFound`] when absent.
    pub fn into_group(mut self, ie_type: IeType) -> Self {
        self.path.push(ie_type);
        match self.siblings.iter().find(|ie| ie.ie_type == ie_type) {
            Some(ie) => {
                self.siblings = ie.children().unwrap_or(&[]);
            }
            None => {
                self.errors.push(PfcpError::IeNotFound { ie_type, path: self.path.clone() });
                self.siblings = &[];
            }
        }
        self
    }

    /// The child of `ie_type` whose IE-ID equals `id` (§4.3 `get_by_id`).
    pub fn get_by_id(&mut self, ie_type: IeType, id: u64) -> Option<&'a Ie> {
        match self.siblings.iter().find(|ie| ie.ie_type == ie_type && ie.id == Some(id)) {
            Some(ie) => Some(ie),
            None => {
                let mut path = self.path.clone();
                path.push(ie_type);
                self.errors.push(PfcpError::IeNotFound { ie_type, path });
                None
            }
        }
    }

    /// The first child of `ie_type` satisfying `pred` (§4.3 `get_by_predicate`).
    pub fn get_by_predicate(
        &mut self,
        ie_type: IeType,
        mut pred: impl FnMut(&Ie) -> bool,
    ) -> Option<&'a Ie> {
        match self.siblings.iter().find(|ie| ie.ie_type == ie_type && pred(ie)) {
            Some(ie) => Some(ie),
            None => {
                let mut path = self.path.clone();
                path.push(ie_type);
                self.errors.push(PfcpError::IeNotFound { ie_type, path });
                None
            }
        }
    }

    /// Decodes the IE-ID of the first child of `ie_type`, the way
    /// [`crate::validator`] would when populating a group's `id` field.
    pub fn parse_id(&mut self, ie_type: IeType) -> Option<u64> {
        let bytes = self.leaf(ie_type)?;
        if bytes.is_empty() || bytes.len() > 8 {
            self.errors.push(PfcpError::WrongLength { field: format!("{:?}", ie_type) });
            return None;
        }
        let mut buf = [0u8; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Some(u64::from_be_bytes(buf))
    }

    /// Returns every top-level sibling of `ie_type` (the "multiple" case).
    pub fn all(&self, ie_type: IeType) -> impl Iterator<Item = &'a Ie> + '_ {
        self.siblings.iter().filter(move |ie| ie.ie_type == ie_type)
    }

    fn get(&mut self, ie_type: IeType) -> Option<&'a Ie> {
        match self.siblings.iter().find(|ie| ie.ie_type == ie_type) {
            Some(ie) => Some(ie),
            None => {
                let mut path = self.path.clone();
                path.push(ie_type);
                self.errors.push(PfcpError::IeNotFound { ie_type, path });
                None
            }
        }
    }

    fn leaf(&mut self, ie_type: IeType) -> Option<&'a [u8]> {
        self.get(ie_type).and_then(Ie::leaf_bytes)
    }

    fn record<T>(&mut self, result: Result<T, PfcpError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    pub fn as_u8(&mut self, ie_type: IeType) -> Option<u8> {
        let bytes = self.leaf(ie_type)?;
        if bytes.is_empty() {
            self.errors.push(PfcpError::WrongLength { field: format!("{:?}", ie_type) });
            return None;
        }
        Some(bytes[0])
    }

    pub fn as_u16(&mut self, ie_type: IeType) -> Option<u16> {
        let bytes = self.leaf(ie_type)?;
        if bytes.len() < 2 {
            self.errors.push(PfcpError::WrongLength { field: format!("{:?}", ie_type) });
            return None;
        }
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn as_u32(&mut self, ie_type: IeType) -> Option<u32> {
        let bytes = self.leaf(ie_type)?;
        if bytes.len() < 4 {
            self.errors.push(PfcpError::WrongLength { field: format!("{:?}", ie_type) });
            return None;
        }
        Some(u32::from_be_bytes(bytes[0..4].try_into().unwrap()))
    }

    pub fn as_u64(&mut self, ie_type: IeType) -> Option<u64> {
        let bytes = self.leaf(ie_type)?;
        if bytes.len() < 8 {
            self.errors.push(PfcpError::WrongLength { field: format!("{:?}", ie_type) });
            return None;
        }
        Some(u64::from_be_bytes(bytes[0..8].try_into().unwrap()))
    }

    pub fn as_fteid(&mut self) -> Option<Fteid> {
        let bytes = self.leaf(IeType::Fteid)?;
        let result = Fteid::unmarshal(bytes);
        self.record(result)
    }

    pub fn as_fseid(&mut self) -> Option<Fseid> {
        let bytes = self.leaf(IeType::Fseid)?;
        let result = Fseid::unmarshal(bytes);
        self.record(result)
    }

    pub fn as_outer_header_creation(&mut self) -> Option<OuterHeaderCreation> {
        let bytes = self.leaf(IeType::OuterHeaderCreation)?;
        let result = OuterHeaderCreation::unmarshal(bytes);
        self.record(result)
    }

    pub fn as_ue_ip(&mut self) -> Option<UeIpAddress> {
        let bytes = self.leaf(IeType::UeIpAddress)?;
        let result = UeIpAddress::unmarshal(bytes);
        self.record(result)
    }

    pub fn as_apply_action(&mut self) -> Option<ApplyAction> {
        let bytes = self.leaf(IeType::ApplyAction)?;
        let result = ApplyAction::unmarshal(bytes);
        self.record(result)
    }

    pub fn as_gate_status(&mut self) -> Option<GateStatus> {
        let bytes = self.leaf(IeType::GateStatus)?;
        let result = GateStatus::unmarshal(bytes);
        self.record(result)
    }

    pub fn as_cause(&mut self) -> Option<Cause> {
        let bytes = self.leaf(IeType::Cause)?;
        let result = Cause::unmarshal(bytes);
        self.record(result)
    }

    /// Decodes `ie_type` (`SourceInterface` or `DestinationInterface`) as an
    /// [`Interface`] value.
    pub fn as_interface_enum(&mut self, ie_type: IeType) -> Option<Interface> {
        let bytes = self.leaf(ie_type)?;
        let result = Interface::unmarshal(bytes);
        self.record(result)
    }

    pub fn as_node_id_string(&mut self) -> Option<String> {
        let bytes = self.leaf(IeType::NodeId)?;
        let result = NodeId::unmarshal(bytes).map(|n| n.as_string());
        self.record(result)
    }

    /// Drains the accumulated errors. An empty vec means every access in
    /// this chain succeeded.
    pub fn finish(self) -> Result<(), Vec<PfcpError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    pub fn errors(&self) -> &[PfcpError] {
        &self.errors
    }
}
