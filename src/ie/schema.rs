//! Declarative IE schema: which child IE types a group IE or message type
//! permits, and with what cardinality/role (§4.2).
//!
//! These tables are the single source of truth consulted by the parser (to
//! decide whether a type code is a group), the validator, the accessor, and
//! the merge engine — "schema-driven everything" (§9). Grounded in the
//! `groupIeAttributeSets` / `MessageIeAttributeSets` tables of
//! `examples/original_source/pfcp/ie.go`.

use crate::ie::IeType;
use crate::message::MsgType;

/// Per-child-IE attribute flags within a group IE or message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub required: bool,
    pub multiple: bool,
    pub is_id: bool,
    pub is_update: bool,
    pub is_delete: bool,
    pub base_ie: Option<IeType>,
}

impl Attr {
    const NONE: Attr = Attr {
        required: false,
        multiple: false,
        is_id: false,
        is_update: false,
        is_delete: false,
        base_ie: None,
    };

    const fn req() -> Attr {
        Attr { required: true, ..Attr::NONE }
    }

    const fn req_id() -> Attr {
        Attr { required: true, is_id: true, ..Attr::NONE }
    }

    const fn multi() -> Attr {
        Attr { multiple: true, ..Attr::NONE }
    }

    const fn req_multi() -> Attr {
        Attr { required: true, multiple: true, ..Attr::NONE }
    }

    const fn update(base_ie: IeType) -> Attr {
        Attr { multiple: true, is_update: true, base_ie: Some(base_ie), ..Attr::NONE }
    }

    const fn delete(base_ie: IeType) -> Attr {
        Attr { multiple: true, is_delete: true, base_ie: Some(base_ie), ..Attr::NONE }
    }
}

/// A (child type, attribute) pair, in declaration order.
pub type AttrEntry = (IeType, Attr);

macro_rules! plain {
    () => {
        Attr::NONE
    };
}

const CREATE_PDR: &[AttrEntry] = &[
    (IeType::PdrId, Attr::req_id()),
    (IeType::Pdi, Attr::req()),
    (IeType::Precedence, plain!()),
    (IeType::OuterHeaderRemoval, plain!()),
    (IeType::FarId, plain!()),
    (IeType::UrrId, plain!()),
    (IeType::QerId, Attr::multi()),
];

const CREATE_FAR: &[AttrEntry] = &[
    (IeType::FarId, Attr::req_id()),
    (IeType::ForwardingParameters, plain!()),
    (IeType::BarId, plain!()),
    (IeType::ApplyAction, plain!()),
];

const CREATE_URR: &[AttrEntry] = &[
    (IeType::UrrId, Attr::req_id()),
    (IeType::VolumeThreshold, plain!()),
    (IeType::MonitoringTime, plain!()),
    (IeType::ReportingTriggers, plain!()),
    (IeType::MeasurementMethod, plain!()),
];

const CREATE_BAR: &[AttrEntry] = &[(IeType::BarId, Attr::req_id())];

const CREATE_QER: &[AttrEntry] = &[
    (IeType::QerId, Attr::req_id()),
    (IeType::GateStatus, plain!()),
    (IeType::Mbr, plain!()),
    (IeType::Gbr, plain!()),
    (IeType::Qfi, plain!()),
];

const PDI: &[AttrEntry] = &[
    (IeType::SourceInterface, Attr::req()),
    (IeType::Fteid, plain!()),
    (IeType::NetworkInstance, plain!()),
    (IeType::UeIpAddress, plain!()),
    (IeType::Qfi, plain!()),
    (IeType::SdfFilter, plain!()),
];

const FORWARDING_PARAMETERS: &[AttrEntry] = &[
    (IeType::DestinationInterface, plain!()),
    (IeType::NetworkInstance, plain!()),
    (IeType::OuterHeaderCreation, plain!()),
];

const UPDATE_FORWARDING_PARAMETERS: &[AttrEntry] = &[
    (IeType::DestinationInterface, plain!()),
    (IeType::NetworkInstance, plain!()),
    (IeType::OuterHeaderCreation, plain!()),
    (IeType::PfcpsmReqFlags, plain!()),
];

const CREATED_PDR: &[AttrEntry] = &[
    (IeType::PdrId, Attr::req_id()),
    (IeType::Precedence, plain!()),
    (IeType::Pdi, plain!()),
    (IeType::OuterHeaderRemoval, plain!()),
    (IeType::FarId, plain!()),
    (IeType::QerId, Attr::multi()),
    (IeType::Fteid, plain!()),
];

const UPDATE_FAR: &[AttrEntry] = &[
    (IeType::ForwardingParameters, plain!()),
    (IeType::UpdateForwardingParameters, Attr::update(IeType::ForwardingParameters)),
    (IeType::ApplyAction, plain!()),
    (IeType::FarId, Attr::req_id()),
    (IeType::BarId, plain!()),
];

const UPDATE_PDR: &[AttrEntry] = &[
    (IeType::PdrId, Attr::req_id()),
    (IeType::Pdi, plain!()),
    (IeType::Precedence, plain!()),
    (IeType::OuterHeaderRemoval, plain!()),
    (IeType::FarId, plain!()),
    (IeType::UrrId, plain!()),
    (IeType::QerId, Attr::multi()),
];

const REMOVE_FAR: &[AttrEntry] = &[(IeType::FarId, Attr::req_id())];
const REMOVE_PDR: &[AttrEntry] = &[(IeType::PdrId, Attr::req_id())];
const REMOVE_URR: &[AttrEntry] = &[(IeType::UrrId, Attr::req_id())];
const REMOVE_QER: &[AttrEntry] = &[(IeType::QerId, Attr::req_id())];
const REMOVE_BAR: &[AttrEntry] = &[(IeType::BarId, Attr::req_id())];

/// Looks up the attribute set for a group IE type. `None` means the type is
/// not a recognized group — at parse time this means it is treated as a leaf.
pub fn group_attrs(ie_type: IeType) -> Option<&'static [AttrEntry]> {
    match ie_type {
        IeType::CreatePdr => Some(CREATE_PDR),
        IeType::CreateFar => Some(CREATE_FAR),
        IeType::CreateUrr => Some(CREATE_URR),
        IeType::CreateBar => Some(CREATE_BAR),
        IeType::CreateQer => Some(CREATE_QER),
        IeType::Pdi => Some(PDI),
        IeType::ForwardingParameters => Some(FORWARDING_PARAMETERS),
        IeType::UpdateForwardingParameters => Some(UPDATE_FORWARDING_PARAMETERS),
        IeType::CreatedPdr => Some(CREATED_PDR),
        IeType::UpdateFar => Some(UPDATE_FAR),
        IeType::UpdatePdr => Some(UPDATE_PDR),
        IeType::RemoveFar => Some(REMOVE_FAR),
        IeType::RemovePdr => Some(REMOVE_PDR),
        IeType::RemoveUrr => Some(REMOVE_URR),
        IeType::RemoveQer => Some(REMOVE_QER),
        IeType::RemoveBar => Some(REMOVE_BAR),
        _ => None,
    }
}

/// Returns whether `ie_type` is a group IE per the schema (§3: "identified by
/// the schema's group-type set").
pub fn is_group(ie_type: IeType) -> bool {
    group_attrs(ie_type).is_some()
}

const HEARTBEAT_REQUEST: &[AttrEntry] = &[
    (IeType::RecoveryTimeStamp, Attr::req()),
    (IeType::SourceIpAddress, plain!()),
];
const HEARTBEAT_RESPONSE: &[AttrEntry] = &[(IeType::RecoveryTimeStamp, Attr::req())];

const ASSOCIATION_SETUP_REQUEST: &[AttrEntry] = &[
    (IeType::NodeId, Attr::req()),
    (IeType::RecoveryTimeStamp, Attr::req()),
    (IeType::CpFunctionFeatures, plain!()),
    (IeType::UpFunctionFeatures, plain!()),
];
const ASSOCIATION_SETUP_RESPONSE: &[AttrEntry] = &[
    (IeType::Cause, Attr::req()),
    (IeType::NodeId, Attr::req()),
    (IeType::RecoveryTimeStamp, Attr::req()),
    (IeType::CpFunctionFeatures, plain!()),
    (IeType::UpFunctionFeatures, plain!()),
    (IeType::UserPlaneIpResourceInformation, plain!()),
];

const SESSION_ESTABLISHMENT_REQUEST: &[AttrEntry] = &[
    (IeType::NodeId, Attr::req()),
    (IeType::Fseid, Attr::req()),
    (IeType::CreatePdr, Attr::req_multi()),
    (IeType::CreateFar, Attr::req_multi()),
    (IeType::CreateUrr, Attr::multi()),
    (IeType::CreateQer, Attr::multi()),
    (IeType::CreateBar, Attr::multi()),
    (IeType::PdnType, plain!()),
    (IeType::UserId, plain!()),
    (IeType::ApnDnn, plain!()),
    (IeType::SdfFilter, plain!()),
    (IeType::Snssai, plain!()),
];
const SESSION_ESTABLISHMENT_RESPONSE: &[AttrEntry] = &[
    (IeType::NodeId, Attr::req()),
    (IeType::Fseid, plain!()),
    (IeType::CreatedPdr, Attr::multi()),
    (IeType::Cause, Attr::req()),
];

const SESSION_MODIFICATION_REQUEST: &[AttrEntry] = &[
    (IeType::UpdateFar, Attr::update(IeType::CreateFar)),
    (IeType::UpdatePdr, Attr::update(IeType::CreatePdr)),
    (IeType::RemoveFar, Attr::delete(IeType::CreateFar)),
    (IeType::RemovePdr, Attr::delete(IeType::CreatePdr)),
    (IeType::CreateFar, Attr::multi()),
    (IeType::CreatePdr, Attr::multi()),
];
const SESSION_MODIFICATION_RESPONSE: &[AttrEntry] = &[(IeType::Cause, Attr::req())];

const SESSION_DELETION_RESPONSE: &[AttrEntry] = &[(IeType::Cause, Attr::req())];

const SESSION_REPORT_RESPONSE: &[AttrEntry] = &[(IeType::Cause, Attr::req())];

/// Looks up the top-level attribute set for a message type. Message types
/// with no entries below (e.g. Association/Session Release/Deletion
/// requests, which carry no mandatory body IEs in this profile) return an
/// empty slice.
pub fn message_attrs(msg_type: MsgType) -> &'static [AttrEntry] {
    match msg_type {
        MsgType::HeartbeatRequest => HEARTBEAT_REQUEST,
        MsgType::HeartbeatResponse => HEARTBEAT_RESPONSE,
        MsgType::AssociationSetupRequest => ASSOCIATION_SETUP_REQUEST,
        MsgType::AssociationSetupResponse => ASSOCIATION_SETUP_RESPONSE,
        MsgType::SessionEstablishmentRequest => SESSION_ESTABLISHMENT_REQUEST,
        MsgType::SessionEstablishmentResponse => SESSION_ESTABLISHMENT_RESPONSE,
        MsgType::SessionModificationRequest => SESSION_MODIFICATION_REQUEST,
        MsgType::SessionModificationResponse => SESSION_MODIFICATION_RESPONSE,
        MsgType::SessionDeletionResponse => SESSION_DELETION_RESPONSE,
        MsgType::SessionReportResponse => SESSION_REPORT_RESPONSE,
        _ => &[],
    }
}

/// Finds the attribute entry for `ie_type` within `set`, if any.
pub fn find_attr(set: &[AttrEntry], ie_type: IeType) -> Option<Attr> {
    set.iter().find(|(t, _)| *t == ie_type).map(|(_, a)| *a)
}
