//! Schema validation of an IE tree against the tables in [`crate::ie::schema`]
//! (§4.2). Every violation in the tree is collected rather than stopping at
//! the first, and each group node's `id` field is filled in from its isID
//! child as a side effect — callers that only need the id (the merge engine,
//! §4.4) should call [`populate_ids`] even when they don't care about the
//! returned violations.

use crate::error::PfcpError;
use crate::ie::{schema, schema::AttrEntry, Ie, IeBody, IeType};
use crate::message::{Message, MsgType};
use std::collections::HashMap;

/// Validates every IE in `ies` against `attrs`, recursing into group
/// children against their own schema, and returns every violation found.
/// Also fills in `id` on any group child that is itself a schema-known
/// group (§4.2 step 3).
pub fn validate_set(ies: &mut [Ie], attrs: &[AttrEntry], parent: IeType) -> Vec<PfcpError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<IeType, usize> = HashMap::new();

    for ie in ies.iter() {
        match schema::find_attr(attrs, ie.ie_type) {
            Some(attr) => {
                let count = seen.entry(ie.ie_type).or_insert(0);
                *count += 1;
                if *count > 1 && !attr.multiple {
                    errors.push(PfcpError::DuplicateIe { ie_type: ie.ie_type, parent });
                }
            }
            None => errors.push(PfcpError::UnexpectedIe { ie_type: ie.ie_type, parent }),
        }
    }

    for (ie_type, attr) in attrs {
        if attr.required && !seen.contains_key(ie_type) {
            errors.push(PfcpError::MissingRequiredIe { ie_type: *ie_type, parent });
        }
    }

    for ie in ies.iter_mut() {
        if let IeBody::Group(children) = &mut ie.body {
            if let Some(child_attrs) = schema::group_attrs(ie.ie_type) {
                errors.extend(validate_set(children, child_attrs, ie.ie_type));
                errors.extend(populate_group_id(ie.ie_type, children, &mut ie.id));
            }
        }
    }

    errors
}

/// Finds the child marked `is_id` in `attrs` (there is at most one per
/// schema table) and copies its scalar value into `id`.
fn populate_group_id(parent: IeType, children: &[Ie], id: &mut Option<u64>) -> Vec<PfcpError> {
    let Some(attrs) = schema::group_attrs(parent) else {
        return Vec::new();
    };
    let Some((id_type, _)) = attrs.iter().find(|(_, a)| a.is_id) else {
        return Vec::new();
    };
    match children.iter().find(|c| c.ie_type == *id_type) {
        Some(child) => match child.leaf_bytes() {
            Some(bytes) if !bytes.is_empty() => {
                let mut buf = [0u8; 8];
                let n = bytes.len().min(8);
                buf[8 - n..].copy_from_slice(&bytes[..n]);
                *id = Some(u64::from_be_bytes(buf));
                Vec::new()
            }
            _ => vec![PfcpError::IdMissing { parent }],
        },
        None => vec![PfcpError::IdMissing { parent }],
    }
}

/// Validates a whole message against its message-type schema (§4.2 step 1-2),
/// mutating its IEs in place to populate group ids.
pub fn validate_message(msg: &mut Message) -> Vec<PfcpError> {
    let msg_type = msg.msg_type();
    let attrs = schema::message_attrs(msg_type);
    validate_message_ies(&mut msg.ies, attrs, msg_type)
}

fn validate_message_ies(ies: &mut [Ie], attrs: &[AttrEntry], msg_type: MsgType) -> Vec<PfcpError> {
    // Message-level validation reuses the group algorithm with a synthetic
    // "parent" marker: the message type has no IeType of its own, so errors
    // report the first IE type in the schema as a stand-in label when the
    // tree itself is empty, falling back to `Unknown` otherwise (§4.2 note).
    let parent = attrs.first().map(|(t, _)| *t).unwrap_or(IeType::Unknown);
    validate_set(ies, attrs, parent)
}
