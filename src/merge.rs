//! Structural merge engine (§4.4): applies a Session Modification Request's
//! Update-/Remove-/Create- IEs onto a stored session's IE tree.
//!
//! The schema tables mark each modification IE with an `is_update`/
//! `is_delete` flag and a `base_ie` it targets (e.g. `UpdateFar` targets
//! `CreateFar`). Three operations result, keyed by the modification IE's
//! IE-ID child:
//!
//! - **INSERT**: a plain `CreateFar`/`CreatePdr`/... with an id not present
//!   in the stored set is appended.
//! - **UPDATE**: an `UpdateFar`/... whose id matches a stored `CreateFar`
//!   replaces that entry's non-id fields, leaving the stored entry's base
//!   type and id intact.
//! - **DELETE**: a `RemoveFar`/... whose id matches a stored entry replaces
//!   it with the null sentinel (§9 "Null IE sentinel") rather than shifting
//!   the vector, so concurrent iteration by index stays valid; sentinels
//!   are dropped at the next serialization.

use crate::error::PfcpError;
use crate::ie::{schema, Ie, IeType};

/// Applies every Update-/Remove-/Create- IE in `changes` onto `target`,
/// which is assumed to already be schema-validated (its `id` fields
/// populated, per [`crate::validator::validate_set`]).
pub fn apply(target: &mut Vec<Ie>, changes: &[Ie], schema_attrs: &[schema::AttrEntry]) -> Vec<PfcpError> {
    let mut errors = Vec::new();

    for change in changes {
        let Some(attr) = schema::find_attr(schema_attrs, change.ie_type) else {
            continue;
        };

        if attr.is_delete {
            let Some(base_ie) = attr.base_ie else {
                errors.push(PfcpError::MergeSchemaMissing { ie_type: change.ie_type });
                continue;
            };
            let Some(id) = change.id.or_else(|| scalar_id(change)) else {
                errors.push(PfcpError::MergeIdMissing { ie_type: change.ie_type });
                continue;
            };
            match target.iter_mut().find(|ie| ie.ie_type == base_ie && ie.id == Some(id)) {
                Some(slot) => *slot = Ie::null_sentinel(),
                None => errors.push(PfcpError::MergeTargetMissing { ie_type: base_ie }),
            }
            continue;
        }

        if attr.is_update {
            let Some(base_ie) = attr.base_ie else {
                errors.push(PfcpError::MergeSchemaMissing { ie_type: change.ie_type });
                continue;
            };
            let Some(id) = change.id.or_else(|| scalar_id(change)) else {
                errors.push(PfcpError::MergeIdMissing { ie_type: change.ie_type });
                continue;
            };
            match target.iter_mut().find(|ie| ie.ie_type == base_ie && ie.id == Some(id)) {
                Some(slot) => merge_fields(slot, change),
                None => errors.push(PfcpError::MergeTargetMissing { ie_type: base_ie }),
            }
            continue;
        }

        // A plain Create* among the modification IEs (§4.4 INSERT case):
        // matching entry is replaced, otherwise appended. `multiple` IEs
        // match on equal IE-ID; non-multiple IEs match on type alone.
        let existing = if attr.multiple {
            change
                .id
                .and_then(|id| target.iter_mut().find(|ie| ie.ie_type == change.ie_type && ie.id == Some(id)))
        } else {
            target.iter_mut().find(|ie| ie.ie_type == change.ie_type)
        };
        match existing {
            Some(slot) => *slot = change.clone(),
            None => target.push(change.clone()),
        }
    }

    errors
}

/// Replaces every non-id field of `slot`'s children with `update`'s, by IE
/// type: an update's child of type T overwrites `slot`'s child of type T
/// (dropping the old one), fields absent from `update` are left untouched,
/// and the IE-ID child itself is never touched.
fn merge_fields(slot: &mut Ie, update: &Ie) {
    let Some(update_children) = update.children() else { return };
    let Some(slot_children) = slot.children_mut() else { return };

    let id_type = schema::group_attrs(slot.ie_type)
        .and_then(|attrs| attrs.iter().find(|(_, a)| a.is_id))
        .map(|(t, _)| *t);
    let update_attrs = schema::group_attrs(update.ie_type);

    for new_child in update_children {
        if Some(new_child.ie_type) == id_type {
            continue;
        }

        // A nested update-variant child (e.g. UpdateForwardingParameters)
        // targets its base_ie (ForwardingParameters) rather than being
        // stored under its own type, mirroring the original's base-type
        // conversion before merging.
        let target_type = update_attrs
            .and_then(|attrs| schema::find_attr(attrs, new_child.ie_type))
            .and_then(|attr| attr.is_update.then_some(attr.base_ie).flatten())
            .unwrap_or(new_child.ie_type);

        // An UpdateForwardingParameters child merges recursively into the
        // stored ForwardingParameters rather than replacing it wholesale
        // (§3.A supplemented behavior), since FAR updates commonly touch
        // only the outer-header-creation field.
        if let Some(existing) = slot_children.iter_mut().find(|c| c.ie_type == target_type) {
            if existing.is_group() && new_child.is_group() {
                merge_children_by_type(existing, new_child);
                continue;
            }
            *existing = rebased(new_child, target_type);
        } else {
            slot_children.push(rebased(new_child, target_type));
        }
    }
}

/// Clones `ie` with its type rewritten to `ie_type`, used when an
/// update-variant child (`UpdateForwardingParameters`) is stored or
/// inserted under its `base_ie` instead of its own wire type.
fn rebased(ie: &Ie, ie_type: IeType) -> Ie {
    let mut clone = ie.clone();
    clone.ie_type = ie_type;
    clone
}

fn merge_children_by_type(slot: &mut Ie, update: &Ie) {
    let Some(update_children) = update.children() else { return };
    let Some(slot_children) = slot.children_mut() else { return };
    for new_child in update_children {
        if let Some(existing) = slot_children.iter_mut().find(|c| c.ie_type == new_child.ie_type) {
            *existing = new_child.clone();
        } else {
            slot_children.push(new_child.clone());
        }
    }
}

/// Falls back to reading a Remove* IE's sole id-shaped leaf child directly,
/// for schema entries (`RemoveFar` etc.) whose group holds nothing but the
/// id — these are validated like any other group, but callers that build a
/// change set by hand may not have run the validator first.
fn scalar_id(ie: &Ie) -> Option<u64> {
    let children = ie.children()?;
    let (id_type, _) = schema::group_attrs(ie.ie_type)?.iter().find(|(_, a)| a.is_id)?;
    let bytes = children.iter().find(|c| c.ie_type == *id_type)?.leaf_bytes()?;
    if bytes.is_empty() {
        return None;
    }
    let mut buf = [0u8; 8];
    let n = bytes.len().min(8);
    buf[8 - n..].copy_from_slice(&bytes[..n]);
    Some(u64::from_be_bytes(buf))
}

/// Drops every null sentinel left behind by a delete, leaving the tree fit
/// to serialize or to read back as the new stored state.
pub fn compact(target: &mut Vec<Ie>) {
    target.retain(|ie| !ie.is_null_sentinel());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ie::schema::message_attrs;
    use crate::message::MsgType;
    fn far(id: u32, action: u8) -> Ie {
        Ie::new_grouped(
            IeType::CreateFar,
            vec![
                Ie::new(IeType::FarId, id.to_be_bytes().to_vec()),
                Ie::new(IeType::ApplyAction, vec![action]),
            ],
        )
    }

    #[test]
    fn update_far_replaces_apply_action_and_keeps_id() {
        let mut target = vec![far(1, 0x02)];
        // Populate id the way the validator would.
        target[0].id = Some(1);

        let update_far = {
            let mut ie = Ie::new_grouped(
                IeType::UpdateFar,
                vec![
                    Ie::new(IeType::FarId, 1u32.to_be_bytes().to_vec()),
                    Ie::new(IeType::ApplyAction, vec![0x01]),
                ],
            );
            ie.id = Some(1);
            ie
        };

        let attrs = message_attrs(MsgType::SessionModificationRequest);
        let errors = apply(&mut target, std::slice::from_ref(&update_far), attrs);
        assert!(errors.is_empty());
        assert_eq!(target.len(), 1);
        let action = target[0]
            .children()
            .unwrap()
            .iter()
            .find(|c| c.ie_type == IeType::ApplyAction)
            .unwrap()
            .leaf_bytes()
            .unwrap();
        assert_eq!(action, &[0x01]);
    }

    #[test]
    fn update_far_with_unpopulated_id_falls_back_to_its_own_far_id_child() {
        // Simulates a freshly unmarshaled modification request: `id` is
        // `None` because nothing ran the validator over it yet.
        let mut target = vec![far(1, 0x02)];
        target[0].id = Some(1);

        let update_far = Ie::new_grouped(
            IeType::UpdateFar,
            vec![
                Ie::new(IeType::FarId, 1u32.to_be_bytes().to_vec()),
                Ie::new(IeType::ApplyAction, vec![0x01]),
            ],
        );
        assert_eq!(update_far.id, None);

        let attrs = message_attrs(MsgType::SessionModificationRequest);
        let errors = apply(&mut target, std::slice::from_ref(&update_far), attrs);
        assert!(errors.is_empty(), "expected the FarId child to be read as a fallback, got {:?}", errors);
        let action = target[0].children().unwrap().iter().find(|c| c.ie_type == IeType::ApplyAction).unwrap().leaf_bytes().unwrap();
        assert_eq!(action, &[0x01]);
    }

    #[test]
    fn remove_far_replaces_entry_with_null_sentinel() {
        let mut target = vec![far(1, 0x02)];
        target[0].id = Some(1);

        let mut remove_far = Ie::new_grouped(IeType::RemoveFar, vec![Ie::new(IeType::FarId, 1u32.to_be_bytes().to_vec())]);
        remove_far.id = Some(1);

        let attrs = message_attrs(MsgType::SessionModificationRequest);
        let errors = apply(&mut target, &[remove_far], attrs);
        assert!(errors.is_empty());
        assert!(target[0].is_null_sentinel());

        compact(&mut target);
        assert!(target.is_empty());
    }

    #[test]
    fn update_missing_target_is_reported() {
        let mut target: Vec<Ie> = vec![];
        let mut update_far = Ie::new_grouped(
            IeType::UpdateFar,
            vec![Ie::new(IeType::FarId, 9u32.to_be_bytes().to_vec())],
        );
        update_far.id = Some(9);

        let attrs = message_attrs(MsgType::SessionModificationRequest);
        let errors = apply(&mut target, &[update_far], attrs);
        assert!(matches!(errors[0], PfcpError::MergeTargetMissing { .. }));
    }

    #[test]
    fn update_forwarding_parameters_child_is_rebased_to_forwarding_parameters() {
        let mut far_with_fwd = Ie::new_grouped(
            IeType::CreateFar,
            vec![
                Ie::new(IeType::FarId, 1u32.to_be_bytes().to_vec()),
                Ie::new(IeType::ApplyAction, vec![0x04]),
                Ie::new_grouped(
                    IeType::ForwardingParameters,
                    vec![Ie::new(IeType::DestinationInterface, vec![1])],
                ),
            ],
        );
        far_with_fwd.id = Some(1);
        let mut target = vec![far_with_fwd];

        let mut update_far = Ie::new_grouped(
            IeType::UpdateFar,
            vec![
                Ie::new(IeType::FarId, 1u32.to_be_bytes().to_vec()),
                Ie::new(IeType::ApplyAction, vec![0x02]),
                Ie::new_grouped(
                    IeType::UpdateForwardingParameters,
                    vec![Ie::new(IeType::OuterHeaderCreation, vec![0x01, 0x00, 0, 0, 0, 1, 10, 0, 0, 1])],
                ),
            ],
        );
        update_far.id = Some(1);

        let attrs = message_attrs(MsgType::SessionModificationRequest);
        let errors = apply(&mut target, std::slice::from_ref(&update_far), attrs);
        assert!(errors.is_empty());

        let children = target[0].children().unwrap();
        // The stored tree must hold a ForwardingParameters child, not an
        // UpdateForwardingParameters one.
        assert!(children.iter().any(|c| c.ie_type == IeType::ForwardingParameters));
        assert!(!children.iter().any(|c| c.ie_type == IeType::UpdateForwardingParameters));

        let fwd = children.iter().find(|c| c.ie_type == IeType::ForwardingParameters).unwrap();
        let fwd_children = fwd.children().unwrap();
        assert!(fwd_children.iter().any(|c| c.ie_type == IeType::DestinationInterface), "existing field must survive the merge");
        assert!(fwd_children.iter().any(|c| c.ie_type == IeType::OuterHeaderCreation));
    }

    #[test]
    fn plain_create_far_in_modification_request_is_inserted() {
        let mut target: Vec<Ie> = vec![];
        let mut new_far = far(2, 0x02);
        new_far.id = Some(2);

        let attrs = message_attrs(MsgType::SessionModificationRequest);
        let errors = apply(&mut target, &[new_far], attrs);
        assert!(errors.is_empty());
        assert_eq!(target.len(), 1);
    }
}
