//! Structural merge properties and end-to-end modification scenarios (§4.4, §8).

use rs_pfcp::ie::schema::message_attrs;
use rs_pfcp::ie::{Ie, IeType};
use rs_pfcp::merge::{apply, compact};
use rs_pfcp::message::MsgType;
use std::net::Ipv4Addr;

fn stored_far(id: u32, action: u8) -> Ie {
    let mut ie = Ie::new_grouped(
        IeType::CreateFar,
        vec![
            Ie::new(IeType::FarId, id.to_be_bytes().to_vec()),
            Ie::new(IeType::ApplyAction, vec![action]),
            Ie::new_grouped(
                IeType::ForwardingParameters,
                vec![Ie::new(IeType::DestinationInterface, vec![1])],
            ),
        ],
    );
    ie.id = Some(id as u64);
    ie
}

fn modification_attrs() -> &'static [rs_pfcp::ie::schema::AttrEntry] {
    message_attrs(MsgType::SessionModificationRequest)
}

#[test]
fn merge_with_no_changes_is_idempotent() {
    let mut target = vec![stored_far(1, 0x02)];
    let before = target.clone();

    let errors = apply(&mut target, &[], modification_attrs());
    assert!(errors.is_empty());
    assert_eq!(target, before);
}

#[test]
fn applying_the_same_update_twice_yields_the_same_result() {
    let mut target = vec![stored_far(1_073_741_824, 0x04)];

    let mut update_far = Ie::new_grouped(
        IeType::UpdateFar,
        vec![
            Ie::new(IeType::FarId, 1_073_741_824u32.to_be_bytes().to_vec()),
            Ie::new(IeType::ApplyAction, vec![0x02]),
        ],
    );
    update_far.id = Some(1_073_741_824);

    let errors_once = apply(&mut target, std::slice::from_ref(&update_far), modification_attrs());
    assert!(errors_once.is_empty());
    let after_one = target.clone();

    let errors_twice = apply(&mut target, std::slice::from_ref(&update_far), modification_attrs());
    assert!(errors_twice.is_empty());
    assert_eq!(target, after_one, "re-applying an overwrite-only update must be a no-op");
}

/// Scenario 3 ("merge on modification"): FAR 1073741824 is updated from
/// BUFF to FORW, and its `ForwardingParameters` group gains an
/// `OuterHeaderCreation` while keeping the `DestinationInterface` it
/// already had — exercising the recursive by-type child merge, not a
/// wholesale group replacement.
#[test]
fn update_far_merges_forwarding_parameters_recursively() {
    let mut target = vec![stored_far(1_073_741_824, 0x04)];

    let outer_header_creation = rs_pfcp::ie::primitives::OuterHeaderCreation {
        teid: 1,
        ipv4: Ipv4Addr::new(162, 117, 1, 1),
    };

    let mut update_far = Ie::new_grouped(
        IeType::UpdateFar,
        vec![
            Ie::new(IeType::FarId, 1_073_741_824u32.to_be_bytes().to_vec()),
            Ie::new(IeType::ApplyAction, vec![0x02]),
            Ie::new_grouped(
                IeType::ForwardingParameters,
                vec![Ie::new(IeType::OuterHeaderCreation, outer_header_creation.marshal())],
            ),
        ],
    );
    update_far.id = Some(1_073_741_824);

    let errors = apply(&mut target, std::slice::from_ref(&update_far), modification_attrs());
    assert!(errors.is_empty());
    assert_eq!(target.len(), 1);

    let far = &target[0];
    let children = far.children().unwrap();

    let action = children.iter().find(|c| c.ie_type == IeType::ApplyAction).unwrap().leaf_bytes().unwrap();
    assert_eq!(action, &[0x02]);

    let fwd = children.iter().find(|c| c.ie_type == IeType::ForwardingParameters).unwrap();
    let fwd_children = fwd.children().unwrap();
    assert!(fwd_children.iter().any(|c| c.ie_type == IeType::DestinationInterface), "existing field must survive the merge");
    let ohc = fwd_children.iter().find(|c| c.ie_type == IeType::OuterHeaderCreation).unwrap();
    let parsed = rs_pfcp::ie::primitives::OuterHeaderCreation::unmarshal(ohc.leaf_bytes().unwrap()).unwrap();
    assert_eq!(parsed.teid, 1);
    assert_eq!(parsed.ipv4, Ipv4Addr::new(162, 117, 1, 1));
}

#[test]
fn remove_pdr_then_compact_drops_only_the_targeted_entry() {
    let mut pdr_a = Ie::new_grouped(IeType::CreatePdr, vec![Ie::new(IeType::PdrId, 1u16.to_be_bytes().to_vec())]);
    pdr_a.id = Some(1);
    let mut pdr_b = Ie::new_grouped(IeType::CreatePdr, vec![Ie::new(IeType::PdrId, 2u16.to_be_bytes().to_vec())]);
    pdr_b.id = Some(2);
    let mut target = vec![pdr_a, pdr_b];

    let mut remove_pdr = Ie::new_grouped(IeType::RemovePdr, vec![Ie::new(IeType::PdrId, 1u16.to_be_bytes().to_vec())]);
    remove_pdr.id = Some(1);

    let errors = apply(&mut target, &[remove_pdr], modification_attrs());
    assert!(errors.is_empty());
    compact(&mut target);

    assert_eq!(target.len(), 1);
    assert_eq!(target[0].id, Some(2));
}

#[test]
fn create_far_in_modification_request_inserts_a_new_session_branch() {
    let mut target = vec![stored_far(1, 0x02)];

    let mut new_far = Ie::new_grouped(
        IeType::CreateFar,
        vec![
            Ie::new(IeType::FarId, 2u32.to_be_bytes().to_vec()),
            Ie::new(IeType::ApplyAction, vec![0x01]),
        ],
    );
    new_far.id = Some(2);

    let errors = apply(&mut target, &[new_far], modification_attrs());
    assert!(errors.is_empty());
    assert_eq!(target.len(), 2);
}
