//! # Domain Invariants
//!
//! Rules that must hold for every group the registry holds.

use super::entities::GroupDescriptor;
use super::errors::{GroupError, GroupId, MAX_GROUP_ID, MIN_GROUP_ID};
use super::value_objects::GroupState;

/// Invariant: group ids stay inside `MIN_GROUP_ID..=MAX_GROUP_ID`.
pub fn invariant_group_id_in_range(group_id: i64) -> Result<GroupId, GroupError> {
    if group_id < i64::from(MIN_GROUP_ID) || group_id > i64::from(MAX_GROUP_ID) {
        return Err(GroupError::InvalidGroupId(group_id));
    }
    // Range checked above.
    Ok(group_id as GroupId)
}

/// Invariant: state changes follow the lifecycle edges only.
pub fn invariant_valid_transition(from: GroupState, to: GroupState) -> Result<(), GroupError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(GroupError::InvalidTransition { from, to })
    }
}

/// Invariant: a Running group always has a non-empty sealer list that
/// matches its genesis.
pub fn invariant_running_has_sealers(descriptor: &GroupDescriptor) -> bool {
    if descriptor.state != GroupState::Running {
        return true;
    }
    !descriptor.sealers.is_empty() && descriptor.sealers == descriptor.genesis.sealer_set()
}

/// Invariant: the descriptor's id agrees with its genesis.
pub fn invariant_descriptor_consistent(descriptor: &GroupDescriptor) -> bool {
    descriptor.group_id == descriptor.genesis.group.id
        && descriptor.created_at == descriptor.genesis.group.timestamp
}
