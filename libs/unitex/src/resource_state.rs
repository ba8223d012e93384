// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! D3D12 resource state transitions for copy destinations.

/// `D3D12_RESOURCE_STATE_COPY_DEST`.
pub const RESOURCE_STATE_COPY_DEST: i32 = 0x400;

/// A `D3D12_RESOURCE_BARRIER_TYPE_TRANSITION` to record before the copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub before: i32,
    pub after: i32,
}

/// Barrier needed to make a texture a copy destination.
///
/// `current` is the state Unity reports the resource will be in once the
/// command lists it queued before this plugin call have executed; `None`
/// means Unity does not track the resource, in which case it is assumed to
/// already be in `COPY_DEST`.
pub fn plan_copy_dest_transition(current: Option<i32>) -> Option<StateTransition> {
    match current {
        Some(state) if state != RESOURCE_STATE_COPY_DEST => Some(StateTransition {
            before: state,
            after: RESOURCE_STATE_COPY_DEST,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE
    const PIXEL_SHADER_RESOURCE: i32 = 0x80;

    #[test]
    fn test_transition_from_shader_resource() {
        assert_eq!(
            plan_copy_dest_transition(Some(PIXEL_SHADER_RESOURCE)),
            Some(StateTransition {
                before: PIXEL_SHADER_RESOURCE,
                after: RESOURCE_STATE_COPY_DEST
            })
        );
    }

    #[test]
    fn test_no_barrier_when_already_copy_dest() {
        assert_eq!(plan_copy_dest_transition(Some(RESOURCE_STATE_COPY_DEST)), None);
    }

    #[test]
    fn test_no_barrier_when_untracked() {
        assert_eq!(plan_copy_dest_transition(None), None);
    }

    #[test]
    fn test_common_state_needs_barrier() {
        assert!(plan_copy_dest_transition(Some(0)).is_some());
    }
}
