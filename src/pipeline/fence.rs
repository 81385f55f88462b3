//! Per-group request fencing.
//!
//! Every issued request gets a ticket carrying a generation number that is
//! monotonic within its group. Only the latest ticket of a group may change
//! state; responses to older tickets are stale.

use crate::models::{Group, GroupState};

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub group: Group,
    pub generation: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    latest: u64,
    state: GroupState,
}

/// Generation counters and lifecycle state, one slot per group.
#[derive(Debug, Default)]
pub struct Fence {
    slots: [Slot; Group::COUNT],
}

impl Fence {
    /// Issue a new ticket, superseding any outstanding one for the group.
    pub fn issue(&mut self, group: Group) -> Ticket {
        let slot = &mut self.slots[group.index()];
        slot.latest += 1;
        slot.state = GroupState::Pending;

        Ticket {
            group,
            generation: slot.latest,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.slots[ticket.group.index()].latest == ticket.generation
    }

    /// Record the outcome of a ticket. Stale tickets are ignored.
    pub fn settle(&mut self, ticket: Ticket, succeeded: bool) {
        if !self.is_current(ticket) {
            return;
        }
        self.slots[ticket.group.index()].state = if succeeded {
            GroupState::Succeeded
        } else {
            GroupState::Failed
        };
    }

    /// Mark a group failed without issuing a request, for actions rejected
    /// before any call was made. An outstanding ticket keeps its state.
    pub fn reject(&mut self, group: Group) {
        let slot = &mut self.slots[group.index()];
        if slot.state != GroupState::Pending {
            slot.state = GroupState::Failed;
        }
    }

    pub fn state(&self, group: Group) -> GroupState {
        self.slots[group.index()].state
    }

    /// Generation of the most recently issued ticket, 0 if none.
    pub fn latest(&self, group: Group) -> u64 {
        self.slots[group.index()].latest
    }
}
