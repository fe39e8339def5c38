//! First Fit strategy.

use crate::core::placement_policy::{is_suitable, PendingAssignments};
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VirtualMachine;

/// Uses the first viable host in inventory order.
#[derive(Default)]
pub struct FirstFit;

impl FirstFit {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn select_host(
        &self,
        vm: &VirtualMachine,
        pool_state: &ResourcePoolState,
        current_host: Option<u32>,
        pending: &PendingAssignments,
    ) -> Option<u32> {
        for host in pool_state.get_host_ids() {
            if Some(host) == current_host {
                continue;
            }
            if is_suitable(pool_state, host, vm, pending.get(host)) {
                return Some(host);
            }
        }
        None
    }
}
