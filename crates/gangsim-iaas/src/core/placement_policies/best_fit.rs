//! Best Fit strategy.

use crate::core::placement_policy::{is_suitable, PendingAssignments};
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VirtualMachine;

/// Uses the viable host with the fewest free processing elements,
/// which minimizes fragmentation.
#[derive(Default)]
pub struct BestFit;

impl BestFit {
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
        let mut result: Option<u32> = None;
        let mut min_free_cores = u32::MAX;

        for host in pool_state.get_host_ids() {
            if Some(host) == current_host {
                continue;
            }
            if is_suitable(pool_state, host, vm, pending.get(host))
                && pool_state.get_free_cores(host) < min_free_cores
            {
                min_free_cores = pool_state.get_free_cores(host);
                result = Some(host);
            }
        }
        result
    }
}
