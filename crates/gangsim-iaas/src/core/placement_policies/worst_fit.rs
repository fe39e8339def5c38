//! Worst Fit strategy.

use crate::core::placement_policy::{is_suitable, PendingAssignments};
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VirtualMachine;

/// Uses the most underutilized viable host, preferring active hosts over
/// inactive ones before comparing free processing elements.
#[derive(Default)]
pub struct WorstFit;

impl WorstFit {
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
        let mut best_key: Option<(bool, u32)> = None;

        for host in pool_state.get_host_ids() {
            if Some(host) == current_host {
                continue;
            }
            if !is_suitable(pool_state, host, vm, pending.get(host)) {
                continue;
            }
            let key = (pool_state.is_active(host), pool_state.get_free_cores(host));
            if best_key.map_or(true, |best| key > best) {
                best_key = Some(key);
                result = Some(host);
            }
        }
        result
    }
}
