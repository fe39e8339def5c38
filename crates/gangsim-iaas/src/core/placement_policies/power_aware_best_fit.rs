//! Power-Aware Best Fit Decreasing strategy.

use crate::core::placement_policy::{is_suitable, PendingAssignments};
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VirtualMachine;

/// Uses the viable host with the minimum increase in modeled power draw after
/// placing the VM. Inactive hosts are skipped in addition to the generic
/// suitability check.
#[derive(Default)]
pub struct PowerAwareBestFit;

impl PowerAwareBestFit {
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
        let mut best_host: Option<u32> = None;
        let mut best_delta_power = f64::MAX;

        for host in pool_state.get_host_ids() {
            if !pool_state.is_active(host) || Some(host) == current_host {
                continue;
            }
            let pending_vms = pending.get(host);
            if !is_suitable(pool_state, host, vm, pending_vms) {
                continue;
            }

            let delta = estimate_delta_power(pool_state, host, vm, pending_vms);
            if delta < best_delta_power {
                best_delta_power = delta;
                best_host = Some(host);
            }
        }
        best_host
    }
}

fn estimate_delta_power(pool_state: &ResourcePoolState, host: u32, vm: &VirtualMachine, pending: &[VirtualMachine]) -> f64 {
    let total_mips = pool_state.get_total_cpu(host) as f64;

    let utilization_now = pool_state.get_cpu_allocation_ratio(host).clamp(0., 1.);
    let power_now = pool_state.get_power(host, utilization_now);

    let used_mips = pool_state.get_allocated_cpu(host) as f64
        + pending.iter().map(|pending_vm| pending_vm.cpu_mips as f64).sum::<f64>()
        + vm.cpu_mips as f64;
    let utilization_after = (used_mips / total_mips).clamp(0., 1.);
    let power_after = pool_state.get_power(host, utilization_after);

    power_after - power_now
}
