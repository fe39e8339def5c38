//! Brute-force reference strategy.

use crate::core::placement_policy::{is_suitable, PendingAssignments};
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VirtualMachine;

/// Evaluates every host by hypothetically adding the VM to its pending list
/// and uses the viable host yielding the highest CPU utilization ratio.
/// Serves as an upper-bound reference for the cheaper heuristics.
#[derive(Default)]
pub struct BruteForce;

impl BruteForce {
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
        let mut best_utilization = -1.;

        for host in pool_state.get_host_ids() {
            if Some(host) == current_host {
                continue;
            }

            let mut pending_vms = pending.get(host).to_vec();
            pending_vms.push(vm.clone());

            if !is_suitable(pool_state, host, vm, &pending_vms) {
                continue;
            }

            let total_mips = pool_state.get_total_cpu(host) as f64;
            let used_mips = pool_state.get_allocated_cpu(host) as f64
                + pending_vms.iter().map(|pending_vm| pending_vm.cpu_mips as f64).sum::<f64>();

            let utilization = if total_mips > 0. { used_mips / total_mips } else { 0. };
            if utilization > best_utilization {
                best_utilization = utilization;
                best_host = Some(host);
            }
        }
        best_host
    }
}
