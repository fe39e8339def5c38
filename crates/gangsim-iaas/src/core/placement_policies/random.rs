//! Random Fit strategy.

use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::core::placement_policy::{is_suitable, PendingAssignments};
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VirtualMachine;

/// Draws hosts at random and uses the first viable one.
///
/// Attempts at most as many draws as there are hosts in the inventory;
/// a draw landing on the current host consumes a try.
pub struct RandomFit {
    rand: Pcg64,
}

impl RandomFit {
    pub fn new(seed: u64) -> Self {
        Self {
            rand: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn select_host(
        &mut self,
        vm: &VirtualMachine,
        pool_state: &ResourcePoolState,
        current_host: Option<u32>,
        pending: &PendingAssignments,
    ) -> Option<u32> {
        let hosts = pool_state.get_host_ids();
        let max_tries = hosts.len();

        for _ in 0..max_tries {
            let index = (self.rand.gen_range(0.0..1.0) * hosts.len() as f64) as usize;
            let candidate = hosts[index];

            if Some(candidate) == current_host {
                continue;
            }
            if is_suitable(pool_state, candidate, vm, pending.get(candidate)) {
                return Some(candidate);
            }
        }
        None
    }
}
