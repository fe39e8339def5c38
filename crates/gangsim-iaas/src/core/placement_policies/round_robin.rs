//! Round Robin strategy.

use crate::core::placement_policy::{is_suitable, PendingAssignments};
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VirtualMachine;

/// Iterates through hosts in a cyclic manner starting from a rotating cursor.
///
/// The cursor persists across calls and advances once per examined candidate
/// regardless of its suitability, wrapping modulo the inventory size.
#[derive(Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn select_host(
        &mut self,
        vm: &VirtualMachine,
        pool_state: &ResourcePoolState,
        current_host: Option<u32>,
        pending: &PendingAssignments,
    ) -> Option<u32> {
        let hosts = pool_state.get_host_ids();
        let host_count = hosts.len();
        if host_count == 0 {
            return None;
        }
        self.cursor %= host_count;

        for _ in 0..host_count {
            let candidate = hosts[self.cursor];
            self.cursor = (self.cursor + 1) % host_count;

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
