//! Host inventory and resource pool state.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::core::common::{AllocationVerdict, Distribution};
use crate::core::power_model::PowerModel;
use crate::core::vm::VirtualMachine;

/// Static description of a physical host used when adding it to the pool.
#[derive(Clone)]
pub struct HostSpec {
    pub cpu_mips: u64,
    pub ram: u64,
    pub bandwidth: u64,
    pub storage: u64,
    pub cores: u32,
    pub active: bool,
    pub distribution: Distribution,
    pub power_model: Box<dyn PowerModel>,
}

/// Stores host properties (resource capacity) and state
/// (available resources, current allocations, migration reservations).
#[derive(Clone)]
pub struct HostInfo {
    pub cpu_total: u64,
    pub cpu_available: u64,

    pub ram_total: u64,
    pub ram_available: u64,

    pub bandwidth_total: u64,
    pub bandwidth_available: u64,

    pub storage_total: u64,
    pub storage_available: u64,

    pub cores_total: u32,
    pub cores_available: u32,

    pub active: bool,
    pub failed: bool,
    pub distribution: Distribution,
    pub power_model: Box<dyn PowerModel>,

    allocations: BTreeSet<u32>,
    migrating_in: HashSet<u32>,
    migrating_out: HashSet<u32>,
}

impl HostInfo {
    fn new(spec: HostSpec) -> Self {
        Self {
            cpu_total: spec.cpu_mips,
            cpu_available: spec.cpu_mips,
            ram_total: spec.ram,
            ram_available: spec.ram,
            bandwidth_total: spec.bandwidth,
            bandwidth_available: spec.bandwidth,
            storage_total: spec.storage,
            storage_available: spec.storage,
            cores_total: spec.cores,
            cores_available: spec.cores,
            active: spec.active,
            failed: false,
            distribution: spec.distribution,
            power_model: spec.power_model,
            allocations: BTreeSet::new(),
            migrating_in: HashSet::new(),
            migrating_out: HashSet::new(),
        }
    }

    fn fits(&self, vm: &VirtualMachine) -> AllocationVerdict {
        if self.failed {
            return AllocationVerdict::HostFailed;
        }
        if self.cpu_available < vm.cpu_mips {
            return AllocationVerdict::NotEnoughCpu;
        }
        if self.ram_available < vm.ram {
            return AllocationVerdict::NotEnoughMemory;
        }
        if self.bandwidth_available < vm.bandwidth {
            return AllocationVerdict::NotEnoughBandwidth;
        }
        if self.storage_available < vm.storage {
            return AllocationVerdict::NotEnoughStorage;
        }
        if self.cores_available < vm.cores {
            return AllocationVerdict::NotEnoughCores;
        }
        AllocationVerdict::Success
    }

    fn debit(&mut self, vm: &VirtualMachine) {
        self.cpu_available -= vm.cpu_mips;
        self.ram_available -= vm.ram;
        self.bandwidth_available -= vm.bandwidth;
        self.storage_available -= vm.storage;
        self.cores_available -= vm.cores;
    }

    fn credit(&mut self, vm: &VirtualMachine) {
        self.cpu_available += vm.cpu_mips;
        self.ram_available += vm.ram;
        self.bandwidth_available += vm.bandwidth;
        self.storage_available += vm.storage;
        self.cores_available += vm.cores;
        debug_assert!(self.cpu_available <= self.cpu_total);
        debug_assert!(self.ram_available <= self.ram_total);
        debug_assert!(self.bandwidth_available <= self.bandwidth_total);
        debug_assert!(self.storage_available <= self.storage_total);
        debug_assert!(self.cores_available <= self.cores_total);
    }
}

/// Centralized bookkeeping of host capacities, committed allocations and
/// migration reservations.
///
/// Reservations made via [`reserve_incoming`](ResourcePoolState::reserve_incoming)
/// debit host availability just like committed allocations do, so an admitted
/// migration batch can never drive any availability dimension below zero.
#[derive(Clone)]
pub struct ResourcePoolState {
    hosts: BTreeMap<u32, HostInfo>,
}

impl ResourcePoolState {
    /// Creates empty resource pool state.
    pub fn new() -> Self {
        Self { hosts: BTreeMap::new() }
    }

    /// Adds host to resource pool.
    pub fn add_host(&mut self, id: u32, spec: HostSpec) {
        self.hosts.insert(id, HostInfo::new(spec));
    }

    /// Returns IDs of all hosts in ascending order.
    pub fn get_host_ids(&self) -> Vec<u32> {
        self.hosts.keys().cloned().collect()
    }

    /// Returns the number of hosts.
    pub fn host_count(&self) -> u32 {
        self.hosts.len() as u32
    }

    pub fn contains_host(&self, host_id: u32) -> bool {
        self.hosts.contains_key(&host_id)
    }

    /// Checks whether the specified VM currently fits on the specified host.
    pub fn can_allocate(&self, vm: &VirtualMachine, host_id: u32) -> AllocationVerdict {
        match self.hosts.get(&host_id) {
            Some(host) => host.fits(vm),
            None => AllocationVerdict::HostNotFound,
        }
    }

    /// Commits the final allocation of the VM on the host.
    ///
    /// Re-checks all resource dimensions and debits availability on success.
    /// Allocating an already allocated VM is a no-op success.
    pub fn allocate(&mut self, vm: &VirtualMachine, host_id: u32) -> AllocationVerdict {
        let host = match self.hosts.get_mut(&host_id) {
            Some(host) => host,
            None => return AllocationVerdict::HostNotFound,
        };
        if host.allocations.contains(&vm.id) {
            return AllocationVerdict::Success;
        }
        let verdict = host.fits(vm);
        if verdict == AllocationVerdict::Success {
            host.debit(vm);
            host.allocations.insert(vm.id);
        }
        verdict
    }

    /// Releases the committed allocation of the VM on the host, if any.
    pub fn deallocate(&mut self, vm: &VirtualMachine, host_id: u32) {
        if let Some(host) = self.hosts.get_mut(&host_id) {
            if host.allocations.remove(&vm.id) {
                host.credit(vm);
            }
        }
    }

    /// Reserves destination capacity for a VM migrating in.
    ///
    /// On success the VM demand is debited from host availability and the VM is
    /// recorded in the host migrating-in set. Reserving an already reserved VM
    /// is a no-op success, so the operation is idempotent.
    pub fn reserve_incoming(&mut self, host_id: u32, vm: &VirtualMachine) -> bool {
        let host = match self.hosts.get_mut(&host_id) {
            Some(host) => host,
            None => return false,
        };
        if host.migrating_in.contains(&vm.id) {
            return true;
        }
        if host.fits(vm) != AllocationVerdict::Success {
            return false;
        }
        host.debit(vm);
        host.migrating_in.insert(vm.id);
        true
    }

    /// Releases a migration reservation, if present.
    pub fn release_incoming(&mut self, host_id: u32, vm: &VirtualMachine) {
        if let Some(host) = self.hosts.get_mut(&host_id) {
            if host.migrating_in.remove(&vm.id) {
                host.credit(vm);
            }
        }
    }

    /// Marks a VM as leaving its source host.
    pub fn mark_outgoing(&mut self, host_id: u32, vm_id: u32) {
        if let Some(host) = self.hosts.get_mut(&host_id) {
            host.migrating_out.insert(vm_id);
        }
    }

    /// Clears the migrating-out mark of a VM on its source host.
    pub fn clear_outgoing(&mut self, host_id: u32, vm_id: u32) {
        if let Some(host) = self.hosts.get_mut(&host_id) {
            host.migrating_out.remove(&vm_id);
        }
    }

    pub fn is_migrating_in(&self, host_id: u32, vm_id: u32) -> bool {
        self.hosts[&host_id].migrating_in.contains(&vm_id)
    }

    pub fn is_migrating_out(&self, host_id: u32, vm_id: u32) -> bool {
        self.hosts[&host_id].migrating_out.contains(&vm_id)
    }

    pub fn get_total_cpu(&self, host_id: u32) -> u64 {
        self.hosts[&host_id].cpu_total
    }

    pub fn get_available_cpu(&self, host_id: u32) -> u64 {
        self.hosts[&host_id].cpu_available
    }

    pub fn get_allocated_cpu(&self, host_id: u32) -> u64 {
        self.get_total_cpu(host_id) - self.get_available_cpu(host_id)
    }

    pub fn get_total_ram(&self, host_id: u32) -> u64 {
        self.hosts[&host_id].ram_total
    }

    pub fn get_available_ram(&self, host_id: u32) -> u64 {
        self.hosts[&host_id].ram_available
    }

    pub fn get_total_bandwidth(&self, host_id: u32) -> u64 {
        self.hosts[&host_id].bandwidth_total
    }

    pub fn get_available_bandwidth(&self, host_id: u32) -> u64 {
        self.hosts[&host_id].bandwidth_available
    }

    pub fn get_total_storage(&self, host_id: u32) -> u64 {
        self.hosts[&host_id].storage_total
    }

    pub fn get_available_storage(&self, host_id: u32) -> u64 {
        self.hosts[&host_id].storage_available
    }

    pub fn get_total_cores(&self, host_id: u32) -> u32 {
        self.hosts[&host_id].cores_total
    }

    /// Returns the number of free processing elements on the specified host.
    pub fn get_free_cores(&self, host_id: u32) -> u32 {
        self.hosts[&host_id].cores_available
    }

    pub fn is_active(&self, host_id: u32) -> bool {
        self.hosts[&host_id].active
    }

    pub fn is_failed(&self, host_id: u32) -> bool {
        self.hosts[&host_id].failed
    }

    pub fn set_active(&mut self, host_id: u32, active: bool) {
        if let Some(host) = self.hosts.get_mut(&host_id) {
            host.active = active;
        }
    }

    pub fn set_failed(&mut self, host_id: u32, failed: bool) {
        if let Some(host) = self.hosts.get_mut(&host_id) {
            host.failed = failed;
        }
    }

    pub fn get_distribution(&self, host_id: u32) -> Distribution {
        self.hosts[&host_id].distribution
    }

    /// Returns the CPU allocation rate (ratio of allocated to total CPU) of the specified host.
    pub fn get_cpu_allocation_ratio(&self, host_id: u32) -> f64 {
        1. - self.hosts[&host_id].cpu_available as f64 / self.hosts[&host_id].cpu_total as f64
    }

    /// Evaluates the host power model at the given CPU utilization.
    pub fn get_power(&self, host_id: u32, utilization: f64) -> f64 {
        self.hosts[&host_id].power_model.get_power(utilization)
    }
}

impl Default for ResourcePoolState {
    fn default() -> Self {
        Self::new()
    }
}
