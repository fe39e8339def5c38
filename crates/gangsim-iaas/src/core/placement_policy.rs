//! VM placement policies.
//!
//! A placement policy is a pure decision function: given a VM, the host
//! inventory, the VM's current host and the assignments already pending in
//! this decision cycle, it returns a destination host or `None`. Policies
//! never mutate committed host or VM state, which allows speculative
//! placement of several VMs before anything is reserved.

use indexmap::IndexMap;

use crate::core::placement_policies::best_fit::BestFit;
use crate::core::placement_policies::brute_force::BruteForce;
use crate::core::placement_policies::first_fit::FirstFit;
use crate::core::placement_policies::power_aware_best_fit::PowerAwareBestFit;
use crate::core::placement_policies::random::RandomFit;
use crate::core::placement_policies::round_robin::RoundRobin;
use crate::core::placement_policies::worst_fit::WorstFit;
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VirtualMachine;

/// Share of host CPU and RAM capacity kept free as migration overhead buffer.
pub const MIGRATION_OVERHEAD_MARGIN: f64 = 0.10;

/// VMs tentatively assigned to each host during one decision cycle,
/// before any capacity is actually committed.
///
/// Scoped to a single placement pass and discarded after the batch is dispatched.
#[derive(Default)]
pub struct PendingAssignments {
    assignments: IndexMap<u32, Vec<VirtualMachine>>,
}

impl PendingAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tentatively assigns a VM to the host.
    pub fn add(&mut self, host_id: u32, vm: VirtualMachine) {
        self.assignments.entry(host_id).or_default().push(vm);
    }

    /// Returns the VMs pending on the host, in assignment order.
    pub fn get(&self, host_id: u32) -> &[VirtualMachine] {
        self.assignments.get(&host_id).map_or(&[], |vms| vms.as_slice())
    }

    /// Iterates over non-empty host buckets in the order hosts first appeared.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[VirtualMachine])> {
        self.assignments.iter().map(|(&host_id, vms)| (host_id, vms.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Common suitability pre-check shared by all policies.
///
/// The host is viable for the VM iff, after subtracting the VM demand and the
/// demand of every VM already pending on this host from the current
/// availability, and additionally keeping [`MIGRATION_OVERHEAD_MARGIN`] of the
/// total CPU and RAM capacity free, every resource dimension stays non-negative.
/// A failed host is never viable.
pub fn is_suitable(pool_state: &ResourcePoolState, host_id: u32, vm: &VirtualMachine, pending: &[VirtualMachine]) -> bool {
    if pool_state.is_failed(host_id) {
        return false;
    }

    let mut cpu = pool_state.get_available_cpu(host_id) as f64;
    let mut ram = pool_state.get_available_ram(host_id) as f64;
    let mut bandwidth = pool_state.get_available_bandwidth(host_id) as f64;
    let mut storage = pool_state.get_available_storage(host_id) as f64;
    let mut cores = pool_state.get_free_cores(host_id) as f64;

    cpu -= vm.cpu_mips as f64;
    ram -= vm.ram as f64;
    bandwidth -= vm.bandwidth as f64;
    storage -= vm.storage as f64;
    cores -= vm.cores as f64;

    for pending_vm in pending {
        cpu -= pending_vm.cpu_mips as f64;
        ram -= pending_vm.ram as f64;
        bandwidth -= pending_vm.bandwidth as f64;
        storage -= pending_vm.storage as f64;
        cores -= pending_vm.cores as f64;
    }

    cpu -= pool_state.get_total_cpu(host_id) as f64 * MIGRATION_OVERHEAD_MARGIN;
    ram -= pool_state.get_total_ram(host_id) as f64 * MIGRATION_OVERHEAD_MARGIN;

    cpu >= 0. && ram >= 0. && bandwidth >= 0. && storage >= 0. && cores >= 0.
}

/// The closed set of interchangeable placement strategies.
///
/// Strategies with internal state (the Round-Robin cursor, the random source)
/// own it inside their variant, so it persists across calls of one policy value.
pub enum PlacementPolicy {
    FirstFit(FirstFit),
    BestFit(BestFit),
    WorstFit(WorstFit),
    RoundRobin(RoundRobin),
    Random(RandomFit),
    PowerAwareBestFit(PowerAwareBestFit),
    BruteForce(BruteForce),
}

impl PlacementPolicy {
    /// Selects a destination host for the VM or returns `None` if no host is viable.
    pub fn select_host(
        &mut self,
        vm: &VirtualMachine,
        pool_state: &ResourcePoolState,
        current_host: Option<u32>,
        pending: &PendingAssignments,
    ) -> Option<u32> {
        match self {
            PlacementPolicy::FirstFit(policy) => policy.select_host(vm, pool_state, current_host, pending),
            PlacementPolicy::BestFit(policy) => policy.select_host(vm, pool_state, current_host, pending),
            PlacementPolicy::WorstFit(policy) => policy.select_host(vm, pool_state, current_host, pending),
            PlacementPolicy::RoundRobin(policy) => policy.select_host(vm, pool_state, current_host, pending),
            PlacementPolicy::Random(policy) => policy.select_host(vm, pool_state, current_host, pending),
            PlacementPolicy::PowerAwareBestFit(policy) => policy.select_host(vm, pool_state, current_host, pending),
            PlacementPolicy::BruteForce(policy) => policy.select_host(vm, pool_state, current_host, pending),
        }
    }
}

/// Maps a configuration string to a placement policy.
///
/// The seed is used by strategies owning a random source.
/// Panics on unknown policy names.
pub fn placement_policy_resolver(config_str: &str, seed: u64) -> PlacementPolicy {
    match config_str {
        "first-fit" | "ff" => PlacementPolicy::FirstFit(FirstFit::new()),
        "best-fit" | "bf" => PlacementPolicy::BestFit(BestFit::new()),
        "worst-fit" | "wf" => PlacementPolicy::WorstFit(WorstFit::new()),
        "round-robin" | "rr" => PlacementPolicy::RoundRobin(RoundRobin::new()),
        "random" | "rand" => PlacementPolicy::Random(RandomFit::new(seed)),
        "power-aware-best-fit" | "pbfd" => PlacementPolicy::PowerAwareBestFit(PowerAwareBestFit::new()),
        "brute-force" | "brute" => PlacementPolicy::BruteForce(BruteForce::new()),
        _ => panic!("Can't resolve placement policy: {}", config_str),
    }
}
