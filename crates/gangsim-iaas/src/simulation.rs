//! Simulation facade wiring the components together.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::rc::Rc;

use sugars::{rc, refcell};

use gangsim_core::context::SimulationContext;
use gangsim_core::log_error;
use gangsim_core::simulation::Simulation;

use crate::core::common::{AllocationVerdict, Distribution};
use crate::core::config::SimulationConfig;
use crate::core::dependency_graph::VmDependencyGraph;
use crate::core::events::migration::GangMigrationRequest;
use crate::core::migration::MigrationRecord;
use crate::core::migration_coordinator::MigrationCoordinator;
use crate::core::placement_policy::placement_policy_resolver;
use crate::core::power_model::LinearPowerModel;
use crate::core::resource_pool::{HostSpec, ResourcePoolState};
use crate::core::vm::{VirtualMachine, VmStatus};
use crate::core::vm_registry::VmRegistry;

/// The gang migration simulation driver.
///
/// Owns the host inventory, the VM registry and the migration coordinator,
/// and decides when to trigger a gang migration by sending requests into the
/// coordinator component.
pub struct GangSimulation {
    pool: Rc<RefCell<ResourcePoolState>>,
    vms: Rc<RefCell<VmRegistry>>,
    dependency_graph: VmDependencyGraph,
    coordinator: Rc<RefCell<MigrationCoordinator>>,
    coordinator_id: u32,
    hosts: BTreeMap<u32, String>,
    sim: Simulation,
    ctx: SimulationContext,
    sim_config: Rc<SimulationConfig>,
}

impl GangSimulation {
    pub fn new(mut sim: Simulation, sim_config: SimulationConfig) -> Self {
        let sim_config = rc!(sim_config);
        let pool = rc!(refcell!(ResourcePoolState::new()));
        let vms = rc!(refcell!(VmRegistry::new()));
        let policy = placement_policy_resolver(&sim_config.policy, sim_config.seed);
        let coordinator = rc!(refcell!(MigrationCoordinator::new(
            pool.clone(),
            vms.clone(),
            policy,
            sim.create_context("coordinator"),
            sim_config.clone(),
        )));
        let coordinator_id = sim.add_handler("coordinator", coordinator.clone());
        let ctx = sim.create_context("simulation");
        Self {
            pool,
            vms,
            dependency_graph: VmDependencyGraph::new(),
            coordinator,
            coordinator_id,
            hosts: BTreeMap::new(),
            sim,
            ctx,
            sim_config,
        }
    }

    /// Adds a host with the specified capacities to the inventory, returns its ID.
    pub fn add_host(&mut self, name: &str, spec: HostSpec) -> u32 {
        let id = self.sim.create_context(name).id();
        self.pool.borrow_mut().add_host(id, spec);
        self.hosts.insert(id, name.to_string());
        id
    }

    /// Adds all hosts described in the simulation config, returns their IDs.
    pub fn add_hosts_from_config(&mut self) -> Vec<u32> {
        let mut ids = Vec::new();
        for host_config in self.sim_config.hosts.clone() {
            let count = host_config.count.unwrap_or(1);
            for i in 0..count {
                let name = if count == 1 {
                    host_config
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("host{}", self.hosts.len() + 1))
                } else {
                    let prefix = host_config.name_prefix.clone().unwrap_or_else(|| "host".to_string());
                    format!("{}{}", prefix, i + 1)
                };
                let spec = HostSpec {
                    cpu_mips: host_config.cpu_mips,
                    ram: host_config.ram,
                    bandwidth: host_config.bandwidth,
                    storage: host_config.storage,
                    cores: host_config.cores,
                    active: host_config.active.unwrap_or(true),
                    distribution: host_config.distribution.unwrap_or(Distribution::Private),
                    power_model: Box::new(LinearPowerModel::new(
                        host_config.max_power.unwrap_or(100.),
                        host_config.static_power.unwrap_or(50.),
                    )),
                };
                ids.push(self.add_host(&name, spec));
            }
        }
        ids
    }

    /// Creates a VM with the specified demand and allocates it directly on the host.
    ///
    /// Returns whether the initial allocation succeeded; the VM is registered
    /// either way.
    pub fn spawn_vm_on_host(
        &mut self,
        id: u32,
        cpu_mips: u64,
        ram: u64,
        bandwidth: u64,
        storage: u64,
        cores: u32,
        host_id: u32,
    ) -> bool {
        let mut vm = VirtualMachine::new(id, cpu_mips, ram, bandwidth, storage, cores);
        let verdict = self.pool.borrow_mut().allocate(&vm, host_id);
        if verdict == AllocationVerdict::Success {
            vm.current_host = Some(host_id);
            self.vms.borrow_mut().register_new_vm(vm);
            true
        } else {
            log_error!(
                self.ctx,
                "failed to spawn vm {} on host {}: {}",
                id,
                self.ctx.lookup_name(host_id),
                verdict
            );
            vm.status = VmStatus::FailedToAllocate;
            self.vms.borrow_mut().register_new_vm(vm);
            false
        }
    }

    /// Creates a VM group from the specified members, returns the group ID.
    pub fn add_vm_group(&mut self, vm_ids: &[u32]) -> u32 {
        self.coordinator.borrow_mut().create_group(vm_ids)
    }

    /// Records that `dependent` relies on `prerequisite`.
    pub fn add_dependency(&mut self, dependent: u32, prerequisite: u32) {
        self.dependency_graph.add_dependency(dependent, prerequisite);
    }

    pub fn dependency_graph(&self) -> &VmDependencyGraph {
        &self.dependency_graph
    }

    /// Requests the gang migration of a VM group.
    pub fn migrate_group(&mut self, group_id: u32) {
        self.ctx.emit(
            GangMigrationRequest { group_id },
            self.coordinator_id,
            self.sim_config.message_delay,
        );
    }

    pub fn coordinator(&self) -> Rc<RefCell<MigrationCoordinator>> {
        self.coordinator.clone()
    }

    pub fn pool(&self) -> Rc<RefCell<ResourcePoolState>> {
        self.pool.clone()
    }

    pub fn vm(&self, vm_id: u32) -> Rc<RefCell<VirtualMachine>> {
        self.vms.borrow().get_vm(vm_id)
    }

    pub fn vm_status(&self, vm_id: u32) -> VmStatus {
        self.vms.borrow().get_vm_status(vm_id)
    }

    /// Returns the host currently holding the VM, if any.
    pub fn vm_location(&self, vm_id: u32) -> Option<u32> {
        self.vms.borrow().get_vm(vm_id).borrow().current_host
    }

    pub fn host_name(&self, host_id: u32) -> String {
        self.hosts[&host_id].clone()
    }

    /// Returns the records of all completed VM migrations.
    pub fn migration_records(&self) -> Vec<MigrationRecord> {
        self.coordinator.borrow().migration_records().to_vec()
    }

    /// Saves the migration records to a CSV file.
    pub fn save_migration_records(&self, path: &str) -> Result<(), std::io::Error> {
        let file = File::create(path)?;
        let mut wtr = csv::Writer::from_writer(file);
        for record in self.coordinator.borrow().migration_records() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn steps(&mut self, step_count: u64) -> bool {
        self.sim.steps(step_count)
    }

    pub fn step_for_duration(&mut self, time: f64) {
        self.sim.step_for_duration(time);
    }

    pub fn step_until_no_events(&mut self) {
        self.sim.step_until_no_events();
    }

    pub fn current_time(&self) -> f64 {
        self.sim.time()
    }

    pub fn event_count(&self) -> u64 {
        self.sim.event_count()
    }

    pub fn sim_config(&self) -> Rc<SimulationConfig> {
        self.sim_config.clone()
    }
}
