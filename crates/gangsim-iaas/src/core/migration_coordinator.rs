//! Component coordinating batched gang migrations.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use gangsim_core::cast;
use gangsim_core::context::SimulationContext;
use gangsim_core::event::Event;
use gangsim_core::handler::EventHandler;
use gangsim_core::{log_debug, log_error, log_info, log_warn};

use crate::core::common::{AllocationVerdict, Distribution};
use crate::core::config::SimulationConfig;
use crate::core::events::migration::{BatchMigrationCompleted, GangMigrationRequest, ResumeWorkload};
use crate::core::migration::{BatchMember, BatchStatus, DispatchResult, MigrationError, MigrationRecord, SubBatch};
use crate::core::placement_policy::{PendingAssignments, PlacementPolicy};
use crate::core::resource_pool::ResourcePoolState;
use crate::core::vm::VmStatus;
use crate::core::vm_group::VmGroup;
use crate::core::vm_registry::VmRegistry;

/// Plans, admits and completes gang migrations of VM groups.
///
/// Planning partitions a group by the destinations chosen by the placement
/// policy into sub-batches. Admission of a sub-batch is atomic: either
/// destination capacity is reserved for every VM and exactly one completion
/// event is scheduled for the whole sub-batch, or every reservation made so
/// far is rolled back and nothing is scheduled. Completion is deliberately
/// not atomic: each VM's final allocation is attempted independently, so one
/// failure does not block the remaining VMs of the same sub-batch.
pub struct MigrationCoordinator {
    pool: Rc<RefCell<ResourcePoolState>>,
    vms: Rc<RefCell<VmRegistry>>,
    groups: BTreeMap<u32, VmGroup>,
    next_group_id: u32,
    policy: PlacementPolicy,
    batches: HashMap<u64, SubBatch>,
    next_batch_id: u64,
    records: Vec<MigrationRecord>,
    failures: Vec<MigrationError>,
    ctx: SimulationContext,
    sim_config: Rc<SimulationConfig>,
}

impl MigrationCoordinator {
    /// Creates component.
    pub fn new(
        pool: Rc<RefCell<ResourcePoolState>>,
        vms: Rc<RefCell<VmRegistry>>,
        policy: PlacementPolicy,
        ctx: SimulationContext,
        sim_config: Rc<SimulationConfig>,
    ) -> Self {
        Self {
            pool,
            vms,
            groups: BTreeMap::new(),
            next_group_id: 1,
            policy,
            batches: HashMap::new(),
            next_batch_id: 1,
            records: Vec::new(),
            failures: Vec::new(),
            ctx,
            sim_config,
        }
    }

    /// Returns component ID.
    pub fn get_id(&self) -> u32 {
        self.ctx.id()
    }

    /// Creates a new VM group from the specified members.
    ///
    /// A VM belongs to at most one group at a time, so members are moved out
    /// of their previous group first.
    pub fn create_group(&mut self, vm_ids: &[u32]) -> u32 {
        let group_id = self.next_group_id;
        self.next_group_id += 1;

        let mut group = VmGroup::new(group_id);
        for &vm_id in vm_ids {
            let vm_ref = self.vms.borrow().get_vm(vm_id);
            if let Some(prev_id) = vm_ref.borrow().group {
                self.detach_from_group(vm_id, prev_id);
            }
            group.add_vm(vm_id);
            vm_ref.borrow_mut().group = Some(group_id);
        }
        self.groups.insert(group_id, group);
        group_id
    }

    pub fn group(&self, group_id: u32) -> Option<&VmGroup> {
        self.groups.get(&group_id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Plans the migration of a whole group and dispatches one sub-batch per
    /// chosen destination host.
    ///
    /// VMs for which the policy finds no viable host are reported and left in
    /// their group; the remaining members are moved into new per-destination
    /// sub-batch groups. The emptied original group is deleted.
    pub fn plan_and_dispatch(&mut self, group_id: u32) -> DispatchResult {
        let member_ids = self.groups.get(&group_id).expect("unknown VM group").vm_ids().to_vec();
        log_debug!(self.ctx, "planning migration of group {} ({} vms)", group_id, member_ids.len());

        let mut pending = PendingAssignments::new();
        let mut result = DispatchResult::default();

        for vm_id in member_ids {
            let vm = self.vms.borrow().get_vm(vm_id).borrow().clone();
            let selected = {
                let pool = self.pool.borrow();
                self.policy.select_host(&vm, &pool, vm.current_host, &pending)
            };
            match selected {
                Some(host_id) => {
                    log_debug!(self.ctx, "vm {} assigned to host {}", vm_id, self.ctx.lookup_name(host_id));
                    pending.add(host_id, vm);
                }
                None => {
                    log_warn!(self.ctx, "no suitable host found for vm {}", vm_id);
                    self.failures.push(MigrationError::PlacementExhausted { vm_id });
                    result.unplaced.push(vm_id);
                }
            }
        }

        let planned: Vec<(u32, Vec<u32>)> = pending
            .iter()
            .map(|(host_id, vms)| (host_id, vms.iter().map(|vm| vm.id).collect()))
            .collect();

        for (destination, vm_ids) in planned {
            let sub_group_id = self.next_group_id;
            self.next_group_id += 1;

            let mut sub_group = VmGroup::new(sub_group_id);
            let original = self.groups.get_mut(&group_id).unwrap();
            for &vm_id in &vm_ids {
                original.remove_vm(vm_id);
            }
            for &vm_id in &vm_ids {
                sub_group.add_vm(vm_id);
                self.vms.borrow().get_vm(vm_id).borrow_mut().group = Some(sub_group_id);
            }
            self.groups.insert(sub_group_id, sub_group);

            log_info!(
                self.ctx,
                "migrating {} vms to host {} in one batch (group {})",
                vm_ids.len(),
                self.ctx.lookup_name(destination),
                sub_group_id
            );
            let (batch_id, admitted) = self.dispatch_sub_batch(sub_group_id, destination);
            if admitted {
                result.dispatched.push(batch_id);
            } else {
                result.rejected.push(batch_id);
            }
        }

        if self.groups.get(&group_id).map_or(false, |group| group.is_empty()) {
            self.groups.remove(&group_id);
            log_debug!(self.ctx, "group {} removed as it became empty", group_id);
        }
        result
    }

    /// Dispatches one sub-batch group to the specified destination host.
    ///
    /// Performs the all-or-nothing admission and, on success, schedules the
    /// single completion event at `now + |duration|`. Returns the batch id
    /// and whether the batch was admitted.
    pub fn dispatch_sub_batch(&mut self, group_id: u32, destination: u32) -> (u64, bool) {
        let vm_ids = self.groups.get(&group_id).expect("unknown VM group").vm_ids().to_vec();
        assert!(!vm_ids.is_empty(), "cannot dispatch an empty sub-batch");

        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;

        let members: Vec<BatchMember> = vm_ids
            .iter()
            .map(|&vm_id| BatchMember {
                vm_id,
                source_host: self.vms.borrow().get_vm(vm_id).borrow().current_host,
            })
            .collect();
        let duration = self.compute_duration(&members, destination);
        let mut batch = SubBatch {
            id: batch_id,
            group_id,
            destination,
            members,
            duration,
            status: BatchStatus::Planned,
            start_time: self.ctx.time(),
        };

        let mut reserved: Vec<u32> = Vec::new();
        let mut admitted = true;
        {
            let mut pool = self.pool.borrow_mut();
            for member in &batch.members {
                let vm = self.vms.borrow().get_vm(member.vm_id).borrow().clone();
                if pool.reserve_incoming(destination, &vm) {
                    reserved.push(member.vm_id);
                } else {
                    admitted = false;
                    break;
                }
            }
            if !admitted {
                // roll back every reservation made for this sub-batch
                for vm_id in reserved {
                    let vm = self.vms.borrow().get_vm(vm_id).borrow().clone();
                    pool.release_incoming(destination, &vm);
                }
            }
        }
        if !admitted {
            log_warn!(
                self.ctx,
                "admission of batch {} ({} vms) to host {} rejected",
                batch_id,
                batch.members.len(),
                self.ctx.lookup_name(destination)
            );
            self.failures.push(MigrationError::AdmissionRejected { batch_id, destination });
            batch.status = BatchStatus::Rejected;
            self.batches.insert(batch_id, batch);
            return (batch_id, false);
        }
        batch.status = BatchStatus::Admitted;

        let non_live = duration < 0.;
        let delay = duration.abs();
        for member in &batch.members {
            let vm_ref = self.vms.borrow().get_vm(member.vm_id);
            let mut vm = vm_ref.borrow_mut();
            vm.migrating_in = true;
            if let Some(source) = member.source_host {
                vm.migrating_out = true;
                self.pool.borrow_mut().mark_outgoing(source, member.vm_id);
            }
            if non_live {
                // the VM is stopped and its workload descheduled until after the batch delay
                vm.status = VmStatus::Paused;
                self.ctx.emit_self(
                    ResumeWorkload { vm_id: member.vm_id },
                    delay + self.sim_config.min_time_between_events,
                );
            } else {
                vm.status = VmStatus::Migrating;
            }
        }
        self.ctx.emit_self(BatchMigrationCompleted { batch_id }, delay);
        batch.status = BatchStatus::InFlight;

        log_info!(
            self.ctx,
            "{} migration of batch {} ({} vms) to host {} started, expected to finish in {:.2} s",
            if non_live { "non-live" } else { "live" },
            batch_id,
            batch.members.len(),
            self.ctx.lookup_name(destination),
            delay
        );
        self.batches.insert(batch_id, batch);
        (batch_id, true)
    }

    /// Computes the signed migration duration of a sub-batch.
    ///
    /// Live migration (both endpoints privately distributed) transfers the
    /// allocated RAM, non-live migration transfers the VM storage and is
    /// tagged with a negative sign. The slowest VM gates the whole batch:
    /// the result is the entry of maximum absolute value, sign preserved.
    fn compute_duration(&self, members: &[BatchMember], destination: u32) -> f64 {
        let pool = self.pool.borrow();
        // Mbit/s -> MB/s
        let effective_bandwidth =
            pool.get_total_bandwidth(destination) as f64 * self.sim_config.migration_bandwidth_fraction / 8.;
        let destination_private = pool.get_distribution(destination) == Distribution::Private;

        let mut max_time = 0.0_f64;
        for member in members {
            let vm = self.vms.borrow().get_vm(member.vm_id).borrow().clone();
            let live = destination_private
                && member
                    .source_host
                    .map_or(false, |source| pool.get_distribution(source) == Distribution::Private);
            let migration_time = if live {
                vm.ram as f64 / effective_bandwidth
            } else {
                -(vm.storage as f64 / effective_bandwidth)
            };
            if migration_time.abs() > max_time.abs() {
                max_time = migration_time;
            }
        }
        max_time
    }

    /// Applies the completion of a dispatched sub-batch, VM by VM.
    fn on_batch_completed(&mut self, batch_id: u64) {
        let batch = match self.batches.get(&batch_id) {
            Some(batch) if batch.status == BatchStatus::InFlight => batch.clone(),
            other => panic!(
                "completion payload does not match an in-flight batch: {} (status {:?})",
                batch_id,
                other.map(|batch| batch.status)
            ),
        };
        let destination = batch.destination;
        let measured_duration = self.ctx.time() - batch.start_time;

        for member in &batch.members {
            let vm_ref = self.vms.borrow().get_vm(member.vm_id);
            let demand = vm_ref.borrow().clone();
            let verdict = {
                let mut pool = self.pool.borrow_mut();
                pool.release_incoming(destination, &demand);
                if let Some(source) = member.source_host {
                    pool.clear_outgoing(source, member.vm_id);
                    pool.deallocate(&demand, source);
                }
                pool.allocate(&demand, destination)
            };

            let mut vm = vm_ref.borrow_mut();
            vm.migrating_in = false;
            vm.migrating_out = false;
            if verdict == AllocationVerdict::Success {
                vm.current_host = Some(destination);
                if vm.status == VmStatus::Migrating {
                    vm.status = VmStatus::Running;
                }
                drop(vm);
                self.remove_vm_from_group(member.vm_id);
                self.records.push(MigrationRecord {
                    vm_id: member.vm_id,
                    source_host: member.source_host,
                    destination_host: destination,
                    duration: measured_duration,
                    downtime: 0.,
                    energy: 0.,
                    cost: 0.,
                });
                log_info!(
                    self.ctx,
                    "migration of vm {} to host {} completed",
                    member.vm_id,
                    self.ctx.lookup_name(destination)
                );
            } else {
                vm.current_host = None;
                vm.status = VmStatus::FailedToAllocate;
                drop(vm);
                self.failures.push(MigrationError::AllocationFailed {
                    vm_id: member.vm_id,
                    host_id: destination,
                    verdict,
                });
                log_error!(
                    self.ctx,
                    "allocation of vm {} on destination host {} failed: {}",
                    member.vm_id,
                    self.ctx.lookup_name(destination),
                    verdict
                );
            }
        }
        self.batches.get_mut(&batch_id).unwrap().status = BatchStatus::Completed;
    }

    fn on_resume_workload(&mut self, vm_id: u32) {
        let vm_ref = self.vms.borrow().get_vm(vm_id);
        let mut vm = vm_ref.borrow_mut();
        if vm.status == VmStatus::Paused && vm.current_host.is_some() && !vm.is_migrating() {
            vm.status = VmStatus::Running;
            log_debug!(
                self.ctx,
                "workload of vm {} resumed on host {}",
                vm_id,
                self.ctx.lookup_name(vm.current_host.unwrap())
            );
        }
    }

    fn remove_vm_from_group(&mut self, vm_id: u32) {
        let vm_ref = self.vms.borrow().get_vm(vm_id);
        let group_id = match vm_ref.borrow().group {
            Some(group_id) => group_id,
            None => return,
        };
        self.detach_from_group(vm_id, group_id);
        vm_ref.borrow_mut().group = None;
    }

    fn detach_from_group(&mut self, vm_id: u32, group_id: u32) {
        if let Some(group) = self.groups.get_mut(&group_id) {
            if group.remove_vm(vm_id) {
                log_debug!(self.ctx, "vm {} removed from group {}", vm_id, group_id);
            }
            if group.is_empty() {
                self.groups.remove(&group_id);
                log_debug!(self.ctx, "group {} removed as it became empty", group_id);
            }
        }
    }

    /// Returns the records of all completed VM migrations.
    pub fn migration_records(&self) -> &[MigrationRecord] {
        &self.records
    }

    /// Returns the number of completed VM migrations.
    pub fn migration_count(&self) -> usize {
        self.records.len()
    }

    /// Returns the failure notices accumulated so far.
    pub fn failures(&self) -> &[MigrationError] {
        &self.failures
    }

    pub fn batch_status(&self, batch_id: u64) -> Option<BatchStatus> {
        self.batches.get(&batch_id).map(|batch| batch.status)
    }

    pub fn batch(&self, batch_id: u64) -> Option<&SubBatch> {
        self.batches.get(&batch_id)
    }
}

impl EventHandler for MigrationCoordinator {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            GangMigrationRequest { group_id } => {
                let result = self.plan_and_dispatch(group_id);
                if !result.unplaced.is_empty() {
                    log_warn!(self.ctx, "{} vms could not be assigned to any host", result.unplaced.len());
                }
            }
            BatchMigrationCompleted { batch_id } => {
                self.on_batch_completed(batch_id);
            }
            ResumeWorkload { vm_id } => {
                self.on_resume_workload(vm_id);
            }
        })
    }
}
