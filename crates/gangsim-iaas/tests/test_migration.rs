use gangsim_core::event::Event;
use gangsim_core::handler::EventHandler;
use gangsim_core::simulation::Simulation;

use gangsim_iaas::core::common::{AllocationVerdict, Distribution};
use gangsim_iaas::core::events::migration::BatchMigrationCompleted;
use gangsim_iaas::core::config::SimulationConfig;
use gangsim_iaas::core::migration::{BatchStatus, MigrationError};
use gangsim_iaas::core::power_model::ConstantPowerModel;
use gangsim_iaas::core::resource_pool::HostSpec;
use gangsim_iaas::core::vm::{VirtualMachine, VmStatus};
use gangsim_iaas::simulation::GangSimulation;

fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

fn spec(cpu_mips: u64, ram: u64, bandwidth: u64, storage: u64, cores: u32, distribution: Distribution) -> HostSpec {
    HostSpec {
        cpu_mips,
        ram,
        bandwidth,
        storage,
        cores,
        active: true,
        distribution,
        power_model: Box::new(ConstantPowerModel::new(0.)),
    }
}

fn assert_float_eq(left: f64, right: f64) {
    assert!((left - right).abs() < 1e-9, "{} != {}", left, right);
}

#[test]
// Two VMs on host A are planned to host B by first fit, dispatched as a
// single batch gated by the slower VM and both complete at the same time.
fn test_gang_migration_of_group() {
    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    let a = gang_sim.add_host("a", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));
    let b = gang_sim.add_host("b", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));

    assert!(gang_sim.spawn_vm_on_host(1, 2000, 1200, 1000, 10_000, 2, a));
    assert!(gang_sim.spawn_vm_on_host(2, 2000, 2400, 1000, 10_000, 2, a));

    let group = gang_sim.add_vm_group(&[1, 2]);
    gang_sim.migrate_group(group);
    gang_sim.step_until_no_events();

    // effective migration bandwidth is 10000 Mbit/s * 0.5 / 8 = 625 MB/s,
    // so the batch is gated by vm 2: 2400 MB / 625 MB/s = 3.84 s
    assert_float_eq(gang_sim.current_time(), 0.2 + 3.84);
    assert_eq!(gang_sim.vm_location(1), Some(b));
    assert_eq!(gang_sim.vm_location(2), Some(b));
    assert_eq!(gang_sim.vm_status(1), VmStatus::Running);
    assert_eq!(gang_sim.vm_status(2), VmStatus::Running);

    let records = gang_sim.migration_records();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.source_host, Some(a));
        assert_eq!(record.destination_host, b);
        assert_float_eq(record.duration, 3.84);
    }

    let coordinator = gang_sim.coordinator();
    assert_eq!(coordinator.borrow().batch_status(1), Some(BatchStatus::Completed));
    assert!(coordinator.borrow().batch(1).unwrap().is_live());
    // both the planned group and the sub-batch group are emptied and deleted
    assert_eq!(coordinator.borrow().group_count(), 0);

    // source capacity is fully released, destination holds both VMs
    let pool = gang_sim.pool();
    assert_eq!(pool.borrow().get_available_cpu(a), 100_000);
    assert_eq!(pool.borrow().get_available_ram(a), 100_000);
    assert_eq!(pool.borrow().get_available_cpu(b), 100_000 - 4000);
    assert_eq!(pool.borrow().get_available_ram(b), 100_000 - 3600);
    assert_eq!(pool.borrow().get_free_cores(b), 96);
}

#[test]
// A migration crossing into a public-cloud datacenter is non-live: the
// duration is storage-based and negative, the workload is paused for the
// whole transfer and resumed one scheduling quantum after completion.
fn test_non_live_migration() {
    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    let a = gang_sim.add_host("a", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));
    let b = gang_sim.add_host("b", spec(100_000, 100_000, 8000, 1_000_000, 100, Distribution::Public));

    assert!(gang_sim.spawn_vm_on_host(1, 2000, 1000, 1000, 10_000, 2, a));
    let group = gang_sim.add_vm_group(&[1]);
    gang_sim.migrate_group(group);

    gang_sim.step_for_duration(1.);
    assert_eq!(gang_sim.vm_status(1), VmStatus::Paused);
    assert!(gang_sim.vm(1).borrow().is_migrating());
    assert!(gang_sim.pool().borrow().is_migrating_in(b, 1));
    assert!(gang_sim.pool().borrow().is_migrating_out(a, 1));

    // effective bandwidth 8000 * 0.5 / 8 = 500 MB/s, storage 10000 MB -> 20 s
    let coordinator = gang_sim.coordinator();
    let batch = coordinator.borrow().batch(1).unwrap().clone();
    assert_float_eq(batch.duration, -20.);
    assert!(!batch.is_live());

    gang_sim.step_until_no_events();
    // request delay + transfer + one scheduling quantum before the resume
    assert_float_eq(gang_sim.current_time(), 0.2 + 20. + 0.1);
    assert_eq!(gang_sim.vm_location(1), Some(b));
    assert_eq!(gang_sim.vm_status(1), VmStatus::Running);

    let records = gang_sim.migration_records();
    assert_eq!(records.len(), 1);
    assert_float_eq(records[0].duration, 20.);
}

#[test]
// Admission is all-or-nothing: when the second reservation fails, the first
// one is rolled back and no event is scheduled.
fn test_admission_rollback() {
    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    let a = gang_sim.add_host("a", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));
    let b = gang_sim.add_host("b", spec(100_000, 100_000, 10_000, 1_000_000, 4, Distribution::Private));

    assert!(gang_sim.spawn_vm_on_host(1, 1000, 1000, 100, 1000, 2, a));
    assert!(gang_sim.spawn_vm_on_host(2, 1000, 1000, 100, 1000, 4, a));
    let group = gang_sim.add_vm_group(&[1, 2]);

    let coordinator = gang_sim.coordinator();
    let (batch_id, admitted) = coordinator.borrow_mut().dispatch_sub_batch(group, b);
    assert!(!admitted);
    assert_eq!(coordinator.borrow().batch_status(batch_id), Some(BatchStatus::Rejected));
    assert!(coordinator
        .borrow()
        .failures()
        .contains(&MigrationError::AdmissionRejected { batch_id, destination: b }));

    // zero lasting state change on hosts and VMs
    let pool = gang_sim.pool();
    assert_eq!(pool.borrow().get_free_cores(b), 4);
    assert_eq!(pool.borrow().get_available_cpu(b), 100_000);
    assert_eq!(pool.borrow().get_available_ram(b), 100_000);
    assert!(!pool.borrow().is_migrating_in(b, 1));
    assert!(!pool.borrow().is_migrating_in(b, 2));
    assert!(!pool.borrow().is_migrating_out(a, 1));
    assert_eq!(gang_sim.vm_status(1), VmStatus::Running);
    assert_eq!(gang_sim.vm_status(2), VmStatus::Running);
    assert_eq!(gang_sim.vm_location(1), Some(a));
    assert_eq!(gang_sim.vm_location(2), Some(a));

    // and no completion event was scheduled
    assert!(!gang_sim.steps(1));
    assert_float_eq(gang_sim.current_time(), 0.);
}

#[test]
// Completion is per-VM independent: one VM losing its reservation mid-flight
// fails alone, the sibling migration is still recorded as a success.
fn test_completion_partial_failure() {
    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    let a = gang_sim.add_host("a", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));
    let b = gang_sim.add_host("b", spec(100_000, 100_000, 10_000, 1_000_000, 8, Distribution::Private));

    assert!(gang_sim.spawn_vm_on_host(1, 1000, 1000, 100, 1000, 2, a));
    assert!(gang_sim.spawn_vm_on_host(2, 1000, 1000, 100, 1000, 2, a));
    let group = gang_sim.add_vm_group(&[1, 2]);

    let coordinator = gang_sim.coordinator();
    let (batch_id, admitted) = coordinator.borrow_mut().dispatch_sub_batch(group, b);
    assert!(admitted);

    // an external actor drops vm 2's reservation and claims the freed cores
    let pool = gang_sim.pool();
    let vm2 = gang_sim.vm(2).borrow().clone();
    pool.borrow_mut().release_incoming(b, &vm2);
    let filler = VirtualMachine::new(99, 1000, 1000, 100, 1000, 6);
    assert_eq!(pool.borrow_mut().allocate(&filler, b), AllocationVerdict::Success);

    gang_sim.step_until_no_events();

    assert_eq!(gang_sim.vm_location(1), Some(b));
    assert_eq!(gang_sim.vm_status(1), VmStatus::Running);
    assert_eq!(gang_sim.vm_location(2), None);
    assert_eq!(gang_sim.vm_status(2), VmStatus::FailedToAllocate);

    let records = gang_sim.migration_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].vm_id, 1);

    let has_allocation_failure = coordinator.borrow().failures().iter().any(|failure| {
        matches!(failure, MigrationError::AllocationFailed { vm_id: 2, host_id, .. } if *host_id == b)
    });
    assert!(has_allocation_failure);
    assert_eq!(coordinator.borrow().batch_status(batch_id), Some(BatchStatus::Completed));

    // the failed VM stays in its sub-batch group for a later re-plan
    assert_eq!(coordinator.borrow().group_count(), 1);
    let group_ids: Vec<u32> = coordinator.borrow().group(group).unwrap().vm_ids().to_vec();
    assert_eq!(group_ids, vec![2]);
}

#[test]
// VMs without a viable destination are reported per VM and left in their group.
fn test_placement_exhausted() {
    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    let a = gang_sim.add_host("a", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));
    assert!(gang_sim.spawn_vm_on_host(1, 1000, 1000, 100, 1000, 2, a));
    let group = gang_sim.add_vm_group(&[1]);

    let coordinator = gang_sim.coordinator();
    let result = coordinator.borrow_mut().plan_and_dispatch(group);
    assert_eq!(result.dispatched.len(), 0);
    assert_eq!(result.rejected.len(), 0);
    assert_eq!(result.unplaced, vec![1]);
    assert!(coordinator
        .borrow()
        .failures()
        .contains(&MigrationError::PlacementExhausted { vm_id: 1 }));
    assert_eq!(coordinator.borrow().group(group).unwrap().vm_ids(), &[1]);
    assert_eq!(gang_sim.vm_location(1), Some(a));
}

#[test]
// A VM with no source host is never classified live, even between private
// hosts, and has no source-side deallocation.
fn test_sourceless_vm_is_non_live() {
    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    let tiny = gang_sim.add_host("tiny", spec(100, 100, 100, 100, 1, Distribution::Private));
    let a = gang_sim.add_host("a", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));

    // initial allocation fails, leaving the VM without a host
    assert!(!gang_sim.spawn_vm_on_host(1, 2000, 1000, 1000, 10_000, 2, tiny));
    assert_eq!(gang_sim.vm_location(1), None);

    let group = gang_sim.add_vm_group(&[1]);
    let coordinator = gang_sim.coordinator();
    let result = coordinator.borrow_mut().plan_and_dispatch(group);
    assert_eq!(result.dispatched.len(), 1);

    let batch = coordinator.borrow().batch(result.dispatched[0]).unwrap().clone();
    assert!(batch.duration < 0.);
    assert_eq!(batch.destination, a);

    gang_sim.step_until_no_events();
    assert_eq!(gang_sim.vm_location(1), Some(a));
    assert_eq!(gang_sim.vm_status(1), VmStatus::Running);
    let records = gang_sim.migration_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_host, None);
}

#[test]
// Hosts and the placement policy can be described in a YAML config file.
fn test_config_driven_simulation() {
    let sim = Simulation::new(123);
    let config = SimulationConfig::from_file(&name_wrapper("config.yaml"));
    assert_float_eq(config.message_delay, 0.2);
    assert_float_eq(config.migration_bandwidth_fraction, 0.5);
    assert_eq!(config.policy, "first-fit");
    assert_eq!(config.hosts.len(), 2);

    let mut gang_sim = GangSimulation::new(sim, config);
    let hosts = gang_sim.add_hosts_from_config();
    assert_eq!(hosts.len(), 3);
    assert_eq!(gang_sim.host_name(hosts[0]), "source");
    assert_eq!(gang_sim.host_name(hosts[1]), "target1");
    assert_eq!(gang_sim.host_name(hosts[2]), "target2");

    assert!(gang_sim.spawn_vm_on_host(1, 2000, 1250, 1000, 10_000, 2, hosts[0]));
    assert!(gang_sim.spawn_vm_on_host(2, 2000, 2500, 1000, 10_000, 2, hosts[0]));
    let group = gang_sim.add_vm_group(&[1, 2]);
    gang_sim.migrate_group(group);
    gang_sim.step_until_no_events();

    // first fit routes both VMs to the first non-current host
    assert_eq!(gang_sim.vm_location(1), Some(hosts[1]));
    assert_eq!(gang_sim.vm_location(2), Some(hosts[1]));
    assert_eq!(gang_sim.migration_records().len(), 2);
}

#[test]
// Migration records can be exported to CSV.
fn test_save_migration_records() {
    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    let a = gang_sim.add_host("a", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));
    let _b = gang_sim.add_host("b", spec(100_000, 100_000, 10_000, 1_000_000, 100, Distribution::Private));
    assert!(gang_sim.spawn_vm_on_host(1, 2000, 1250, 1000, 10_000, 2, a));
    let group = gang_sim.add_vm_group(&[1]);
    gang_sim.migrate_group(group);
    gang_sim.step_until_no_events();

    let path = std::env::temp_dir().join("gangsim_migration_records.csv");
    gang_sim.save_migration_records(path.to_str().unwrap()).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("vm_id,"));
    assert_eq!(contents.lines().count(), 2);
    std::fs::remove_file(&path).unwrap();
}

#[test]
#[should_panic(expected = "completion payload")]
// A completion callback whose payload does not resolve to an in-flight batch
// is a precondition violation and must surface loudly.
fn test_malformed_completion_payload() {
    let sim = Simulation::new(123);
    let gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    let coordinator = gang_sim.coordinator();
    let event = Event {
        id: 0,
        time: 0.,
        src: 0,
        dest: 0,
        data: Box::new(BatchMigrationCompleted { batch_id: 42 }),
    };
    coordinator.borrow_mut().on(event);
}

#[test]
// The dependency relation is kept in both directions and stays advisory.
fn test_dependency_graph() {
    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, SimulationConfig::new());

    gang_sim.add_dependency(1, 0);
    gang_sim.add_dependency(3, 2);
    gang_sim.add_dependency(3, 0);

    let graph = gang_sim.dependency_graph();
    assert_eq!(graph.get_prerequisites(1), &[0]);
    assert_eq!(graph.get_prerequisites(3), &[2, 0]);
    assert_eq!(graph.get_dependents(0), &[1, 3]);
    assert!(graph.get_dependents(1).is_empty());
    assert!(graph.has_dependencies(2));
    assert!(!graph.has_dependencies(4));
}
