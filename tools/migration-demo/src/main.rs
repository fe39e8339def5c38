use clap::Parser;
use log::info;

use gangsim_core::simulation::Simulation;

use gangsim_iaas::core::common::Distribution;
use gangsim_iaas::core::config::SimulationConfig;
use gangsim_iaas::core::power_model::LinearPowerModel;
use gangsim_iaas::core::resource_pool::HostSpec;
use gangsim_iaas::simulation::GangSimulation;

const HOST_MIPS_PER_CORE: u64 = 2000;
const BASE_HOST_RAM: u64 = 10_000;
const BASE_HOST_BW: u64 = 10_000;
const BASE_HOST_STORAGE: u64 = 150_000;

const VM_CORES: u32 = 2;
const VM_MIPS: u64 = 4000;
const VM_RAM: u64 = 1200;
const VM_BW: u64 = 1200;
const VM_STORAGE: u64 = 10_000;

const MAX_POWER: f64 = 100.;
const STATIC_POWER: f64 = 50.;

/// Migrates a group of VMs off their first host using the selected placement policy.
#[derive(Parser)]
struct Args {
    /// Placement policy (ff, bf, wf, rr, rand, pbfd, brute or their long names)
    #[clap(long, default_value = "first-fit")]
    policy: String,

    /// Number of hosts
    #[clap(long, default_value_t = 4)]
    hosts: u32,

    /// Number of VMs in the migrated group
    #[clap(long, default_value_t = 8)]
    vms: u32,

    /// Path for saving migration records in CSV format
    #[clap(long)]
    results: Option<String>,
}

fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn main() {
    init_logger();
    let args = Args::parse();

    let mut config = SimulationConfig::new();
    config.policy = args.policy.clone();

    let sim = Simulation::new(123);
    let mut gang_sim = GangSimulation::new(sim, config);

    // host resources grow with the host number, as does the core count
    let mut host_ids = Vec::new();
    for i in 1..=args.hosts as u64 {
        let cores = args.vms * 4 + i as u32;
        let spec = HostSpec {
            cpu_mips: cores as u64 * HOST_MIPS_PER_CORE,
            ram: BASE_HOST_RAM * i,
            bandwidth: BASE_HOST_BW * i,
            storage: BASE_HOST_STORAGE * i,
            cores,
            active: true,
            distribution: Distribution::Private,
            power_model: Box::new(LinearPowerModel::new(MAX_POWER, STATIC_POWER)),
        };
        host_ids.push(gang_sim.add_host(&format!("host{}", i), spec));
    }

    // the whole group starts out packed on the first host
    let mut vm_ids = Vec::new();
    for vm_id in 1..=args.vms {
        if gang_sim.spawn_vm_on_host(vm_id, VM_MIPS, VM_RAM, VM_BW, VM_STORAGE, VM_CORES, host_ids[0]) {
            vm_ids.push(vm_id);
        }
    }
    if vm_ids.len() >= 4 {
        gang_sim.add_dependency(vm_ids[1], vm_ids[0]);
        gang_sim.add_dependency(vm_ids[3], vm_ids[2]);
    }
    let group = gang_sim.add_vm_group(&vm_ids);

    gang_sim.step_for_duration(5.);
    gang_sim.migrate_group(group);
    gang_sim.step_until_no_events();

    let records = gang_sim.migration_records();
    info!(
        "{} of {} vms migrated with the {} policy in {:.2} s of simulated time",
        records.len(),
        vm_ids.len(),
        args.policy,
        gang_sim.current_time()
    );

    println!("| {:<5} | {:<11} | {:<11} | {:<18} |", "VM", "Source", "Target", "Migration Time (s)");
    for record in &records {
        let source = record
            .source_host
            .map_or("-".to_string(), |host_id| gang_sim.host_name(host_id));
        println!(
            "| {:<5} | {:<11} | {:<11} | {:<18.4} |",
            record.vm_id,
            source,
            gang_sim.host_name(record.destination_host),
            record.duration
        );
    }

    let failures = gang_sim.coordinator().borrow().failures().to_vec();
    for failure in &failures {
        println!("! {}", failure);
    }

    if let Some(path) = &args.results {
        gang_sim
            .save_migration_records(path)
            .unwrap_or_else(|_| panic!("Can't save migration records to {}", path));
        info!("migration records saved to {}", path);
    }
}
