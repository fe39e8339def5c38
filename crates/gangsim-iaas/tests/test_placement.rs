use gangsim_iaas::core::common::{AllocationVerdict, Distribution};
use gangsim_iaas::core::placement_policies::best_fit::BestFit;
use gangsim_iaas::core::placement_policies::brute_force::BruteForce;
use gangsim_iaas::core::placement_policies::first_fit::FirstFit;
use gangsim_iaas::core::placement_policies::power_aware_best_fit::PowerAwareBestFit;
use gangsim_iaas::core::placement_policies::random::RandomFit;
use gangsim_iaas::core::placement_policies::round_robin::RoundRobin;
use gangsim_iaas::core::placement_policies::worst_fit::WorstFit;
use gangsim_iaas::core::placement_policy::{is_suitable, placement_policy_resolver, PendingAssignments, PlacementPolicy};
use gangsim_iaas::core::power_model::{ConstantPowerModel, LinearPowerModel};
use gangsim_iaas::core::resource_pool::{HostSpec, ResourcePoolState};
use gangsim_iaas::core::vm::VirtualMachine;

fn spec(cpu_mips: u64, ram: u64, bandwidth: u64, storage: u64, cores: u32) -> HostSpec {
    HostSpec {
        cpu_mips,
        ram,
        bandwidth,
        storage,
        cores,
        active: true,
        distribution: Distribution::Private,
        power_model: Box::new(ConstantPowerModel::new(0.)),
    }
}

fn inactive(mut spec: HostSpec) -> HostSpec {
    spec.active = false;
    spec
}

#[test]
// Host is viable iff every dimension stays non-negative after subtracting the
// VM demand, the pending demand and the 10% CPU/RAM migration margin.
fn test_suitability_margin() {
    let mut pool = ResourcePoolState::new();
    pool.add_host(1, spec(1000, 1000, 1000, 1000, 10));

    // exact fit against the margin
    assert!(is_suitable(&pool, 1, &VirtualMachine::new(1, 900, 900, 1000, 1000, 10), &[]));
    // one unit over in a single dimension flips the verdict
    assert!(!is_suitable(&pool, 1, &VirtualMachine::new(2, 901, 900, 1000, 1000, 10), &[]));
    assert!(!is_suitable(&pool, 1, &VirtualMachine::new(3, 900, 901, 1000, 1000, 10), &[]));
    assert!(!is_suitable(&pool, 1, &VirtualMachine::new(4, 900, 900, 1001, 1000, 10), &[]));
    assert!(!is_suitable(&pool, 1, &VirtualMachine::new(5, 900, 900, 1000, 1001, 10), &[]));
    assert!(!is_suitable(&pool, 1, &VirtualMachine::new(6, 900, 900, 1000, 1000, 11), &[]));

    // pending VMs consume availability just like the probe VM does
    let vm = VirtualMachine::new(7, 450, 450, 500, 500, 5);
    assert!(is_suitable(&pool, 1, &vm, &[vm.clone()]));
    assert!(!is_suitable(&pool, 1, &vm, &[vm.clone(), vm.clone()]));

    // a failed host is never viable
    pool.set_failed(1, true);
    assert!(!is_suitable(&pool, 1, &VirtualMachine::new(8, 1, 1, 1, 1, 1), &[]));
}

#[test]
// Suitability checks read the pool without mutating it.
fn test_selection_does_not_mutate_pool() {
    let mut pool = ResourcePoolState::new();
    pool.add_host(1, spec(10000, 10000, 10000, 100000, 16));
    pool.add_host(2, spec(10000, 10000, 10000, 100000, 16));

    let vm = VirtualMachine::new(1, 1000, 1000, 100, 1000, 2);
    let selected = BestFit::new().select_host(&vm, &pool, None, &PendingAssignments::new());
    assert!(selected.is_some());
    assert_eq!(pool.get_available_cpu(1), 10000);
    assert_eq!(pool.get_available_cpu(2), 10000);
    assert_eq!(pool.get_free_cores(1), 16);
    assert_eq!(pool.get_free_cores(2), 16);
}

#[test]
// First fit returns the first viable host in inventory order,
// excluding the current host of the VM.
fn test_first_fit() {
    let mut pool = ResourcePoolState::new();
    pool.add_host(1, spec(10000, 10000, 10000, 100000, 16));
    pool.add_host(2, spec(10000, 10000, 10000, 100000, 16));

    let vm = VirtualMachine::new(1, 1000, 1000, 100, 1000, 2);
    let policy = FirstFit::new();
    assert_eq!(policy.select_host(&vm, &pool, None, &PendingAssignments::new()), Some(1));
    assert_eq!(policy.select_host(&vm, &pool, Some(1), &PendingAssignments::new()), Some(2));
    assert_eq!(policy.select_host(&vm, &pool, Some(1), &PendingAssignments::new()), Some(2));
}

#[test]
// Best fit selects the viable host with the fewest free processing elements.
fn test_best_fit() {
    let mut pool = ResourcePoolState::new();
    pool.add_host(1, spec(10000, 10000, 10000, 100000, 4));
    pool.add_host(2, spec(10000, 10000, 10000, 100000, 1));
    pool.add_host(3, spec(10000, 10000, 10000, 100000, 7));

    let vm = VirtualMachine::new(1, 1000, 1000, 100, 1000, 1);
    assert_eq!(
        BestFit::new().select_host(&vm, &pool, None, &PendingAssignments::new()),
        Some(2)
    );
}

#[test]
// Worst fit prefers active hosts over inactive ones before comparing free
// processing elements.
fn test_worst_fit() {
    let mut pool = ResourcePoolState::new();
    pool.add_host(1, spec(10000, 10000, 10000, 100000, 4));
    pool.add_host(2, inactive(spec(10000, 10000, 10000, 100000, 7)));
    pool.add_host(3, spec(10000, 10000, 10000, 100000, 6));

    let vm = VirtualMachine::new(1, 1000, 1000, 100, 1000, 1);
    assert_eq!(
        WorstFit::new().select_host(&vm, &pool, None, &PendingAssignments::new()),
        Some(3)
    );

    // with no active host left, the most spacious inactive one wins
    pool.set_active(1, false);
    pool.set_active(3, false);
    assert_eq!(
        WorstFit::new().select_host(&vm, &pool, None, &PendingAssignments::new()),
        Some(2)
    );
}

#[test]
// The round robin cursor advances once per examined candidate and wraps
// modulo the inventory size.
fn test_round_robin() {
    let mut pool = ResourcePoolState::new();
    pool.add_host(1, spec(10000, 10000, 10000, 100000, 16));
    pool.add_host(2, spec(10000, 10000, 10000, 100000, 16));
    pool.add_host(3, spec(10000, 10000, 10000, 100000, 16));

    let vm = VirtualMachine::new(1, 1000, 1000, 100, 1000, 2);
    let pending = PendingAssignments::new();

    let mut policy = RoundRobin::new();
    assert_eq!(policy.select_host(&vm, &pool, None, &pending), Some(1));
    assert_eq!(policy.cursor(), 1);
    assert_eq!(policy.select_host(&vm, &pool, None, &pending), Some(2));
    assert_eq!(policy.select_host(&vm, &pool, None, &pending), Some(3));
    assert_eq!(policy.cursor(), 0);
    assert_eq!(policy.select_host(&vm, &pool, None, &pending), Some(1));

    // an unsuitable candidate still advances the cursor
    pool.set_failed(2, true);
    let mut policy = RoundRobin::new();
    assert_eq!(policy.select_host(&vm, &pool, None, &pending), Some(1));
    assert_eq!(policy.select_host(&vm, &pool, None, &pending), Some(3));
    assert_eq!(policy.cursor(), 0);

    // exhausting the inventory examines each host exactly once
    pool.set_failed(1, true);
    pool.set_failed(3, true);
    let mut policy = RoundRobin::new();
    assert_eq!(policy.select_host(&vm, &pool, None, &pending), None);
    assert_eq!(policy.cursor(), 0);
}

#[test]
// Random fit draws at most inventory-size candidates; draws landing on the
// current host or on unsuitable hosts consume a try.
fn test_random_fit() {
    let mut pool = ResourcePoolState::new();
    pool.add_host(1, spec(10000, 10000, 10000, 100000, 16));

    let vm = VirtualMachine::new(1, 1000, 1000, 100, 1000, 2);
    let pending = PendingAssignments::new();

    assert_eq!(RandomFit::new(123).select_host(&vm, &pool, None, &pending), Some(1));
    assert_eq!(RandomFit::new(123).select_host(&vm, &pool, Some(1), &pending), None);

    pool.set_failed(1, true);
    assert_eq!(RandomFit::new(123).select_host(&vm, &pool, None, &pending), None);

    pool.set_failed(1, false);
    pool.add_host(2, spec(10000, 10000, 10000, 100000, 16));
    pool.add_host(3, spec(10000, 10000, 10000, 100000, 16));
    let selected = RandomFit::new(123).select_host(&vm, &pool, None, &pending);
    assert!(matches!(selected, Some(1..=3)));
}

#[test]
// PBFD minimizes the increase of modeled power draw and skips inactive hosts
// even when their power delta would be the smallest.
fn test_power_aware_best_fit() {
    let mut pool = ResourcePoolState::new();
    let mut h1 = spec(1000, 10000, 10000, 100000, 16);
    h1.power_model = Box::new(LinearPowerModel::new(200., 100.));
    let mut h2 = spec(1000, 10000, 10000, 100000, 16);
    h2.power_model = Box::new(LinearPowerModel::new(120., 100.));
    let mut h3 = spec(1000, 10000, 10000, 100000, 16);
    h3.power_model = Box::new(ConstantPowerModel::new(0.));
    h3.active = false;
    pool.add_host(1, h1);
    pool.add_host(2, h2);
    pool.add_host(3, h3);

    let vm = VirtualMachine::new(1, 100, 1000, 100, 1000, 2);
    assert_eq!(
        PowerAwareBestFit::new().select_host(&vm, &pool, None, &PendingAssignments::new()),
        Some(2)
    );
}

#[test]
// Brute force maximizes the resulting CPU utilization ratio over all hosts.
fn test_brute_force() {
    let mut pool = ResourcePoolState::new();
    pool.add_host(1, spec(10000, 100000, 10000, 1000000, 100));
    pool.add_host(2, spec(10000, 100000, 10000, 1000000, 100));

    // utilization after placement: (5200 + 1000) / 10000 = 0.62 on host 1,
    // (4800 + 1000) / 10000 = 0.58 on host 2
    assert_eq!(pool.allocate(&VirtualMachine::new(10, 5200, 100, 10, 100, 1), 1), AllocationVerdict::Success);
    assert_eq!(pool.allocate(&VirtualMachine::new(11, 4800, 100, 10, 100, 1), 2), AllocationVerdict::Success);

    let vm = VirtualMachine::new(1, 1000, 1000, 100, 1000, 2);
    assert_eq!(
        BruteForce::new().select_host(&vm, &pool, None, &PendingAssignments::new()),
        Some(1)
    );
}

#[test]
// The resolver accepts both long and short policy names.
fn test_policy_resolver() {
    assert!(matches!(placement_policy_resolver("first-fit", 123), PlacementPolicy::FirstFit(_)));
    assert!(matches!(placement_policy_resolver("ff", 123), PlacementPolicy::FirstFit(_)));
    assert!(matches!(placement_policy_resolver("bf", 123), PlacementPolicy::BestFit(_)));
    assert!(matches!(placement_policy_resolver("wf", 123), PlacementPolicy::WorstFit(_)));
    assert!(matches!(placement_policy_resolver("rr", 123), PlacementPolicy::RoundRobin(_)));
    assert!(matches!(placement_policy_resolver("rand", 123), PlacementPolicy::Random(_)));
    assert!(matches!(
        placement_policy_resolver("pbfd", 123),
        PlacementPolicy::PowerAwareBestFit(_)
    ));
    assert!(matches!(placement_policy_resolver("brute", 123), PlacementPolicy::BruteForce(_)));
}

#[test]
#[should_panic]
fn test_policy_resolver_unknown() {
    placement_policy_resolver("next-fit", 123);
}
