//! Simulation configuration.

use serde::{Deserialize, Serialize};

use crate::core::common::Distribution;

/// Holds raw simulation config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawSimulationConfig {
    pub message_delay: Option<f64>,
    pub migration_bandwidth_fraction: Option<f64>,
    pub min_time_between_events: Option<f64>,
    pub seed: Option<u64>,
    pub policy: Option<String>,
    pub hosts: Option<Vec<HostConfig>>,
}

/// Holds configuration of a single physical host or a set of identical hosts.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Host name.
    /// Should be set if count = 1.
    pub name: Option<String>,
    /// Host name prefix.
    /// Full name is produced by appending host instance number to the prefix.
    /// Should be set if count > 1.
    pub name_prefix: Option<String>,
    /// Host CPU capacity in MIPS.
    pub cpu_mips: u64,
    /// Host memory capacity in MB.
    pub ram: u64,
    /// Host network bandwidth in Mbit/s.
    pub bandwidth: u64,
    /// Host storage capacity in MB.
    pub storage: u64,
    /// Number of processing elements.
    pub cores: u32,
    /// Datacenter distribution model of the host (private by default).
    pub distribution: Option<Distribution>,
    /// Whether the host is powered on (true by default).
    pub active: Option<bool>,
    /// Host power when CPU is fully utilized, in watts.
    pub max_power: Option<f64>,
    /// Host power when CPU is idle, in watts.
    pub static_power: Option<f64>,
    /// Number of such hosts.
    pub count: Option<u32>,
}

/// Represents simulation configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Message delay in seconds for communications via network.
    pub message_delay: f64,
    /// Share of destination host bandwidth allowed for migration traffic.
    pub migration_bandwidth_fraction: f64,
    /// Minimal scheduling quantum in seconds, added before resubmitting
    /// the paused workload of a non-live migrated VM.
    pub min_time_between_events: f64,
    /// Seed for policy-owned random sources.
    pub seed: u64,
    /// Placement policy used by the migration coordinator.
    pub policy: String,
    /// Configurations of physical hosts.
    pub hosts: Vec<HostConfig>,
}

impl SimulationConfig {
    /// Creates simulation config with default parameter values.
    pub fn new() -> Self {
        Self {
            message_delay: 0.2,
            migration_bandwidth_fraction: 0.5,
            min_time_between_events: 0.1,
            seed: 123,
            policy: "first-fit".to_string(),
            hosts: Vec::new(),
        }
    }

    /// Creates simulation config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Self {
        let raw: RawSimulationConfig = serde_yaml::from_str(
            &std::fs::read_to_string(file_name).unwrap_or_else(|_| panic!("Can't read file {}", file_name)),
        )
        .unwrap_or_else(|_| panic!("Can't parse YAML from file {}", file_name));

        let default = Self::new();
        Self {
            message_delay: raw.message_delay.unwrap_or(default.message_delay),
            migration_bandwidth_fraction: raw
                .migration_bandwidth_fraction
                .unwrap_or(default.migration_bandwidth_fraction),
            min_time_between_events: raw.min_time_between_events.unwrap_or(default.min_time_between_events),
            seed: raw.seed.unwrap_or(default.seed),
            policy: raw.policy.unwrap_or(default.policy),
            hosts: raw.hosts.unwrap_or_default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
