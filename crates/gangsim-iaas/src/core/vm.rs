//! Representations of virtual machine and its status.

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Status of virtual machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VmStatus {
    Running,
    Migrating,
    Paused,
    FailedToAllocate,
}

impl Display for VmStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            VmStatus::Running => write!(f, "running"),
            VmStatus::Migrating => write!(f, "migrating"),
            VmStatus::Paused => write!(f, "paused"),
            VmStatus::FailedToAllocate => write!(f, "failed_to_allocate"),
        }
    }
}

/// Represents virtual machine (VM).
///
/// A VM is characterized by its ID and resource demand in five dimensions:
/// CPU rate in MIPS, memory and storage in MB, network bandwidth in Mbit/s
/// and the number of processing elements (cores). The placement of a VM is
/// tracked via `current_host`, its membership in a migration group via the
/// `group` back-reference, and the migration flags mirror the per-host
/// migrating-in/migrating-out sets for the lifetime of one migration.
#[derive(Clone)]
pub struct VirtualMachine {
    pub id: u32,
    pub cpu_mips: u64,
    pub ram: u64,
    pub bandwidth: u64,
    pub storage: u64,
    pub cores: u32,
    pub current_host: Option<u32>,
    pub group: Option<u32>,
    pub migrating_in: bool,
    pub migrating_out: bool,
    pub status: VmStatus,
}

impl VirtualMachine {
    /// Creates virtual machine with specified resource demand.
    pub fn new(id: u32, cpu_mips: u64, ram: u64, bandwidth: u64, storage: u64, cores: u32) -> Self {
        Self {
            id,
            cpu_mips,
            ram,
            bandwidth,
            storage,
            cores,
            current_host: None,
            group: None,
            migrating_in: false,
            migrating_out: false,
            status: VmStatus::Running,
        }
    }

    /// Returns true if the VM takes part in an in-flight migration.
    pub fn is_migrating(&self) -> bool {
        self.migrating_in || self.migrating_out
    }
}
