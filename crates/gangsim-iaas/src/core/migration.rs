//! Migration batches, records and failure notices.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::core::common::AllocationVerdict;

/// Lifecycle of one migration sub-batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    Planned,
    Admitted,
    InFlight,
    Completed,
    Rejected,
}

/// One VM inside a sub-batch with its source host captured at admission time.
#[derive(Clone, Debug)]
pub struct BatchMember {
    pub vm_id: u32,
    pub source_host: Option<u32>,
}

/// The subset of a VM group routed to one destination host.
///
/// The signed `duration` encodes the migration mode of the whole batch:
/// non-negative values denote live migration, negative values denote non-live
/// migration with the absolute value being the actual delay.
#[derive(Clone, Debug)]
pub struct SubBatch {
    pub id: u64,
    pub group_id: u32,
    pub destination: u32,
    pub members: Vec<BatchMember>,
    pub duration: f64,
    pub status: BatchStatus,
    pub start_time: f64,
}

impl SubBatch {
    pub fn is_live(&self) -> bool {
        self.duration >= 0.
    }
}

/// Immutable result of one completed VM migration.
///
/// The downtime, energy and cost fields are reserved for future use and are
/// currently always zero.
#[derive(Clone, Debug, Serialize)]
pub struct MigrationRecord {
    pub vm_id: u32,
    pub source_host: Option<u32>,
    pub destination_host: u32,
    pub duration: f64,
    pub downtime: f64,
    pub energy: f64,
    pub cost: f64,
}

/// Failure notices produced by planning, admission and completion.
#[derive(Clone, Debug, PartialEq)]
pub enum MigrationError {
    /// No policy could find a viable host for the VM; its migration is skipped.
    PlacementExhausted { vm_id: u32 },
    /// A sub-batch capacity reservation failed partway; the whole sub-batch
    /// was rolled back and not scheduled.
    AdmissionRejected { batch_id: u64, destination: u32 },
    /// A single VM failed final allocation after the deferred delay.
    AllocationFailed {
        vm_id: u32,
        host_id: u32,
        verdict: AllocationVerdict,
    },
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            MigrationError::PlacementExhausted { vm_id } => {
                write!(f, "no suitable host found for vm {}", vm_id)
            }
            MigrationError::AdmissionRejected { batch_id, destination } => {
                write!(f, "admission of batch {} to host {} rejected", batch_id, destination)
            }
            MigrationError::AllocationFailed { vm_id, host_id, verdict } => {
                write!(f, "allocation of vm {} on host {} failed: {}", vm_id, host_id, verdict)
            }
        }
    }
}

/// Outcome of planning and dispatching one VM group.
#[derive(Clone, Debug, Default)]
pub struct DispatchResult {
    /// IDs of sub-batches admitted and scheduled for completion.
    pub dispatched: Vec<u64>,
    /// IDs of sub-batches rejected at admission time.
    pub rejected: Vec<u64>,
    /// VMs for which no viable destination was found.
    pub unplaced: Vec<u32>,
}
