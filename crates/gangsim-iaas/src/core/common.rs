use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Datacenter distribution model of a host.
///
/// Migrations between two privately distributed hosts are performed live,
/// any migration crossing into or out of a public-cloud context is not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    Private,
    Public,
}

/// Result of checking or performing a VM allocation on a host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationVerdict {
    Success,
    NotEnoughCpu,
    NotEnoughMemory,
    NotEnoughBandwidth,
    NotEnoughStorage,
    NotEnoughCores,
    HostFailed,
    HostNotFound,
}

impl Display for AllocationVerdict {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            AllocationVerdict::Success => write!(f, "success"),
            AllocationVerdict::NotEnoughCpu => write!(f, "not enough CPU"),
            AllocationVerdict::NotEnoughMemory => write!(f, "not enough memory"),
            AllocationVerdict::NotEnoughBandwidth => write!(f, "not enough bandwidth"),
            AllocationVerdict::NotEnoughStorage => write!(f, "not enough storage"),
            AllocationVerdict::NotEnoughCores => write!(f, "not enough cores"),
            AllocationVerdict::HostFailed => write!(f, "host is failed"),
            AllocationVerdict::HostNotFound => write!(f, "host not found"),
        }
    }
}
