//! Resource types consumed by the actuator
//!
//! - [`Machine`] and [`Cluster`]: the declarative resources being reconciled
//! - [`azure`]: provider spec/status carried inside their opaque blobs

pub mod azure;
mod cluster;
mod machine;

pub use azure::{
    AzureClusterProviderSpec, AzureClusterProviderStatus, AzureMachineProviderCondition,
    AzureMachineProviderSpec, AzureMachineProviderStatus, ConditionStatus, Image, ManagedDisk,
    NetworkSpec, NetworkStatus, OsDisk, SubnetSpec, VmState, VnetSpec,
};
pub use cluster::{Cluster, ClusterSpec, ClusterStatus};
pub use machine::{Machine, MachineSpec, MachineStatus};

use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde::{Deserialize, Serialize};

/// Wrapper for the opaque provider configuration of a Machine or Cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ProviderSpec {
    /// Provider configuration, decoded by the actuator's codec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RawExtension>,
}

impl ProviderSpec {
    /// Wrap an already-built extension
    pub fn from_extension(value: RawExtension) -> Self {
        Self { value: Some(value) }
    }
}
