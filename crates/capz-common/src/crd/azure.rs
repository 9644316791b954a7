//! Azure provider configuration and status
//!
//! These types travel inside the opaque `providerSpec.value` and
//! `providerStatus` blobs of Machines and Clusters. The actuator treats most
//! fields as pass-through data; only location, resource group and the
//! credentials secret take part in scope construction.
//!
//! Reference: <https://github.com/kubernetes-sigs/cluster-api-provider-azure>

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::SecretReference;
use serde::{Deserialize, Serialize};

/// Machine-level provider configuration (azureprovider/v1beta1)
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineProviderSpec {
    /// Secret holding cloud-init user data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_secret: Option<SecretReference>,

    /// Secret holding the Azure service principal credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret: Option<SecretReference>,

    /// Azure region; falls back to the credentials secret when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,

    /// VM size (e.g. "Standard_D4s_v3")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vm_size: String,

    /// OS image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    /// OS disk configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_disk: Option<OsDisk>,

    /// Public key installed for SSH access
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ssh_public_key: String,

    /// Attach a public IP to the primary NIC
    #[serde(rename = "publicIP", default, skip_serializing_if = "std::ops::Not::not")]
    pub public_ip: bool,

    /// Tags applied to every Azure resource created for the machine
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    /// Subnet the NIC is placed in
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subnet: String,

    /// Virtual network the subnet belongs to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vnet: String,

    /// Availability zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Resource group of the vnet when it differs from `resource_group`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_resource_group: String,

    /// Resource group for the VM; falls back to the credentials secret when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group: String,

    /// User-assigned managed identity
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub managed_identity: String,

    /// Internal load balancer backend pool to join
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub internal_load_balancer: String,

    /// Public load balancer backend pool to join
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_load_balancer: String,
}

/// OS image reference
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Marketplace publisher
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub publisher: String,
    /// Marketplace offer
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub offer: String,
    /// Marketplace SKU
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sku: String,
    /// Image version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Full resource ID of a custom image; overrides the marketplace fields
    #[serde(rename = "resourceID", default, skip_serializing_if = "String::is_empty")]
    pub resource_id: String,
}

/// OS disk configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    /// "Linux" or "Windows"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_type: String,
    /// Managed disk parameters
    #[serde(default)]
    pub managed_disk: ManagedDisk,
    /// Disk size in GiB
    #[serde(rename = "diskSizeGB", default)]
    pub disk_size_gb: i32,
}

/// Managed disk parameters
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDisk {
    /// Storage account type (e.g. "Premium_LRS")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub storage_account_type: String,
}

/// Machine-level provider status
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineProviderStatus {
    /// Azure VM ID, set once the VM exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_id: Option<String>,

    /// Provisioning state of the VM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_state: Option<VmState>,

    /// Observations of the provider's reconciliation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<AzureMachineProviderCondition>,
}

impl AzureMachineProviderStatus {
    /// Set a condition, replacing any existing condition of the same type
    ///
    /// `last_transition_time` is carried over when the status is unchanged.
    pub fn set_condition(&mut self, mut condition: AzureMachineProviderCondition) {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.type_ == condition.type_)
        {
            Some(existing) => {
                if existing.status == condition.status {
                    condition.last_transition_time = existing.last_transition_time;
                }
                *existing = condition;
            }
            None => self.conditions.push(condition),
        }
    }

    /// Look up a condition by type
    pub fn condition(&self, type_: &str) -> Option<&AzureMachineProviderCondition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }
}

/// Azure VM provisioning state
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum VmState {
    /// VM is being created
    Creating,
    /// VM is being deleted
    Deleting,
    /// Last operation on the VM failed
    Failed,
    /// VM is being migrated
    Migrating,
    /// VM is running
    Running,
    /// Last operation on the VM succeeded
    Succeeded,
    /// VM is being updated
    Updating,
    /// State reported by Azure that this actuator does not know
    #[serde(other)]
    Unknown,
}

/// Condition status following Kubernetes conventions
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

/// Provider condition recorded in the machine provider status
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureMachineProviderCondition {
    /// Type of condition (e.g. "MachineCreated")
    #[serde(rename = "type")]
    pub type_: String,
    /// Status of the condition
    pub status: ConditionStatus,
    /// Machine-readable reason
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Last time the condition was probed
    pub last_probe_time: DateTime<Utc>,
    /// Last time the status changed
    pub last_transition_time: DateTime<Utc>,
}

impl AzureMachineProviderCondition {
    /// Create a new condition stamped with the current time
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_probe_time: now,
            last_transition_time: now,
        }
    }
}

/// Cluster-level provider configuration (azureprovider/v1alpha1)
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterProviderSpec {
    /// Resource group holding the cluster's Azure resources
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_group: String,

    /// Azure region of the cluster
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,

    /// Network layout
    #[serde(default)]
    pub network_spec: NetworkSpec,
}

/// Cluster network layout
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// Virtual network
    #[serde(default)]
    pub vnet: VnetSpec,
    /// Subnets inside the vnet
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetSpec>,
}

/// Virtual network
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VnetSpec {
    /// Resource ID of an existing vnet
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Vnet name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Address space
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
}

/// Subnet inside the cluster vnet
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    /// Machine role served by the subnet ("master" or "worker")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// Resource ID of an existing subnet
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Subnet name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Address range
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr_block: String,
}

/// Cluster-level provider status
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterProviderStatus {
    /// Network resources created for the cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkStatus>,
}

/// Network resources created for the cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    /// Address of the API server load balancer
    #[serde(rename = "apiServerIP", default, skip_serializing_if = "Option::is_none")]
    pub api_server_ip: Option<String>,
    /// Name of the API server load balancer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_lb_name: Option<String>,
}
