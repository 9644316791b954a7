//! Cluster resource (cluster.k8s.io/v1alpha1)
//!
//! The actuator only reads the cluster; it never writes it back.

use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use super::ProviderSpec;

/// Specification of a Cluster
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "cluster.k8s.io",
    version = "v1alpha1",
    kind = "Cluster",
    plural = "clusters",
    status = "ClusterStatus",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Provider-specific cluster configuration
    #[serde(default)]
    pub provider_spec: ProviderSpec,
}

/// Observed state of a Cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// Provider-specific status, opaque to the cluster API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_status: Option<RawExtension>,
}
