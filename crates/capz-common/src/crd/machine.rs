//! Machine resource (machine.openshift.io/v1beta1)
//!
//! Only the fields the actuator reads or writes are modelled. Everything else
//! the machine API stores (taints, node metadata, last operation, ...) is kept
//! verbatim in `extra` so a full replace writes it back unchanged. The
//! provider specific parts live in opaque [`RawExtension`] blobs that are
//! decoded by the actuator's codec.

use k8s_openapi::api::core::v1::{NodeAddress, ObjectReference};
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ProviderSpec;

/// Specification of a Machine
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "machine.openshift.io",
    version = "v1beta1",
    kind = "Machine",
    plural = "machines",
    status = "MachineStatus",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// Provider-specific configuration used to create the instance
    #[serde(default)]
    pub provider_spec: ProviderSpec,

    /// Identifier of the instance as known by the cloud provider
    #[serde(rename = "providerID", default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Fields not modelled above, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Observed state of a Machine
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatus {
    /// Node backed by this machine, once it has joined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_ref: Option<ObjectReference>,

    /// Last time the status was written (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    /// Provider-specific status, opaque to the machine API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_status: Option<RawExtension>,

    /// Addresses assigned to the machine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<NodeAddress>,

    /// Machine-readable reason for a terminal failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,

    /// Human-readable message for a terminal failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Lifecycle phase reported by the machine controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Fields not modelled above, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;

    #[test]
    fn machine_api_coordinates() {
        assert_eq!(Machine::group(&()), "machine.openshift.io");
        assert_eq!(Machine::version(&()), "v1beta1");
        assert_eq!(Machine::kind(&()), "Machine");
        assert_eq!(Machine::plural(&()), "machines");
    }

    #[test]
    fn machine_status_uses_wire_names() {
        let status = MachineStatus {
            provider_status: Some(RawExtension(serde_json::json!({"vmId": "abc"}))),
            addresses: vec![NodeAddress {
                type_: "InternalIP".to_string(),
                address: "10.0.0.4".to_string(),
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["providerStatus"]["vmId"], "abc");
        assert_eq!(value["addresses"][0]["type"], "InternalIP");
        assert!(value.get("errorReason").is_none());
    }

    #[test]
    fn machine_spec_provider_id_wire_name() {
        let spec = MachineSpec {
            provider_id: Some("azure:///subscriptions/x".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["providerID"], "azure:///subscriptions/x");
    }

    #[test]
    fn unmodelled_fields_survive_a_round_trip() {
        let wire = serde_json::json!({
            "apiVersion": "machine.openshift.io/v1beta1",
            "kind": "Machine",
            "metadata": { "name": "worker-0", "namespace": "openshift-machine-api" },
            "spec": {
                "providerSpec": { "value": { "location": "eastus" } },
                "taints": [{ "key": "dedicated", "value": "infra", "effect": "NoSchedule" }],
                "metadata": { "labels": { "node-role.kubernetes.io/infra": "" } }
            },
            "status": {
                "phase": "Running",
                "lastOperation": { "state": "Successful", "type": "Create" }
            }
        });

        let machine: Machine = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(machine.spec.extra["taints"], wire["spec"]["taints"]);
        assert!(!machine.spec.extra.contains_key("providerSpec"));

        let value = serde_json::to_value(&machine).unwrap();
        assert_eq!(value["spec"]["taints"], wire["spec"]["taints"]);
        assert_eq!(value["spec"]["metadata"], wire["spec"]["metadata"]);
        assert_eq!(value["spec"]["providerSpec"], wire["spec"]["providerSpec"]);
        assert_eq!(value["status"]["lastOperation"], wire["status"]["lastOperation"]);
        assert_eq!(value["status"]["phase"], "Running");
    }
}
