//! Provider spec/status codec
//!
//! Converts between the opaque [`RawExtension`] blobs stored on Machines and
//! Clusters and the typed Azure provider structures. All functions are pure.
//!
//! An absent or `null` blob decodes to the zero value: a freshly created
//! Machine has no provider status yet, and that is not an error.

use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use capz_common::crd::{
    AzureClusterProviderSpec, AzureClusterProviderStatus, AzureMachineProviderSpec,
    AzureMachineProviderStatus,
};
use capz_common::yaml::parse_yaml;
use capz_common::Error;

/// A typed payload that travels inside a [`RawExtension`]
pub trait ProviderPayload: Serialize + DeserializeOwned + Default {
    /// Name used in codec errors
    const KIND: &'static str;
}

impl ProviderPayload for AzureMachineProviderSpec {
    const KIND: &'static str = "AzureMachineProviderSpec";
}

impl ProviderPayload for AzureMachineProviderStatus {
    const KIND: &'static str = "AzureMachineProviderStatus";
}

impl ProviderPayload for AzureClusterProviderSpec {
    const KIND: &'static str = "AzureClusterProviderSpec";
}

impl ProviderPayload for AzureClusterProviderStatus {
    const KIND: &'static str = "AzureClusterProviderStatus";
}

/// Decode an optional extension into `T`
pub fn decode<T: ProviderPayload>(raw: Option<&RawExtension>) -> Result<T, Error> {
    match raw {
        None => Ok(T::default()),
        Some(ext) => decode_value(ext.0.clone()),
    }
}

/// Encode `T` into an extension
pub fn encode<T: ProviderPayload>(value: &T) -> Result<RawExtension, Error> {
    serde_json::to_value(value)
        .map(RawExtension)
        .map_err(|e| Error::codec(T::KIND, format!("failed to encode: {}", e)))
}

/// Decode a raw JSON or YAML blob into `T`
///
/// Empty or whitespace-only input yields the zero value.
pub fn decode_bytes<T: ProviderPayload>(raw: &[u8]) -> Result<T, Error> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| Error::codec(T::KIND, format!("blob is not UTF-8: {}", e)))?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    let value = parse_yaml(text).map_err(|e| Error::codec(T::KIND, e.to_string()))?;
    decode_value(value)
}

/// Build an extension from YAML or JSON text
pub fn extension_from_yaml(text: &str) -> Result<RawExtension, Error> {
    parse_yaml(text).map(RawExtension)
}

fn decode_value<T: ProviderPayload>(value: Value) -> Result<T, Error> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|e| Error::codec(T::KIND, e.to_string()))
}

/// Decode a machine provider spec
pub fn machine_spec(raw: Option<&RawExtension>) -> Result<AzureMachineProviderSpec, Error> {
    decode(raw)
}

/// Decode a machine provider status
pub fn machine_status(raw: Option<&RawExtension>) -> Result<AzureMachineProviderStatus, Error> {
    decode(raw)
}

/// Decode a cluster provider spec
pub fn cluster_spec(raw: Option<&RawExtension>) -> Result<AzureClusterProviderSpec, Error> {
    decode(raw)
}

/// Decode a cluster provider status
pub fn cluster_status(raw: Option<&RawExtension>) -> Result<AzureClusterProviderStatus, Error> {
    decode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capz_common::crd::{
        AzureMachineProviderCondition, ConditionStatus, Image, NetworkSpec, OsDisk, SubnetSpec,
        VmState, VnetSpec,
    };
    use k8s_openapi::api::core::v1::SecretReference;
    use std::collections::BTreeMap;

    fn full_machine_spec() -> AzureMachineProviderSpec {
        AzureMachineProviderSpec {
            user_data_secret: Some(SecretReference {
                name: Some("worker-user-data".to_string()),
                namespace: None,
            }),
            credentials_secret: Some(SecretReference {
                name: Some("azure-cloud-credentials".to_string()),
                namespace: Some("openshift-machine-api".to_string()),
            }),
            location: "centralus".to_string(),
            vm_size: "Standard_D4s_v3".to_string(),
            image: Some(Image {
                resource_id: "/resourceGroups/rg/providers/Microsoft.Compute/images/rhcos"
                    .to_string(),
                ..Default::default()
            }),
            os_disk: Some(OsDisk {
                os_type: "Linux".to_string(),
                disk_size_gb: 128,
                ..Default::default()
            }),
            public_ip: true,
            tags: BTreeMap::from([("owner".to_string(), "infra".to_string())]),
            subnet: "worker-subnet".to_string(),
            vnet: "cluster-vnet".to_string(),
            zone: Some("2".to_string()),
            resource_group: "cluster-rg".to_string(),
            managed_identity: "cluster-identity".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn absent_extension_decodes_to_zero_value() {
        assert_eq!(machine_spec(None).unwrap(), AzureMachineProviderSpec::default());
        assert_eq!(
            machine_status(Some(&RawExtension(Value::Null))).unwrap(),
            AzureMachineProviderStatus::default()
        );
    }

    #[test]
    fn machine_spec_round_trips() {
        let spec = full_machine_spec();
        let ext = encode(&spec).unwrap();
        assert_eq!(machine_spec(Some(&ext)).unwrap(), spec);
    }

    #[test]
    fn zero_values_round_trip() {
        let ext = encode(&AzureMachineProviderSpec::default()).unwrap();
        assert_eq!(machine_spec(Some(&ext)).unwrap(), AzureMachineProviderSpec::default());

        let ext = encode(&AzureMachineProviderStatus::default()).unwrap();
        assert_eq!(
            machine_status(Some(&ext)).unwrap(),
            AzureMachineProviderStatus::default()
        );

        let ext = encode(&AzureClusterProviderSpec::default()).unwrap();
        assert_eq!(cluster_spec(Some(&ext)).unwrap(), AzureClusterProviderSpec::default());
    }

    #[test]
    fn machine_status_round_trips_with_conditions() {
        let mut status = AzureMachineProviderStatus {
            vm_id: Some("/subscriptions/s/resourceGroups/rg/providers/vm/worker-0".to_string()),
            vm_state: Some(VmState::Running),
            conditions: Vec::new(),
        };
        status.set_condition(AzureMachineProviderCondition::new(
            "MachineCreated",
            ConditionStatus::True,
            "MachineCreationSucceeded",
            "machine successfully created",
        ));

        let ext = encode(&status).unwrap();
        assert_eq!(ext.0["vmState"], "Running");
        assert_eq!(machine_status(Some(&ext)).unwrap(), status);
    }

    #[test]
    fn cluster_spec_round_trips() {
        let spec = AzureClusterProviderSpec {
            resource_group: "rg".to_string(),
            location: "eastus".to_string(),
            network_spec: NetworkSpec {
                vnet: VnetSpec {
                    name: "vnet".to_string(),
                    cidr_block: "10.0.0.0/8".to_string(),
                    ..Default::default()
                },
                subnets: vec![SubnetSpec {
                    role: "worker".to_string(),
                    name: "workers".to_string(),
                    cidr_block: "10.1.0.0/16".to_string(),
                    ..Default::default()
                }],
            },
        };
        let ext = encode(&spec).unwrap();
        assert_eq!(cluster_spec(Some(&ext)).unwrap(), spec);
    }

    #[test]
    fn malformed_extension_is_a_codec_error() {
        let ext = RawExtension(serde_json::json!({ "location": 42 }));
        let err = machine_spec(Some(&ext)).unwrap_err();
        match &err {
            Error::Codec { kind, .. } => assert_eq!(kind, "AzureMachineProviderSpec"),
            other => panic!("expected codec error, got {other:?}"),
        }
        assert!(!err.is_retryable());

        let ext = RawExtension(serde_json::json!(["not", "an", "object"]));
        assert!(cluster_status(Some(&ext)).is_err());
    }

    #[test]
    fn decode_bytes_accepts_yaml_and_json() {
        let spec: AzureMachineProviderSpec = decode_bytes(
            b"location: westus\nresourceGroup: rg\ncredentialsSecret:\n  name: creds\n",
        )
        .unwrap();
        assert_eq!(spec.location, "westus");
        assert_eq!(spec.resource_group, "rg");
        assert_eq!(
            spec.credentials_secret.and_then(|r| r.name).as_deref(),
            Some("creds")
        );

        let status: AzureMachineProviderStatus = decode_bytes(br#"{"vmId": "abc"}"#).unwrap();
        assert_eq!(status.vm_id.as_deref(), Some("abc"));
    }

    #[test]
    fn decode_bytes_empty_is_zero_value() {
        let status: AzureMachineProviderStatus = decode_bytes(b"  \n").unwrap();
        assert_eq!(status, AzureMachineProviderStatus::default());
    }

    #[test]
    fn decode_bytes_rejects_garbage() {
        let err = decode_bytes::<AzureMachineProviderSpec>(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, Error::Codec { .. }));

        let err = decode_bytes::<AzureMachineProviderSpec>(b"location: [").unwrap_err();
        match err {
            Error::Codec { kind, .. } => assert_eq!(kind, "AzureMachineProviderSpec"),
            other => panic!("expected codec error, got {other:?}"),
        }
    }

    #[test]
    fn extension_from_yaml_builds_object() {
        let ext = extension_from_yaml("vmSize: Standard_B2s\n").unwrap();
        assert_eq!(ext.0["vmSize"], "Standard_B2s");
    }
}
