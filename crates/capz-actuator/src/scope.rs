//! Cluster-level scope
//!
//! A [`Scope`] bundles the cluster resource, its decoded provider
//! configuration and status, and the Azure credentials resolved for one
//! reconciliation pass. It is built fresh every pass and never written back.

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use capz_common::crd::{
    AzureClusterProviderSpec, AzureClusterProviderStatus, Cluster, ClusterSpec, VnetSpec,
};
use capz_common::Error;

use crate::codec;

/// Inputs for [`Scope::new`]
#[derive(Debug, Default)]
pub struct ScopeParams {
    /// Cluster the machine belongs to; `None` for a standalone machine
    pub cluster: Option<Cluster>,
}

/// Cluster configuration and credentials for one reconciliation pass
#[derive(Clone)]
pub struct Scope {
    /// Cluster resource, or an empty placeholder for a standalone machine
    pub cluster: Cluster,
    /// Decoded cluster provider configuration
    pub cluster_config: AzureClusterProviderSpec,
    /// Decoded cluster provider status
    pub cluster_status: AzureClusterProviderStatus,
    /// Azure subscription ID
    pub subscription_id: String,
    /// Azure AD tenant ID
    pub tenant_id: String,
    /// Service principal client ID
    pub client_id: String,
    /// Service principal secret
    pub client_secret: String,
    standalone: bool,
}

impl Scope {
    /// Build a scope from an optional cluster
    ///
    /// A missing cluster is not an error: the scope gets an empty cluster
    /// placeholder and zero-valued configuration.
    pub fn new(params: ScopeParams) -> Result<Self, Error> {
        let Some(cluster) = params.cluster else {
            return Ok(Self::standalone());
        };

        let cluster_config = codec::cluster_spec(cluster.spec.provider_spec.value.as_ref())?;
        let cluster_status = codec::cluster_status(
            cluster
                .status
                .as_ref()
                .and_then(|s| s.provider_status.as_ref()),
        )?;

        Ok(Self {
            cluster,
            cluster_config,
            cluster_status,
            subscription_id: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            standalone: false,
        })
    }

    fn standalone() -> Self {
        Self {
            cluster: Cluster {
                metadata: ObjectMeta::default(),
                spec: ClusterSpec::default(),
                status: None,
            },
            cluster_config: AzureClusterProviderSpec::default(),
            cluster_status: AzureClusterProviderStatus::default(),
            subscription_id: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            standalone: true,
        }
    }

    /// Whether the scope was built without a cluster resource
    pub fn is_standalone(&self) -> bool {
        self.standalone
    }

    /// Effective Azure region
    pub fn location(&self) -> &str {
        &self.cluster_config.location
    }

    /// Effective resource group
    pub fn resource_group(&self) -> &str {
        &self.cluster_config.resource_group
    }

    /// Cluster name; empty until known
    pub fn cluster_name(&self) -> &str {
        self.cluster.metadata.name.as_deref().unwrap_or_default()
    }

    pub(crate) fn set_cluster_name(&mut self, name: impl Into<String>) {
        self.cluster.metadata.name = Some(name.into());
    }

    /// Namespace of the cluster resource; empty for a standalone machine
    pub fn namespace(&self) -> &str {
        self.cluster.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// Cluster virtual network
    pub fn vnet(&self) -> &VnetSpec {
        &self.cluster_config.network_spec.vnet
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("cluster", &self.cluster_name())
            .field("standalone", &self.standalone)
            .field("cluster_config", &self.cluster_config)
            .field("cluster_status", &self.cluster_status)
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capz_common::crd::{ClusterStatus, NetworkStatus, ProviderSpec};
    use crate::codec::{encode, extension_from_yaml};

    fn cluster_with_spec(yaml: &str) -> Cluster {
        let mut cluster = Cluster::new(
            "prod",
            ClusterSpec {
                provider_spec: ProviderSpec::from_extension(extension_from_yaml(yaml).unwrap()),
            },
        );
        cluster.metadata.namespace = Some("clusters".to_string());
        cluster
    }

    #[test]
    fn nil_cluster_yields_placeholder() {
        let scope = Scope::new(ScopeParams::default()).unwrap();
        assert!(scope.is_standalone());
        assert_eq!(scope.cluster_name(), "");
        assert_eq!(scope.namespace(), "");
        assert_eq!(scope.location(), "");
        assert_eq!(scope.cluster_config, AzureClusterProviderSpec::default());
    }

    #[test]
    fn cluster_provider_spec_is_decoded() {
        let cluster = cluster_with_spec(
            "location: eastus2\nresourceGroup: prod-rg\nnetworkSpec:\n  vnet:\n    name: prod-vnet\n",
        );
        let scope = Scope::new(ScopeParams {
            cluster: Some(cluster),
        })
        .unwrap();

        assert!(!scope.is_standalone());
        assert_eq!(scope.cluster_name(), "prod");
        assert_eq!(scope.namespace(), "clusters");
        assert_eq!(scope.location(), "eastus2");
        assert_eq!(scope.resource_group(), "prod-rg");
        assert_eq!(scope.vnet().name, "prod-vnet");
    }

    #[test]
    fn cluster_provider_status_is_decoded() {
        let mut cluster = cluster_with_spec("location: eastus\n");
        let status = AzureClusterProviderStatus {
            network: Some(NetworkStatus {
                api_server_ip: Some("20.1.2.3".to_string()),
                api_server_lb_name: Some("prod-api".to_string()),
            }),
        };
        cluster.status = Some(ClusterStatus {
            provider_status: Some(encode(&status).unwrap()),
        });

        let scope = Scope::new(ScopeParams {
            cluster: Some(cluster),
        })
        .unwrap();
        assert_eq!(scope.cluster_status, status);
    }

    #[test]
    fn malformed_cluster_spec_fails() {
        let cluster = cluster_with_spec("location:\n  - not\n  - a string\n");
        let err = Scope::new(ScopeParams {
            cluster: Some(cluster),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Codec { .. }));
    }

    #[test]
    fn debug_redacts_client_secret() {
        let mut scope = Scope::new(ScopeParams::default()).unwrap();
        scope.client_secret = "hunter2".to_string();
        let out = format!("{:?}", scope);
        assert!(!out.contains("hunter2"));
        assert!(out.contains("<redacted>"));
    }
}
