//! Store clients for Machines and Secrets
//!
//! Provides trait-based abstractions over the control-plane store so tests
//! can mock or fake Kubernetes interactions while production code uses real
//! API calls. The scope layer only ever needs these operations.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, ResourceExt};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use capz_common::config::ClientConfig;
use capz_common::crd::Machine;
use capz_common::Error;

/// Trait abstracting Machine reads and writes
///
/// Writes carry the object's `metadata.resourceVersion`; a stale version
/// fails with [`Error::Conflict`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MachineClient: Send + Sync {
    /// Get a Machine by namespace and name
    async fn get(&self, namespace: &str, name: &str) -> Result<Machine, Error>;

    /// Replace the Machine body (metadata and spec); status is ignored
    ///
    /// Returns the stored object with its new resource version.
    async fn update(&self, machine: &Machine) -> Result<Machine, Error>;

    /// Replace the Machine status subresource; metadata and spec are ignored
    ///
    /// Returns the stored object with its new resource version.
    async fn update_status(&self, machine: &Machine) -> Result<Machine, Error>;
}

/// Trait abstracting Secret reads
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Get a Secret by name and namespace
    ///
    /// Returns `None` when the secret does not exist.
    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>, Error>;
}

/// Namespace and name of a machine, as used in error messages
pub(crate) fn machine_key(machine: &Machine) -> String {
    format!(
        "{}/{}",
        machine.namespace().unwrap_or_default(),
        machine.name_any()
    )
}

/// Real Machine client backed by the Kubernetes API
pub struct KubeMachineClient {
    client: Client,
}

impl KubeMachineClient {
    /// Create a new KubeMachineClient wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, machine: &Machine) -> Api<Machine> {
        match machine.namespace() {
            Some(ns) => Api::namespaced(self.client.clone(), &ns),
            None => Api::default_namespaced(self.client.clone()),
        }
    }
}

#[async_trait]
impl MachineClient for KubeMachineClient {
    async fn get(&self, namespace: &str, name: &str) -> Result<Machine, Error> {
        let api: Api<Machine> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(|e| {
            Error::from_kube("get_machine", "Machine", format!("{}/{}", namespace, name), e)
        })
    }

    async fn update(&self, machine: &Machine) -> Result<Machine, Error> {
        let name = machine.name_any();
        let stored = self
            .api(machine)
            .replace(&name, &PostParams::default(), machine)
            .await
            .map_err(|e| Error::from_kube("update_machine", "Machine", machine_key(machine), e))?;

        debug!(
            machine = %name,
            resource_version = ?stored.resource_version(),
            "Updated machine"
        );
        Ok(stored)
    }

    async fn update_status(&self, machine: &Machine) -> Result<Machine, Error> {
        let name = machine.name_any();
        let body = serde_json::to_vec(machine).map_err(|e| Error::codec("Machine", e.to_string()))?;
        let stored = self
            .api(machine)
            .replace_status(&name, &PostParams::default(), body)
            .await
            .map_err(|e| {
                Error::from_kube("update_machine_status", "Machine", machine_key(machine), e)
            })?;

        debug!(
            machine = %name,
            resource_version = ?stored.resource_version(),
            "Updated machine status"
        );
        Ok(stored)
    }
}

/// Real Secret client backed by the Kubernetes API
pub struct KubeSecretClient {
    client: Client,
}

impl KubeSecretClient {
    /// Create a new KubeSecretClient wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretClient for KubeSecretClient {
    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>, Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(Error::secret_lookup(namespace, name, e.to_string())),
        }
    }
}

/// Create a kube client honoring the configured kubeconfig and timeouts
pub async fn create_client(config: &ClientConfig) -> Result<Client, Error> {
    let mut kube_config = match &config.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .map_err(|e| Error::config(format!("failed to read kubeconfig: {}", e)))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| Error::config(format!("failed to load kubeconfig: {}", e)))?
        }
        None => Config::infer()
            .await
            .map_err(|e| Error::config(format!("failed to infer config: {}", e)))?,
    };
    kube_config.connect_timeout = Some(config.connect_timeout);
    kube_config.read_timeout = Some(config.read_timeout);

    Client::try_from(kube_config).map_err(|e| {
        Error::store_with_context("create_client", format!("failed to create client: {}", e))
    })
}
