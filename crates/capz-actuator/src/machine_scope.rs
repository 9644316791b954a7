//! Machine scope: the unit of work for one reconciliation pass
//!
//! [`MachineScope::new`] decodes the machine's provider spec and status,
//! builds the cluster [`Scope`] and resolves credentials into it.
//! Provider logic then mutates the scope in place and [`MachineScope::persist`]
//! writes the result back in two steps: first the body (metadata and spec),
//! then the status subresource on top of the object the first write returned.
//!
//! The two writes are not transactional. When the body write lands and the
//! status write fails the error is returned as-is and the body stays written;
//! the next pass rebuilds everything from the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::{NodeAddress, SecretReference};
use kube::ResourceExt;
use tracing::{debug, info, instrument};

use capz_common::crd::{
    AzureMachineProviderSpec, AzureMachineProviderStatus, Cluster, Machine, MachineStatus,
};
use capz_common::{Error, MACHINE_ROLE_LABEL};

use crate::client::{MachineClient, SecretClient};
use crate::codec;
use crate::credentials;
use crate::scope::{Scope, ScopeParams};

/// Inputs for [`MachineScope::new`]
pub struct MachineScopeParams {
    /// Client used to persist the machine
    pub machine_client: Arc<dyn MachineClient>,
    /// Client used to read the credentials secret
    pub core_client: Option<Arc<dyn SecretClient>>,
    /// Machine being reconciled
    pub machine: Machine,
    /// Cluster the machine belongs to; `None` for a standalone machine
    pub cluster: Option<Cluster>,
}

/// Machine, decoded provider data and cluster scope for one pass
pub struct MachineScope {
    /// Cluster-level scope with resolved credentials
    pub scope: Scope,
    /// Machine resource; annotations and status are written back by `persist`
    pub machine: Machine,
    /// Decoded provider spec; treated as read-only input
    pub machine_config: AzureMachineProviderSpec,
    /// Decoded provider status; encoded back by `persist`
    pub machine_status: AzureMachineProviderStatus,
    machine_client: Arc<dyn MachineClient>,
}

impl MachineScope {
    /// Build a machine scope
    ///
    /// Fails without side effects if the provider spec or status cannot be
    /// decoded or the credentials secret cannot be resolved. A machine with
    /// no credentials secret gets a scope without credentials.
    #[instrument(
        skip_all,
        fields(
            machine = %params.machine.name_any(),
            namespace = %params.machine.namespace().unwrap_or_default()
        )
    )]
    pub async fn new(params: MachineScopeParams) -> Result<Self, Error> {
        let MachineScopeParams {
            machine_client,
            core_client,
            mut machine,
            cluster,
        } = params;

        let machine_config = codec::machine_spec(machine.spec.provider_spec.value.as_ref())?;
        let machine_status = codec::machine_status(
            machine
                .status
                .as_ref()
                .and_then(|s| s.provider_status.as_ref()),
        )?;

        let mut scope = Scope::new(ScopeParams { cluster })?;
        if scope.is_standalone() {
            scope.cluster_config.location = machine_config.location.clone();
            scope.cluster_config.resource_group = machine_config.resource_group.clone();
        }

        match &machine_config.credentials_secret {
            Some(secret_ref) => {
                let secret_ref = with_default_namespace(secret_ref, &machine);
                let Some(core_client) = core_client.as_deref() else {
                    return Err(Error::secret_lookup(
                        secret_ref.namespace.unwrap_or_default(),
                        secret_ref.name.unwrap_or_default(),
                        "no secret client configured",
                    ));
                };
                credentials::update_scope(core_client, &secret_ref, &mut scope).await?;
            }
            None => debug!("No credentials secret referenced, skipping credential resolution"),
        }

        machine.metadata.annotations.get_or_insert_with(BTreeMap::new);

        debug!(
            location = %scope.location(),
            resource_group = %scope.resource_group(),
            standalone = scope.is_standalone(),
            "Built machine scope"
        );

        Ok(Self {
            scope,
            machine,
            machine_config,
            machine_status,
            machine_client,
        })
    }

    /// Machine name
    pub fn name(&self) -> String {
        self.machine.name_any()
    }

    /// Machine namespace
    pub fn namespace(&self) -> String {
        self.machine.namespace().unwrap_or_default()
    }

    /// Machine role from the role label; empty when unlabelled
    pub fn role(&self) -> &str {
        self.machine
            .labels()
            .get(MACHINE_ROLE_LABEL)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Effective Azure region
    pub fn location(&self) -> &str {
        self.scope.location()
    }

    /// Mutable access to the machine's annotations
    pub fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.machine.annotations_mut()
    }

    /// Replace the node addresses reported in the machine status
    pub fn set_addresses(&mut self, addresses: Vec<NodeAddress>) {
        self.machine
            .status
            .get_or_insert_with(MachineStatus::default)
            .addresses = addresses;
    }

    /// Record the provider ID on the machine spec
    pub fn set_provider_id(&mut self, provider_id: impl Into<String>) {
        self.machine.spec.provider_id = Some(provider_id.into());
    }

    /// Write mutations back to the store
    ///
    /// Encodes the provider status, replaces the machine body, then replaces
    /// the status subresource using the version returned by the body write.
    /// A stale version fails with [`Error::Conflict`]; retrying is up to the
    /// caller.
    ///
    /// On success the scope adopts the stored metadata, so a later `persist`
    /// in the same pass carries the current version. If the status write
    /// fails after the body write landed, the scope keeps the version it was
    /// built with: a second `persist` on this scope then conflicts with its
    /// own body write, and the pass has to start over from a fresh read.
    #[instrument(skip_all, fields(machine = %self.machine.name_any()))]
    pub async fn persist(&mut self) -> Result<(), Error> {
        let provider_status = codec::encode(&self.machine_status)?;
        let mut status = self.machine.status.clone().unwrap_or_default();
        status.provider_status = Some(provider_status);

        let mut latest = self.machine_client.update(&self.machine).await?;
        debug!(
            resource_version = ?latest.resource_version(),
            "Machine body written"
        );

        latest.status = Some(status);
        let stored = self.machine_client.update_status(&latest).await?;

        self.machine.metadata = stored.metadata;
        self.machine.status = stored.status;

        info!(
            resource_version = ?self.machine.resource_version(),
            vm_id = ?self.machine_status.vm_id,
            "Persisted machine"
        );
        Ok(())
    }
}

/// Fill in the machine's namespace when the reference has none
fn with_default_namespace(secret_ref: &SecretReference, machine: &Machine) -> SecretReference {
    let mut secret_ref = secret_ref.clone();
    if secret_ref.namespace.as_deref().unwrap_or_default().is_empty() {
        secret_ref.namespace = machine.namespace();
    }
    secret_ref
}
