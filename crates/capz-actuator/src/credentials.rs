//! Azure credential resolution
//!
//! The service principal used to talk to Azure lives in a Secret referenced
//! by the machine's provider spec. Resolution reads all seven required keys,
//! and only once every key is present does it touch the [`Scope`]. A failed
//! resolution therefore leaves the scope exactly as it was.

use std::fmt;

use k8s_openapi::api::core::v1::{Secret, SecretReference};
use kube::ResourceExt;
use tracing::debug;

use capz_common::Error;

use crate::client::SecretClient;
use crate::scope::Scope;

/// Secret key holding the subscription ID
pub const SUBSCRIPTION_ID_KEY: &str = "azure_subscription_id";
/// Secret key holding the service principal client ID
pub const CLIENT_ID_KEY: &str = "azure_client_id";
/// Secret key holding the service principal secret
pub const CLIENT_SECRET_KEY: &str = "azure_client_secret";
/// Secret key holding the tenant ID
pub const TENANT_ID_KEY: &str = "azure_tenant_id";
/// Secret key holding the default resource group
pub const RESOURCE_GROUP_KEY: &str = "azure_resourcegroup";
/// Secret key holding the default region
pub const REGION_KEY: &str = "azure_region";
/// Secret key holding the cluster name prefix
pub const RESOURCE_PREFIX_KEY: &str = "azure_resource_prefix";

/// Every key a credentials secret must carry, in resolution order
pub const REQUIRED_KEYS: [&str; 7] = [
    SUBSCRIPTION_ID_KEY,
    CLIENT_ID_KEY,
    CLIENT_SECRET_KEY,
    TENANT_ID_KEY,
    RESOURCE_GROUP_KEY,
    REGION_KEY,
    RESOURCE_PREFIX_KEY,
];

/// Parsed contents of a credentials secret
#[derive(Clone, PartialEq, Eq)]
pub struct AzureCredentials {
    /// Azure subscription ID
    pub subscription_id: String,
    /// Service principal client ID
    pub client_id: String,
    /// Service principal secret
    pub client_secret: String,
    /// Azure AD tenant ID
    pub tenant_id: String,
    /// Default resource group
    pub resource_group: String,
    /// Default region
    pub region: String,
    /// Cluster name prefix
    pub resource_prefix: String,
}

impl AzureCredentials {
    /// Extract credentials from a secret
    ///
    /// Fails with [`Error::IncompleteCredentials`] naming every key that is
    /// missing, empty, or not valid UTF-8.
    pub fn from_secret(secret: &Secret) -> Result<Self, Error> {
        let data = secret.data.as_ref();
        let mut values: Vec<Option<String>> = REQUIRED_KEYS
            .iter()
            .map(|key| {
                data.and_then(|d| d.get(*key))
                    .and_then(|bytes| String::from_utf8(bytes.0.clone()).ok())
                    .filter(|value| !value.is_empty())
            })
            .collect();

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .zip(&values)
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::incomplete_credentials(
                secret.namespace().unwrap_or_default(),
                secret.name_any(),
                missing,
            ));
        }

        let mut take = |i: usize| values[i].take().unwrap_or_default();
        Ok(Self {
            subscription_id: take(0),
            client_id: take(1),
            client_secret: take(2),
            tenant_id: take(3),
            resource_group: take(4),
            region: take(5),
            resource_prefix: take(6),
        })
    }

    /// Merge the credentials into a scope
    ///
    /// Identifiers are always overwritten. Location, resource group and
    /// cluster name are only filled in when the scope has none.
    pub fn apply(&self, scope: &mut Scope) {
        scope.subscription_id = self.subscription_id.clone();
        scope.client_id = self.client_id.clone();
        scope.client_secret = self.client_secret.clone();
        scope.tenant_id = self.tenant_id.clone();

        if scope.cluster_config.location.is_empty() {
            scope.cluster_config.location = self.region.clone();
        }
        if scope.cluster_config.resource_group.is_empty() {
            scope.cluster_config.resource_group = self.resource_group.clone();
        }
        if scope.cluster_name().is_empty() {
            scope.set_cluster_name(self.resource_prefix.clone());
        }
    }
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("subscription_id", &self.subscription_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("resource_group", &self.resource_group)
            .field("region", &self.region)
            .field("resource_prefix", &self.resource_prefix)
            .finish()
    }
}

/// Resolve the referenced secret into `scope`
///
/// The reference must carry both a name and a namespace. Any failure leaves
/// `scope` untouched; nothing is cached between calls.
pub async fn update_scope(
    client: &dyn SecretClient,
    secret_ref: &SecretReference,
    scope: &mut Scope,
) -> Result<(), Error> {
    let namespace = secret_ref.namespace.as_deref().unwrap_or_default();
    let name = secret_ref.name.as_deref().unwrap_or_default();
    if name.is_empty() {
        return Err(Error::secret_lookup(
            namespace,
            name,
            "secret reference has no name",
        ));
    }
    if namespace.is_empty() {
        return Err(Error::secret_lookup(
            namespace,
            name,
            "secret reference has no namespace",
        ));
    }

    let secret = client
        .get_secret(name, namespace)
        .await
        .map_err(|e| match e {
            Error::SecretLookup { .. } => e,
            other => Error::secret_lookup(namespace, name, other.to_string()),
        })?
        .ok_or_else(|| Error::secret_lookup(namespace, name, "secret not found"))?;

    let credentials = AzureCredentials::from_secret(&secret)?;
    credentials.apply(scope);

    debug!(
        secret = %format!("{}/{}", namespace, name),
        location = %scope.location(),
        resource_group = %scope.resource_group(),
        "Resolved Azure credentials"
    );
    Ok(())
}
