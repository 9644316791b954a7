//! In-memory store implementing [`MachineClient`] and [`SecretClient`]
//!
//! Mirrors the API server behavior the scope layer relies on: every write
//! bumps `metadata.resourceVersion`, a write carrying a different version is
//! rejected as a conflict, and the body and status of a Machine are written
//! through separate calls that each ignore the other half.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tokio::sync::RwLock;

use capz_common::crd::Machine;
use capz_common::Error;

use crate::client::{machine_key, MachineClient, SecretClient};

type Key = (String, String);

#[derive(Debug, Default)]
struct State {
    machines: HashMap<Key, Machine>,
    secrets: HashMap<Key, Secret>,
    last_version: u64,
}

impl State {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }
}

/// Shared in-memory store; clones share the same state
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

fn key(namespace: Option<String>, name: String) -> Key {
    (namespace.unwrap_or_default(), name)
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a Machine, assigning a fresh resource version
    ///
    /// Returns the stored copy.
    pub async fn insert_machine(&self, mut machine: Machine) -> Machine {
        let mut state = self.state.write().await;
        machine.metadata.resource_version = Some(state.next_version());
        state
            .machines
            .insert(key(machine.namespace(), machine.name_any()), machine.clone());
        machine
    }

    /// Insert or overwrite a Secret
    pub async fn insert_secret(&self, mut secret: Secret) {
        let mut state = self.state.write().await;
        secret.metadata.resource_version = Some(state.next_version());
        state
            .secrets
            .insert(key(secret.namespace(), secret.name_any()), secret);
    }

    /// Remove a Secret, returning whether it existed
    pub async fn remove_secret(&self, name: &str, namespace: &str) -> bool {
        let mut state = self.state.write().await;
        state
            .secrets
            .remove(&(namespace.to_string(), name.to_string()))
            .is_some()
    }

    /// Check the caller's version against the stored object and return the
    /// stored object for mutation
    fn stored_for_write<'a>(
        machines: &'a mut HashMap<Key, Machine>,
        incoming: &Machine,
        context: &str,
    ) -> Result<&'a mut Machine, Error> {
        let stored = machines
            .get_mut(&key(incoming.namespace(), incoming.name_any()))
            .ok_or_else(|| {
                Error::store_with_context(
                    context,
                    format!("machine {} not found", machine_key(incoming)),
                )
            })?;

        if let Some(version) = incoming.resource_version() {
            if stored.resource_version().as_deref() != Some(version.as_str()) {
                return Err(Error::conflict(
                    "Machine",
                    machine_key(incoming),
                    format!(
                        "the object has been modified; stored version {:?}, write carried {}",
                        stored.resource_version(),
                        version
                    ),
                ));
            }
        }
        Ok(stored)
    }
}

#[async_trait]
impl MachineClient for InMemoryStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Machine, Error> {
        let state = self.state.read().await;
        state
            .machines
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::store_with_context(
                    "get_machine",
                    format!("machine {}/{} not found", namespace, name),
                )
            })
    }

    async fn update(&self, machine: &Machine) -> Result<Machine, Error> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let version = state.next_version();
        let stored = Self::stored_for_write(&mut state.machines, machine, "update_machine")?;

        let status = stored.status.take();
        *stored = machine.clone();
        stored.status = status;
        stored.metadata.resource_version = Some(version);
        Ok(stored.clone())
    }

    async fn update_status(&self, machine: &Machine) -> Result<Machine, Error> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let version = state.next_version();
        let stored =
            Self::stored_for_write(&mut state.machines, machine, "update_machine_status")?;

        stored.status = machine.status.clone();
        stored.metadata.resource_version = Some(version);
        Ok(stored.clone())
    }
}

#[async_trait]
impl SecretClient for InMemoryStore {
    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>, Error> {
        let state = self.state.read().await;
        Ok(state
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}
