//! Scope construction and persistence for the Azure machine actuator
//!
//! This crate provides:
//! - Store client traits and implementations (kube-rs backed and in-memory)
//! - Codec between opaque provider blobs and typed Azure provider data
//! - Credential resolution from the referenced Secret
//! - `Scope` and `MachineScope`, including the two-step persist

#![deny(missing_docs)]

pub mod client;
pub mod codec;
pub mod credentials;
pub mod machine_scope;
pub mod memory;
pub mod scope;

// Re-export client types
pub use client::{create_client, KubeMachineClient, KubeSecretClient, MachineClient, SecretClient};

#[cfg(test)]
pub use client::{MockMachineClient, MockSecretClient};

pub use credentials::{update_scope, AzureCredentials};
pub use machine_scope::{MachineScope, MachineScopeParams};
pub use memory::InMemoryStore;
pub use scope::{Scope, ScopeParams};
