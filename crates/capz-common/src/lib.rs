//! Common types for the Azure machine actuator: resources, errors, and utilities

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod telemetry;
pub mod yaml;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Label carrying a machine's role ("master", "worker", ...)
pub const MACHINE_ROLE_LABEL: &str = "machine.openshift.io/cluster-api-machine-role";

