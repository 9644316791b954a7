//! Error types for the Azure machine actuator
//!
//! Errors are structured with fields to aid debugging in production.
//! Each variant names the resource it concerns so a failed reconciliation
//! can be traced back to the machine, secret, or blob that caused it.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for scope construction and persistence
#[derive(Debug, Error)]
pub enum Error {
    /// Opaque provider blob could not be decoded or encoded
    #[error("codec error [{kind}]: {message}")]
    Codec {
        /// The provider type being decoded (e.g. "AzureMachineProviderSpec")
        kind: String,
        /// Description of what failed
        message: String,
    },

    /// Credentials secret is missing or could not be read
    #[error("secret lookup failed for {namespace}/{name}: {message}")]
    SecretLookup {
        /// Namespace of the referenced secret
        namespace: String,
        /// Name of the referenced secret
        name: String,
        /// Description of what failed
        message: String,
    },

    /// Credentials secret exists but lacks required keys
    #[error("credentials secret {namespace}/{name} is missing keys: {}", .missing.join(", "))]
    IncompleteCredentials {
        /// Namespace of the referenced secret
        namespace: String,
        /// Name of the referenced secret
        name: String,
        /// Wire names of every missing or empty key
        missing: Vec<String>,
    },

    /// Write rejected because the resource version is stale
    #[error("conflict updating {kind} {name}: {message}")]
    Conflict {
        /// Resource kind being written
        kind: String,
        /// Resource name (namespace/name)
        name: String,
        /// Message returned by the store
        message: String,
    },

    /// Invalid actuator configuration
    #[error("configuration error: {message}")]
    Config {
        /// Description of what is invalid
        message: String,
    },

    /// Generic store or transport failure
    #[error("store error [{context}]: {message}")]
    Store {
        /// Operation that failed (e.g. "update_machine", "get_secret")
        context: String,
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a codec error for the given provider type
    pub fn codec(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Codec {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Create a secret lookup error
    pub fn secret_lookup(
        namespace: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::SecretLookup {
            namespace: namespace.into(),
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create an incomplete credentials error listing the missing keys
    pub fn incomplete_credentials(
        namespace: impl Into<String>,
        name: impl Into<String>,
        missing: Vec<String>,
    ) -> Self {
        Self::IncompleteCredentials {
            namespace: namespace.into(),
            name: name.into(),
            missing,
        }
    }

    /// Create a conflict error for a stale write
    pub fn conflict(
        kind: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind: kind.into(),
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a store error with the given message
    ///
    /// For simple store errors without operation context.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            context: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a store error with operation context
    pub fn store_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Store {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Map a kube-rs error into the taxonomy
    ///
    /// HTTP 409 becomes [`Error::Conflict`]; everything else is a store error.
    pub fn from_kube(
        context: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        err: kube::Error,
    ) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 409 => Self::conflict(kind, name, ae.message),
            other => Self::store_with_context(context, other.to_string()),
        }
    }

    /// Check if this error is retryable
    ///
    /// Codec and configuration errors need a manual fix. Everything else
    /// may succeed when the reconciler replays the pass.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Codec { .. } => false,
            Error::Config { .. } => false,
            Error::SecretLookup { .. } => true,
            Error::IncompleteCredentials { .. } => true,
            Error::Conflict { .. } => true,
            Error::Store { .. } => true,
        }
    }

    /// Check if this error is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Get the context if this error has one
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Store { context, .. } => Some(context),
            _ => None,
        }
    }
}
