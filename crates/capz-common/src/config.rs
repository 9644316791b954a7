//! Client configuration
//!
//! Store calls must never block indefinitely, so every client the actuator
//! builds carries connect and read timeouts. Values come from the
//! environment of the embedding controller.

use std::path::PathBuf;
use std::time::Duration;

use crate::Error;

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding an explicit kubeconfig path
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";
/// Environment variable overriding the connect timeout, in seconds
pub const CONNECT_TIMEOUT_ENV: &str = "CAPZ_CONNECT_TIMEOUT_SECS";
/// Environment variable overriding the read timeout, in seconds
pub const READ_TIMEOUT_ENV: &str = "CAPZ_READ_TIMEOUT_SECS";

/// Settings for building a store client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Kubeconfig to load; `None` infers in-cluster or default config
    pub kubeconfig: Option<PathBuf>,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Per-request read timeout
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(KUBECONFIG_ENV).filter(|p| !p.is_empty()) {
            config.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = parse_secs(CONNECT_TIMEOUT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(READ_TIMEOUT_ENV) {
            config.read_timeout = parse_secs(READ_TIMEOUT_ENV, &raw)?;
        }
        Ok(config)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, Error> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::config(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, raw
        ))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.read_timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (KUBECONFIG_ENV, "/etc/capz/kubeconfig"),
            (CONNECT_TIMEOUT_ENV, "2"),
            (READ_TIMEOUT_ENV, " 90 "),
        ]))
        .unwrap();
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/etc/capz/kubeconfig")));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.read_timeout, Duration::from_secs(90));
    }

    #[test]
    fn empty_kubeconfig_is_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[(KUBECONFIG_ENV, "")])).unwrap();
        assert!(config.kubeconfig.is_none());
    }

    #[test]
    fn rejects_bad_timeouts() {
        assert!(ClientConfig::from_lookup(lookup(&[(READ_TIMEOUT_ENV, "soon")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(CONNECT_TIMEOUT_ENV, "0")])).is_err());
    }
}
