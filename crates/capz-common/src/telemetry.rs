//! Structured logging setup
//!
//! The actuator is embedded in a controller process; whoever owns `main`
//! calls [`init_logging`] once. Logs are JSON lines carrying the current span
//! so machine/namespace fields from `#[instrument]` show up on every event.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,capz=debug,kube=info,tower=warn,hyper=warn";

/// Errors that can occur during logging initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directives; `None` reads `RUST_LOG` and falls back to
    /// [`DEFAULT_LOG_FILTER`]
    pub filter: Option<String>,

    /// Emit JSON lines (true) or human-readable text (false)
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: None,
            json: true,
        }
    }
}

impl LogConfig {
    fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        match &self.filter {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|e| TelemetryError::Filter(e.to_string()))
            }
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
        }
    }
}

/// Install the global tracing subscriber
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: LogConfig) -> Result<(), TelemetryError> {
    let env_filter = config.env_filter()?;

    let (json_layer, text_layer) = if config.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        (Some(layer), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_target(true)))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::SubscriberInit(e.to_string())
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.filter.is_none());
        assert!(config.json);
    }

    #[test]
    fn test_explicit_filter_is_validated() {
        let config = LogConfig {
            filter: Some("capz=notalevel".to_string()),
            json: true,
        };
        assert!(matches!(
            config.env_filter(),
            Err(TelemetryError::Filter(_))
        ));

        let config = LogConfig {
            filter: Some("warn,capz_actuator=trace".to_string()),
            json: false,
        };
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_second_init_fails() {
        // Only this test installs a subscriber in this binary; whichever call
        // runs second must be rejected.
        let _ = init_logging(LogConfig::default());
        let err = init_logging(LogConfig {
            filter: Some("info".to_string()),
            json: false,
        })
        .unwrap_err();
        assert!(matches!(err, TelemetryError::SubscriberInit(_)));
    }
}
