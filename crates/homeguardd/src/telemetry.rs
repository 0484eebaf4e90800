//! Structured logging for the server process.

use std::io::{self, IsTerminal};

use homeguard_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

static SUBSCRIBER_INSTALLED: OnceCell<()> = OnceCell::new();

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another subscriber was already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return `Ok(())` without touching the global state, so tests
/// and the binary can both call this freely.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid or a foreign
/// subscriber is already installed.
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    SUBSCRIBER_INSTALLED
        .get_or_try_init(|| install(config))
        .map(|_| ())
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        message: error.to_string(),
    })?;

    // Session threads are named after their session id.
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn rejects_invalid_filters() {
        let config = Config {
            log_filter: "homeguardd=loudest".to_owned(),
            ..Config::default()
        };
        let error = install(&config).expect_err("filter should be rejected");
        assert!(matches!(error, TelemetryError::Filter { .. }));
    }

    #[rstest]
    fn repeated_initialisation_is_harmless() {
        let config = Config {
            log_format: LogFormat::Compact,
            ..Config::default()
        };
        initialise(&config).expect("first initialisation");
        initialise(&config).expect("second initialisation");
    }
}
