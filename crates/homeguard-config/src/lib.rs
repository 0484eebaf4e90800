//! Shared configuration for the HomeGuard server.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file, then `HOMEGUARD_*` environment variables, then command
//! line flags. The daemon reads everything it needs from [`Config`].

mod defaults;
mod listen;
mod logging;

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT, default_host, default_log_filter,
    default_log_format, default_port,
};
pub use listen::{ListenAddress, ListenAddressParseError};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "HOMEGUARD")]
#[serde(default)]
pub struct Config {
    /// Interface the command listener binds to.
    pub host: String,
    /// TCP port the command listener binds to.
    pub port: u16,
    /// `tracing` filter expression.
    pub log_filter: String,
    /// Output format for structured logs.
    pub log_format: LogFormat,
    /// Registers the demo devices and accounts at startup.
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            seed_demo_data: true,
        }
    }
}

impl Config {
    /// Address the listener should bind to.
    #[must_use]
    pub fn listen_address(&self) -> ListenAddress {
        ListenAddress::new(self.host.clone(), self.port)
    }

    /// Filter expression handed to the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Selected log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Abstraction over configuration loading so callers can inject fixtures.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a layer cannot be read or merged.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`], reading the process arguments
/// and environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a pre-built configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}
