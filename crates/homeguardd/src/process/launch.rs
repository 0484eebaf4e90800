//! Supervises server startup and shutdown.

use std::sync::Arc;

use homeguard_config::{Config, ConfigLoader, SystemConfigLoader};
use tracing::info;

use crate::accounts::{AccountStore, seed_demo_accounts};
use crate::activity::{ActivityLog, ActivitySink};
use crate::dispatch::HomeServer;
use crate::home::{Home, seed_demo_home};
use crate::telemetry;
use crate::transport::Server;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Shared state behind a running server.
#[derive(Debug, Clone)]
pub struct Services {
    /// Registered devices.
    pub home: Arc<Home>,
    /// Registered accounts.
    pub accounts: Arc<AccountStore>,
    /// Activity history.
    pub activity: Arc<ActivityLog>,
}

impl Services {
    /// Builds empty collaborators, seeded with the demo installation when
    /// `config.seed_demo_data` is set.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let activity = Arc::new(ActivityLog::new());
        let home = Arc::new(Home::new(Arc::clone(&activity) as Arc<dyn ActivitySink>));
        let accounts = Arc::new(AccountStore::new());
        if config.seed_demo_data {
            let devices = seed_demo_home(&home);
            let users = seed_demo_accounts(accounts.as_ref());
            info!(target: PROCESS_TARGET, devices, users, "seeded demo installation");
        }
        Self {
            home,
            accounts,
            activity,
        }
    }

    /// Hooks that serve clients from these collaborators.
    #[must_use]
    pub fn hooks(&self) -> HomeServer {
        HomeServer::new(
            Arc::clone(&self.home) as _,
            Arc::clone(&self.accounts) as _,
            Arc::clone(&self.activity) as _,
        )
    }
}

/// Runs the server with the process configuration until a termination
/// signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] if configuration, telemetry, binding or signal
/// handling fails.
pub fn run_server() -> Result<(), LaunchError> {
    run_server_with(&SystemConfigLoader, &SystemShutdownSignal)
}

/// Runs the server with injected configuration and shutdown collaborators.
///
/// # Errors
///
/// See [`run_server`].
pub fn run_server_with(
    loader: &dyn ConfigLoader,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let config = loader.load()?;
    telemetry::initialise(&config)?;
    info!(
        target: PROCESS_TARGET,
        address = %config.listen_address(),
        log_filter = config.log_filter(),
        log_format = %config.log_format(),
        "starting home guardian server"
    );

    let services = Services::from_config(&config);
    let server = Server::new(config.listen_address(), Arc::new(services.hooks()));
    let address = server.start()?;
    info!(target: PROCESS_TARGET, %address, "server ready");

    let waited = shutdown.wait();
    let closed = server.close();
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    waited?;
    closed?;
    Ok(())
}
