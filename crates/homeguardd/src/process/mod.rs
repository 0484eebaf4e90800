//! Process lifecycle: startup wiring and signal-driven shutdown.

mod errors;
mod launch;
mod shutdown;

pub use self::errors::LaunchError;
pub use self::launch::{Services, run_server, run_server_with};
pub use self::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
