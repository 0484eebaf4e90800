//! The HomeGuard command server.
//!
//! Clients connect over TCP and exchange newline-delimited JSON frames. Each
//! frame is either an array command such as `["TOGGLE_LIGHT", 1, true]` or a
//! legacy text command such as `"light1 ON"`, and each one receives exactly
//! one reply on the same connection.
//!
//! The crate is layered the way the server runs:
//!
//! - [`transport`] owns the listening socket, the per-connection sessions and
//!   the registry of live sessions.
//! - [`dispatch`] decodes frames and routes them to the device facade or the
//!   authentication gateway.
//! - [`home`] holds the simulated devices, [`accounts`] the registered users,
//!   and [`activity`] the append-only activity history.
//! - [`process`] wires everything together from configuration and blocks
//!   until a termination signal arrives.

pub mod accounts;
pub mod activity;
pub mod dispatch;
pub mod home;
pub mod process;
mod telemetry;
pub mod transport;

pub use accounts::{Account, AccountError, AccountStore, Role, UserStore};
pub use activity::{ActionType, ActivityEntry, ActivityLog, ActivitySink};
pub use dispatch::{CommandRouter, HomeServer};
pub use home::{DeviceFacade, Home};
pub use process::{LaunchError, Services, run_server, run_server_with};
pub use telemetry::TelemetryError;
pub use transport::{ListenerError, Server, SessionHooks};

#[cfg(test)]
mod tests;
