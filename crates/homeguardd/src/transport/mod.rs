//! TCP transport for client sessions.
//!
//! The [`Server`] binds a listening socket and accepts connections on a
//! background thread. Every connection becomes a [`Session`] with its own read
//! loop thread; live sessions are tracked in a [`SessionRegistry`]. Protocol
//! and lifecycle decisions are delegated to a [`SessionHooks`] implementation.

mod errors;
mod hooks;
mod registry;
mod server;
mod session;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::hooks::SessionHooks;
pub use self::registry::SessionRegistry;
pub use self::server::Server;
pub use self::session::{Session, SessionId};
#[cfg(test)]
pub(crate) use self::test_utils::{EchoHooks, wait_until};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
