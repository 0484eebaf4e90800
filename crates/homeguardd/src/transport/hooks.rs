//! Callbacks through which the transport reports to the application.

use std::io;
use std::net::SocketAddr;

use homeguard_protocol::FrameError;

use super::Session;

/// Application behaviour plugged into the transport.
///
/// Hooks run on the accept thread or on the session's own read thread and
/// must not call back into [`SessionRegistry`](super::SessionRegistry)
/// broadcast from [`SessionHooks::client_error`], which may run while the
/// registry lock is held.
pub trait SessionHooks: Send + Sync + 'static {
    /// A session's read loop started.
    fn client_connected(&self, _session: &Session) {}

    /// One frame arrived. Runs before the next frame is read, so replies
    /// preserve request order.
    fn handle_message(&self, session: &Session, frame: &[u8]);

    /// Reading from or writing to the session failed.
    fn client_error(&self, _session: &Session, _error: &FrameError) {}

    /// The session finished and has left the registry. Fires exactly once.
    fn client_disconnected(&self, _session: &Session) {}

    /// Accepting a connection failed while listening.
    fn listening_error(&self, _error: &io::Error) {}

    /// The server is accepting connections on `address`.
    fn server_started(&self, _address: SocketAddr) {}

    /// The server stopped accepting connections.
    fn server_stopped(&self) {}
}
