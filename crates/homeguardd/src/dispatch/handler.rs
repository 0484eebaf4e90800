//! Session hooks that answer client frames through the [`CommandRouter`].

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use homeguard_protocol::FrameError;
use tracing::{info, warn};

use crate::accounts::UserStore;
use crate::activity::{ActionType, ActivityEntry, ActivitySink};
use crate::home::DeviceFacade;
use crate::transport::{Session, SessionHooks};

use super::auth::AuthGateway;
use super::router::{CommandRouter, DISPATCH_TARGET};

/// The home automation server's behaviour on top of the transport.
///
/// Every frame gets exactly one reply on the session it arrived on.
/// Lifecycle events are mirrored into the activity log.
#[derive(Clone)]
pub struct HomeServer {
    router: CommandRouter,
    activity: Arc<dyn ActivitySink>,
}

impl std::fmt::Debug for HomeServer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HomeServer")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl HomeServer {
    /// Wires the dispatcher to its collaborators.
    pub fn new(
        devices: Arc<dyn DeviceFacade>,
        users: Arc<dyn UserStore>,
        activity: Arc<dyn ActivitySink>,
    ) -> Self {
        let auth = AuthGateway::new(users, Arc::clone(&activity));
        Self {
            router: CommandRouter::new(devices, auth, Arc::clone(&activity)),
            activity,
        }
    }

    /// The router used for every frame.
    #[must_use]
    pub const fn router(&self) -> &CommandRouter {
        &self.router
    }
}

impl SessionHooks for HomeServer {
    fn client_connected(&self, session: &Session) {
        info!(
            target: DISPATCH_TARGET,
            session = %session.id(),
            peer = %session.peer(),
            "client connected"
        );
        self.activity.record(ActivityEntry::new(
            ActionType::Session,
            format!("Client connected from {}", session.peer()),
        ));
    }

    fn handle_message(&self, session: &Session, frame: &[u8]) {
        let reply = self.router.dispatch(frame);
        session.send(&reply);
    }

    fn client_error(&self, session: &Session, error: &FrameError) {
        warn!(
            target: DISPATCH_TARGET,
            session = %session.id(),
            peer = %session.peer(),
            %error,
            "client connection error"
        );
    }

    fn client_disconnected(&self, session: &Session) {
        info!(
            target: DISPATCH_TARGET,
            session = %session.id(),
            peer = %session.peer(),
            "client disconnected"
        );
        self.activity.record(ActivityEntry::new(
            ActionType::Session,
            format!("Client disconnected from {}", session.peer()),
        ));
    }

    fn listening_error(&self, error: &io::Error) {
        warn!(target: DISPATCH_TARGET, %error, "failed to accept connection");
    }

    fn server_started(&self, address: SocketAddr) {
        self.activity.record(ActivityEntry::new(
            ActionType::System,
            format!("Server started on port {}", address.port()),
        ));
    }

    fn server_stopped(&self) {
        self.activity
            .record(ActivityEntry::new(ActionType::System, "Server stopped"));
    }
}
