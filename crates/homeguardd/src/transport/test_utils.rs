//! Hooks and helpers shared by transport tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use homeguard_protocol::{FrameError, Reply};

use super::{Session, SessionHooks, SessionId};

/// Answers every frame with `"OK"` and counts lifecycle events.
#[derive(Debug, Default)]
pub(crate) struct EchoHooks {
    pub(crate) connected: AtomicUsize,
    pub(crate) frames: AtomicUsize,
    pub(crate) errors: AtomicUsize,
    pub(crate) started: AtomicUsize,
    pub(crate) stopped: AtomicUsize,
    pub(crate) disconnected: Mutex<Vec<SessionId>>,
}

impl EchoHooks {
    pub(crate) fn disconnected(&self) -> Vec<SessionId> {
        self.disconnected.lock().expect("disconnected lock").clone()
    }
}

impl SessionHooks for EchoHooks {
    fn client_connected(&self, _session: &Session) {
        self.connected.fetch_add(1, Ordering::SeqCst);
    }

    fn handle_message(&self, session: &Session, _frame: &[u8]) {
        self.frames.fetch_add(1, Ordering::SeqCst);
        session.send(&Reply::OK);
    }

    fn client_error(&self, _session: &Session, _error: &FrameError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn client_disconnected(&self, session: &Session) {
        self.disconnected
            .lock()
            .expect("disconnected lock")
            .push(session.id());
    }

    fn server_started(&self, _address: std::net::SocketAddr) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn server_stopped(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
