//! One accepted client connection.

use std::fmt;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use homeguard_protocol::{FrameReader, FrameWriter};
use serde::Serialize;
use tracing::debug;

use super::{SessionHooks, SessionRegistry, TRANSPORT_TARGET};

/// Server-assigned session identifier, unique for the server's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// A live client connection.
///
/// The read side is owned by the session's read loop; the write side is
/// shared and serialized by a lock so replies and broadcasts never interleave
/// within a frame.
pub struct Session {
    id: SessionId,
    peer: SocketAddr,
    stream: TcpStream,
    writer: Mutex<FrameWriter<TcpStream>>,
    alive: AtomicBool,
    hooks: Arc<dyn SessionHooks>,
    registry: Weak<SessionRegistry>,
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wraps an accepted stream, returning the session and the reader its
    /// read loop consumes.
    pub(crate) fn open(
        id: SessionId,
        stream: TcpStream,
        hooks: Arc<dyn SessionHooks>,
        registry: Weak<SessionRegistry>,
    ) -> io::Result<(Arc<Self>, FrameReader<TcpStream>)> {
        let peer = stream.peer_addr()?;
        let reader = FrameReader::new(stream.try_clone()?);
        let writer = FrameWriter::new(stream.try_clone()?);
        let session = Arc::new(Self {
            id,
            peer,
            stream,
            writer: Mutex::new(writer),
            alive: AtomicBool::new(true),
            hooks,
            registry,
        });
        Ok((session, reader))
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Remote address of the client.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Returns `false` once the session has been closed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Writes one frame to the client.
    ///
    /// Failures are reported to [`SessionHooks::client_error`] rather than
    /// returned. Sending on a closed session does nothing.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) {
        if !self.is_alive() {
            debug!(target: TRANSPORT_TARGET, session = %self.id, "dropping frame for closed session");
            return;
        }
        let result = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_frame(message);
        if let Err(error) = result {
            self.hooks.client_error(self, &error);
        }
    }

    /// Marks the session dead and shuts the socket down in both directions,
    /// which wakes a read loop blocked on this connection. Idempotent.
    pub fn close(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            if let Err(error) = self.stream.shutdown(Shutdown::Both) {
                debug!(target: TRANSPORT_TARGET, session = %self.id, %error, "socket shutdown failed");
            }
        }
    }

    /// Reads frames until the peer leaves, a read fails or the session is
    /// closed, handing each frame to the hooks in arrival order.
    pub(crate) fn run(self: Arc<Self>, mut reader: FrameReader<TcpStream>) {
        let _finaliser = Finaliser(&self);
        self.hooks.client_connected(&self);
        while self.is_alive() {
            match reader.read_frame() {
                Ok(Some(frame)) => self.hooks.handle_message(&self, &frame),
                Ok(None) => {
                    debug!(target: TRANSPORT_TARGET, session = %self.id, "peer closed connection");
                    break;
                }
                Err(error) => {
                    // A read failing because we closed the socket is not news.
                    if self.is_alive() {
                        self.hooks.client_error(&self, &error);
                    }
                    break;
                }
            }
        }
    }

    fn finish(&self) {
        self.close();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
        self.hooks.client_disconnected(self);
    }
}

/// Finalises a session when its read loop exits, including by panic.
struct Finaliser<'a>(&'a Session);

impl Drop for Finaliser<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}
