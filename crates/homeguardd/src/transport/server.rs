//! Listening socket and accept loop.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use homeguard_config::ListenAddress;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ListenerError, Session, SessionHooks, SessionId, SessionRegistry, TRANSPORT_TARGET};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

type Workers = Arc<Mutex<Vec<JoinHandle<()>>>>;

/// TCP server that turns accepted connections into sessions.
///
/// The server moves between `stopped` and `listening`. [`Server::stop`] only
/// stops accepting; [`Server::close`] also disconnects every client and joins
/// every session thread.
pub struct Server {
    address: ListenAddress,
    hooks: Arc<dyn SessionHooks>,
    registry: Arc<SessionRegistry>,
    listening: Arc<AtomicBool>,
    next_id: Arc<AtomicU64>,
    workers: Workers,
    state: Mutex<AcceptState>,
}

#[derive(Debug, Default)]
struct AcceptState {
    local_addr: Option<SocketAddr>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Server")
            .field("address", &self.address)
            .field("listening", &self.is_listening())
            .field("sessions", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a stopped server for `address`. Port `0` picks a free port.
    pub fn new(address: ListenAddress, hooks: Arc<dyn SessionHooks>) -> Self {
        Self {
            address,
            hooks,
            registry: Arc::new(SessionRegistry::new()),
            listening: Arc::new(AtomicBool::new(false)),
            next_id: Arc::new(AtomicU64::new(1)),
            workers: Arc::default(),
            state: Mutex::default(),
        }
    }

    /// Binds the socket and starts accepting on a background thread.
    ///
    /// Calling `start` while already listening returns the bound address
    /// without rebinding.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] if the address cannot be resolved or bound
    /// or the accept thread cannot be spawned.
    pub fn start(&self) -> Result<SocketAddr, ListenerError> {
        let mut state = self.lock_state();
        if let Some(address) = state.local_addr {
            return Ok(address);
        }

        let listener = bind_tcp(self.address.host(), self.address.port())?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;

        self.listening.store(true, Ordering::SeqCst);
        let accept_loop = AcceptLoop {
            listener,
            local_addr,
            listening: Arc::clone(&self.listening),
            hooks: Arc::clone(&self.hooks),
            registry: Arc::clone(&self.registry),
            next_id: Arc::clone(&self.next_id),
            workers: Arc::clone(&self.workers),
        };
        let thread = thread::Builder::new()
            .name("homeguard-accept".to_owned())
            .spawn(move || accept_loop.run())
            .map_err(|source| {
                self.listening.store(false, Ordering::SeqCst);
                ListenerError::Spawn { source }
            })?;

        state.local_addr = Some(local_addr);
        state.thread = Some(thread);
        drop(state);
        self.hooks.server_started(local_addr);
        Ok(local_addr)
    }

    /// Stops accepting connections and joins the accept thread, which closes
    /// the listening socket. Existing sessions keep running. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept thread panicked.
    pub fn stop(&self) -> Result<(), ListenerError> {
        let thread = {
            let mut state = self.lock_state();
            self.listening.store(false, Ordering::SeqCst);
            state.local_addr = None;
            state.thread.take()
        };
        let Some(thread) = thread else {
            return Ok(());
        };
        let joined = thread.join().map_err(|_| ListenerError::ThreadPanic);
        self.hooks.server_stopped();
        joined
    }

    /// Stops the server, disconnects every client and waits for every
    /// session thread to finish.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Server::stop`]; sessions are closed regardless.
    pub fn close(&self) -> Result<(), ListenerError> {
        let stopped = self.stop();
        self.registry.close_all();
        let workers = std::mem::take(&mut *lock_workers(&self.workers));
        for worker in workers {
            if worker.join().is_err() {
                warn!(target: TRANSPORT_TARGET, "session thread panicked");
            }
        }
        stopped
    }

    /// Sends `message` to every connected client. Returns how many sessions
    /// it was offered to.
    ///
    /// Blocks while any client is slow to read, but never while holding the
    /// registry lock.
    pub fn broadcast<T: Serialize + ?Sized>(&self, message: &T) -> usize {
        self.registry.broadcast(message)
    }

    /// Returns `true` while accepting connections.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Bound address while listening.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_state().local_addr
    }

    /// Number of connected clients.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Live session registry.
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn lock_state(&self) -> MutexGuard<'_, AcceptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let started = self.lock_state().thread.is_some();
        if (started || !self.registry.is_empty())
            && let Err(error) = self.close()
        {
            warn!(target: TRANSPORT_TARGET, %error, "server shutdown failed during drop");
        }
    }
}

fn lock_workers(workers: &Mutex<Vec<JoinHandle<()>>>) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
    workers.lock().unwrap_or_else(PoisonError::into_inner)
}

struct AcceptLoop {
    listener: TcpListener,
    local_addr: SocketAddr,
    listening: Arc<AtomicBool>,
    hooks: Arc<dyn SessionHooks>,
    registry: Arc<SessionRegistry>,
    next_id: Arc<AtomicU64>,
    workers: Workers,
}

impl AcceptLoop {
    fn run(self) {
        info!(
            target: TRANSPORT_TARGET,
            address = %self.local_addr,
            "listener active"
        );
        let mut last_error = None::<io::ErrorKind>;
        while self.listening.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    last_error = None;
                    self.admit(stream);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(error) => {
                    if !self.listening.load(Ordering::SeqCst) {
                        break;
                    }
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        self.hooks.listening_error(&error);
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        debug!(target: TRANSPORT_TARGET, address = %self.local_addr, "listener stopped");
    }

    fn admit(&self, stream: TcpStream) {
        if let Err(error) = stream.set_nonblocking(false) {
            self.hooks.listening_error(&error);
            return;
        }
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (session, reader) = match Session::open(
            id,
            stream,
            Arc::clone(&self.hooks),
            Arc::downgrade(&self.registry),
        ) {
            Ok(opened) => opened,
            Err(error) => {
                self.hooks.listening_error(&error);
                return;
            }
        };

        self.registry.add(Arc::clone(&session));
        let worker = Arc::clone(&session);
        let spawned = thread::Builder::new()
            .name(format!("homeguard-session-{}", id.get()))
            .spawn(move || worker.run(reader));
        match spawned {
            Ok(handle) => {
                let mut workers = lock_workers(&self.workers);
                workers.retain(|worker| !worker.is_finished());
                workers.push(handle);
            }
            Err(error) => {
                self.registry.remove(id);
                session.close();
                self.hooks.listening_error(&error);
            }
        }
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
