//! Server-wide set of live sessions.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

use super::{Session, SessionId, TRANSPORT_TARGET};

/// Live sessions keyed by id.
///
/// Membership changes take one lock. Writes to clients happen outside it, so
/// a slow client never stalls accepting or removing other sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<BTreeMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session.
    pub fn add(&self, session: Arc<Session>) {
        let id = session.id();
        self.lock().insert(id, session);
        debug!(target: TRANSPORT_TARGET, session = %id, "session registered");
    }

    /// Unregisters a session. Returns `false` if it was not registered.
    pub fn remove(&self, id: SessionId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!(target: TRANSPORT_TARGET, session = %id, "session unregistered");
        }
        removed
    }

    /// Sends `message` to every registered session and returns how many
    /// sessions it was offered to.
    ///
    /// Delivery works on a snapshot taken under the lock; sessions that close
    /// meanwhile are skipped. Each write still blocks until that client
    /// accepts the frame. A failed write is reported through that session's
    /// hooks and does not stop delivery to the others.
    pub fn broadcast<T: Serialize + ?Sized>(&self, message: &T) -> usize {
        let sessions: Vec<Arc<Session>> = self.lock().values().cloned().collect();
        for session in &sessions {
            session.send(message);
        }
        sessions.len()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Snapshot of the registered ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<SessionId> {
        self.lock().keys().copied().collect()
    }

    /// Closes every session and empties the registry.
    pub fn close_all(&self) {
        let sessions = std::mem::take(&mut *self.lock());
        for session in sessions.values() {
            session.close();
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SessionId, Arc<Session>>> {
        // Map operations cannot leave it half-updated, so poisoning is benign.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
