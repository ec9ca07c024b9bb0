//! The client hub: the production [`Relay`] implementation.
//!
//! Maps each live connection to an unbounded outbound queue (drained by
//! that connection's writer task) and each room code to the set of
//! subscribed connections. All relay methods are synchronous and only
//! push onto queues, so callers (room actors included) never block on
//! socket I/O.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parlor_protocol::{RoomCode, ServerEvent};
use parlor_room::Relay;
use parlor_transport::ConnectionId;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Shared fan-out state. Cheap to clone.
#[derive(Clone, Default)]
pub struct ClientHub {
    inner: Arc<Mutex<HubState>>,
}

#[derive(Default)]
struct HubState {
    clients: HashMap<ConnectionId, UnboundedSender<ServerEvent>>,
    groups: HashMap<RoomCode, HashSet<ConnectionId>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Critical sections are tiny and never await, so a poisoned lock
    /// (a panic elsewhere) just hands back the inner state.
    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a connection and returns the queue its writer task
    /// must drain.
    pub fn attach(
        &self,
        conn: ConnectionId,
    ) -> UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().clients.insert(conn, tx);
        rx
    }

    /// Removes a connection from the hub and from every group. Closing
    /// the queue ends the writer task.
    pub fn detach(&self, conn: &ConnectionId) {
        let mut state = self.lock();
        state.clients.remove(conn);
        for members in state.groups.values_mut() {
            members.remove(conn);
        }
        state.groups.retain(|_, members| !members.is_empty());
    }

    /// Number of attached connections.
    pub fn len(&self) -> usize {
        self.lock().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().clients.is_empty()
    }
}

impl Relay for ClientHub {
    fn unicast(&self, conn: &ConnectionId, event: ServerEvent) {
        let state = self.lock();
        if let Some(tx) = state.clients.get(conn) {
            // A send error means the receiver is mid-teardown; the
            // detach will clean the entry up.
            let _ = tx.send(event);
        }
    }

    fn subscribe(&self, conn: &ConnectionId, room: &RoomCode) {
        self.lock()
            .groups
            .entry(room.clone())
            .or_default()
            .insert(conn.clone());
    }

    fn unsubscribe(&self, conn: &ConnectionId, room: &RoomCode) {
        let mut state = self.lock();
        let emptied = match state.groups.get_mut(room) {
            Some(members) => {
                members.remove(conn);
                members.is_empty()
            }
            None => false,
        };
        if emptied {
            state.groups.remove(room);
        }
    }

    fn broadcast(&self, room: &RoomCode, event: ServerEvent) {
        let state = self.lock();
        let Some(members) = state.groups.get(room) else {
            return;
        };
        for conn in members {
            if let Some(tx) = state.clients.get(conn) {
                let _ = tx.send(event.clone());
            }
        }
    }
}
