//! The session coordinator: validates and routes every inbound event.
//!
//! One coordinator serves the whole process. It owns the presence and
//! room registries behind their own locks (injected state, no ambient
//! globals) and emits through the [`Relay`]. Locks are held only across
//! registry operations; every send is queue-only, so nothing blocks
//! under a lock.
//!
//! Failure discipline: `NotAuthenticated` and `RoomNotFound` go back to
//! the originating connection as `error` events; everything else
//! (wrong-turn moves, actions outside a room, malformed cell indexes)
//! is logged at debug level and dropped. No failure here ever
//! terminates a connection or leaks to other room members.

use tokio::sync::Mutex;

use parlor_presence::{Directory, PresenceError, PresenceRegistry};
use parlor_protocol::{
    ClientEvent, RoomCode, ServerEvent, UserId, UserIdentity,
};
use parlor_room::{Relay, RoomRegistry};
use parlor_transport::ConnectionId;

/// The protocol brain: receives connection-scoped events, checks them
/// against presence and room state, mutates through the room actors,
/// and decides what gets sent to whom.
pub struct Coordinator<R: Relay, D: Directory> {
    presence: Mutex<PresenceRegistry>,
    rooms: Mutex<RoomRegistry<R>>,
    relay: R,
    directory: D,
}

impl<R: Relay, D: Directory> Coordinator<R, D> {
    /// Builds a coordinator with empty registries.
    pub fn new(relay: R, directory: D) -> Self {
        Self {
            presence: Mutex::new(PresenceRegistry::new()),
            rooms: Mutex::new(RoomRegistry::new(relay.clone())),
            relay,
            directory,
        }
    }

    /// Handles one inbound event for a connection.
    ///
    /// Returns `true` when the connection should close (the client sent
    /// an explicit disconnect).
    pub async fn handle(
        &self,
        conn: &ConnectionId,
        event: ClientEvent,
    ) -> bool {
        match event {
            ClientEvent::AnnounceIdentity {
                id,
                username,
                avatar,
            } => {
                self.announce_identity(conn, id, username, avatar).await;
            }
            ClientEvent::CreateRoom => self.create_room(conn).await,
            ClientEvent::JoinRoom { room_code } => {
                self.join_room(conn, room_code).await;
            }
            ClientEvent::LeaveRoom => self.leave_room(conn).await,
            // Routing is by the sender's current room; the payload's
            // roomCode is carried for compatibility only.
            ClientEvent::Move { index, .. } => {
                self.play(conn, index).await;
            }
            ClientEvent::ResetGame { .. } => {
                self.reset_game(conn).await;
            }
            ClientEvent::SendChat { text } => {
                self.send_chat(conn, text).await;
            }
            ClientEvent::VoiceSignal {
                target_connection_id,
                signal,
            } => {
                self.voice_signal(conn, target_connection_id, signal)
                    .await;
            }
            ClientEvent::Disconnect => {
                self.connection_closed(conn).await;
                return true;
            }
        }
        false
    }

    /// Transport-level disconnect callback. Runs the leave cleanup
    /// *before* deleting the presence, so the room never holds a player
    /// whose presence is already gone. Idempotent.
    pub async fn connection_closed(&self, conn: &ConnectionId) {
        self.leave_current_room(conn).await;
        self.presence.lock().await.remove(conn);
    }

    // -- Event handlers -----------------------------------------------------

    async fn announce_identity(
        &self,
        conn: &ConnectionId,
        id: Option<UserId>,
        username: String,
        avatar: Option<String>,
    ) {
        let identity = match id {
            // A caller-supplied id is trusted as-is.
            Some(id) => UserIdentity {
                id,
                username,
                avatar: avatar.unwrap_or_default(),
            },
            // No id: mint (or find) a guest identity for this name.
            None => match self.directory.resolve(&username).await {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!(
                        %conn,
                        error = %e,
                        "identity resolution failed"
                    );
                    self.send_error(conn, e.to_string());
                    return;
                }
            },
        };

        self.presence
            .lock()
            .await
            .announce(conn.clone(), identity.clone());

        self.relay.unicast(
            conn,
            ServerEvent::IdentityAck {
                id: identity.id,
                username: identity.username,
                avatar: identity.avatar,
            },
        );
    }

    async fn create_room(&self, conn: &ConnectionId) {
        if let Err(e) = self.require_presence(conn).await {
            self.send_error(conn, e.to_string());
            return;
        }

        let code = self.rooms.lock().await.create();
        self.relay
            .unicast(conn, ServerEvent::RoomCreated { room_code: code });
    }

    async fn join_room(&self, conn: &ConnectionId, code: RoomCode) {
        let (identity, previous) = {
            let presence = self.presence.lock().await;
            match presence.get(conn) {
                Some(p) => (p.identity.clone(), p.room.clone()),
                None => {
                    self.send_error(
                        conn,
                        PresenceError::NotAuthenticated(conn.clone())
                            .to_string(),
                    );
                    return;
                }
            }
        };

        // A connection occupies at most one room: switching rooms
        // leaves the old one first. Rejoining the same code falls
        // through to the actor's reconnection path.
        if let Some(previous) = previous {
            if previous != code {
                self.leave_current_room(conn).await;
            }
        }

        let result = {
            let rooms = self.rooms.lock().await;
            match rooms.get(&code) {
                Some(handle) => {
                    handle.join(identity, conn.clone()).await
                }
                None => {
                    Err(parlor_room::RoomError::NotFound(code.clone()))
                }
            }
        };

        match result {
            Ok(()) => {
                let _ = self
                    .presence
                    .lock()
                    .await
                    .set_room(conn, code);
            }
            Err(e) => self.send_error(conn, e.to_string()),
        }
    }

    async fn leave_room(&self, conn: &ConnectionId) {
        if let Err(e) = self.require_presence(conn).await {
            self.send_error(conn, e.to_string());
            return;
        }
        // Leaving while in no room is a benign no-op.
        self.leave_current_room(conn).await;
    }

    async fn play(&self, conn: &ConnectionId, index: usize) {
        let Some((user, code)) = self.room_context(conn).await else {
            return;
        };

        let handle = self.rooms.lock().await.get(&code);
        if let Some(handle) = handle {
            if let Err(e) = handle.play(user, index).await {
                tracing::debug!(%conn, error = %e, "move not routed");
            }
        }
    }

    async fn reset_game(&self, conn: &ConnectionId) {
        let Some((_, code)) = self.room_context(conn).await else {
            return;
        };

        let handle = self.rooms.lock().await.get(&code);
        if let Some(handle) = handle {
            if let Err(e) = handle.reset().await {
                tracing::debug!(%conn, error = %e, "reset not routed");
            }
        }
    }

    async fn send_chat(&self, conn: &ConnectionId, text: String) {
        let (username, code) = {
            let presence = self.presence.lock().await;
            match presence.get(conn) {
                None => {
                    self.send_error(
                        conn,
                        PresenceError::NotAuthenticated(conn.clone())
                            .to_string(),
                    );
                    return;
                }
                Some(p) => match &p.room {
                    Some(code) => {
                        (p.identity.username.clone(), code.clone())
                    }
                    None => {
                        tracing::debug!(
                            %conn,
                            "chat outside any room, ignoring"
                        );
                        return;
                    }
                },
            }
        };

        let handle = self.rooms.lock().await.get(&code);
        if let Some(handle) = handle {
            if let Err(e) = handle.chat(username, text).await {
                tracing::debug!(%conn, error = %e, "chat not routed");
            }
        }
    }

    /// Stateless relay: the payload is opaque and forwarded verbatim;
    /// only the target connection id is used for routing. A sender that
    /// never announced still relays, with a null user id.
    async fn voice_signal(
        &self,
        conn: &ConnectionId,
        target: ConnectionId,
        signal: serde_json::Value,
    ) {
        let from_user_id = self
            .presence
            .lock()
            .await
            .get(conn)
            .map(|p| p.identity.id.clone());

        self.relay.unicast(
            &target,
            ServerEvent::VoiceSignal {
                from_user_id,
                from_connection_id: conn.clone(),
                signal,
            },
        );
    }

    // -- Shared plumbing ----------------------------------------------------

    /// The leave path shared by leave-room, room switches, and
    /// disconnects: tells the room (which broadcasts and may trigger
    /// deletion), then clears the membership.
    async fn leave_current_room(&self, conn: &ConnectionId) {
        let target = {
            let presence = self.presence.lock().await;
            presence.get(conn).and_then(|p| {
                p.room
                    .clone()
                    .map(|code| (p.identity.id.clone(), code))
            })
        };

        let Some((user, code)) = target else {
            return;
        };

        let result = self
            .rooms
            .lock()
            .await
            .leave(&code, user, conn.clone())
            .await;
        if let Err(e) = result {
            tracing::debug!(%conn, %code, error = %e, "leave failed");
        }

        self.presence.lock().await.clear_room(conn);
    }

    async fn require_presence(
        &self,
        conn: &ConnectionId,
    ) -> Result<(), PresenceError> {
        self.presence
            .lock()
            .await
            .identity(conn)
            .map(|_| ())
    }

    /// The sender's id and current room, or `None` (with the
    /// appropriate error/no-op handling) when it has neither.
    async fn room_context(
        &self,
        conn: &ConnectionId,
    ) -> Option<(UserId, RoomCode)> {
        let presence = self.presence.lock().await;
        match presence.get(conn) {
            None => {
                drop(presence);
                self.send_error(
                    conn,
                    PresenceError::NotAuthenticated(conn.clone())
                        .to_string(),
                );
                None
            }
            Some(p) => match &p.room {
                Some(code) => {
                    Some((p.identity.id.clone(), code.clone()))
                }
                None => {
                    tracing::debug!(
                        %conn,
                        "action outside any room, ignoring"
                    );
                    None
                }
            },
        }
    }

    fn send_error(&self, conn: &ConnectionId, message: impl Into<String>) {
        self.relay.unicast(
            conn,
            ServerEvent::Error {
                message: message.into(),
            },
        );
    }
}
