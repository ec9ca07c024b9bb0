//! Room actor: an isolated Tokio task owning one room's roster, chat
//! log, and game state.
//!
//! Commands arrive on an mpsc channel and are processed one at a time,
//! which gives every room the serialization the protocol requires: two
//! near-simultaneous moves cannot both pass the "cell empty" check,
//! because the second is not looked at until the first has fully
//! applied. Outbound traffic leaves through the [`Relay`].

use parlor_protocol::{
    ChatMessage, GameState, Mark, Player, RoomCode, RoomPhase, ServerEvent,
    UserId, UserIdentity,
};
use parlor_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{logic, Relay, RoomError};

/// Result of a leave command.
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    /// Whether a roster entry was actually removed. False when the
    /// leaving connection no longer speaks for the player (it was
    /// superseded by a reconnect) or the identity was never a member.
    pub removed: bool,
    /// Players left in the room afterwards. Zero means the registry
    /// must delete the room.
    pub remaining: usize,
}

/// A diagnostic copy of the actor's state, for tests and introspection.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub players: Vec<Player>,
    pub phase: RoomPhase,
    pub game: GameState,
    pub messages: Vec<ChatMessage>,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Add a player (or re-bind a rejoining one) and sync the joiner.
    Join {
        identity: UserIdentity,
        conn: ConnectionId,
        reply: oneshot::Sender<()>,
    },

    /// Remove the player for `user`, provided `conn` still speaks for it.
    Leave {
        user: UserId,
        conn: ConnectionId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    /// Apply a move from a player (fire-and-forget; illegal moves drop).
    Move { user: UserId, index: usize },

    /// Start a fresh game.
    Reset,

    /// Append and broadcast a chat line.
    Chat { from: String, text: String },

    /// Request a state snapshot.
    Snapshot { reply: oneshot::Sender<RoomSnapshot> },

    /// Shut down the actor.
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's public code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Sends a join request and waits for the roster to be updated.
    pub async fn join(
        &self,
        identity: UserIdentity,
        conn: ConnectionId,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                identity,
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Sends a leave request and reports what happened.
    pub async fn leave(
        &self,
        user: UserId,
        conn: ConnectionId,
    ) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                user,
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Routes a move to the room (fire-and-forget).
    pub async fn play(
        &self,
        user: UserId,
        index: usize,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Move { user, index })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Resets the room's game.
    pub async fn reset(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Reset)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Sends a chat line into the room.
    pub async fn chat(
        &self,
        from: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Chat {
                from: from.into(),
                text: text.into(),
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Requests a snapshot of the room's current state.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<R: Relay> {
    code: RoomCode,
    players: Vec<Player>,
    messages: Vec<ChatMessage>,
    phase: RoomPhase,
    game: GameState,
    relay: R,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<R: Relay> RoomActor<R> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(code = %self.code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    identity,
                    conn,
                    reply,
                } => {
                    self.handle_join(identity, conn);
                    let _ = reply.send(());
                }
                RoomCommand::Leave { user, conn, reply } => {
                    let outcome = self.handle_leave(&user, &conn);
                    let _ = reply.send(outcome);
                }
                RoomCommand::Move { user, index } => {
                    self.handle_move(&user, index);
                }
                RoomCommand::Reset => {
                    self.game = logic::reset();
                    tracing::info!(code = %self.code, "game reset");
                    self.broadcast_game();
                }
                RoomCommand::Chat { from, text } => {
                    let msg = ChatMessage::user(from, text);
                    self.messages.push(msg.clone());
                    self.relay.broadcast(
                        &self.code,
                        ServerEvent::ChatMessage(msg),
                    );
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(code = %self.code, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(code = %self.code, "room actor stopped");
    }

    fn handle_join(&mut self, identity: UserIdentity, conn: ConnectionId) {
        let rejoin_at = self
            .players
            .iter()
            .position(|p| p.id == identity.id);

        if let Some(at) = rejoin_at {
            // Reconnection: re-bind the roster entry to the new
            // connection. No system message for rejoins.
            self.players[at].connection_id = conn.clone();
            tracing::info!(
                code = %self.code,
                user = %self.players[at].username,
                "player reconnected"
            );
        } else {
            let mark = self.free_mark();
            let username = identity.username.clone();
            self.players.push(Player {
                id: identity.id,
                username: identity.username,
                avatar: identity.avatar,
                connection_id: conn.clone(),
                ready: false,
                mark,
            });
            self.update_phase();
            tracing::info!(
                code = %self.code,
                user = %username,
                players = self.players.len(),
                ?mark,
                "player joined"
            );

            // Broadcast the join notice before subscribing the joiner:
            // the newcomer sees it only in the history they receive
            // below, never as a live duplicate.
            let notice =
                ChatMessage::system(format!("{username} joined the room."));
            self.messages.push(notice.clone());
            self.relay
                .broadcast(&self.code, ServerEvent::ChatMessage(notice));
        }

        self.relay.subscribe(&conn, &self.code);
        self.relay.unicast(
            &conn,
            ServerEvent::RoomJoined {
                room_code: self.code.clone(),
            },
        );
        self.broadcast_roster();
        self.relay
            .unicast(&conn, ServerEvent::GameState(self.game.clone()));
        self.relay.unicast(
            &conn,
            ServerEvent::ChatHistory {
                messages: self.messages.clone(),
            },
        );
    }

    fn handle_leave(
        &mut self,
        user: &UserId,
        conn: &ConnectionId,
    ) -> LeaveOutcome {
        // The leaver stops hearing the room either way.
        self.relay.unsubscribe(conn, &self.code);

        // Only evict the roster entry if this connection still speaks
        // for the player; a stale disconnect after a reconnect must
        // not remove the live entry.
        let position = self
            .players
            .iter()
            .position(|p| &p.id == user && &p.connection_id == conn);

        let Some(position) = position else {
            return LeaveOutcome {
                removed: false,
                remaining: self.players.len(),
            };
        };

        let player = self.players.remove(position);
        self.update_phase();
        tracing::info!(
            code = %self.code,
            user = %player.username,
            players = self.players.len(),
            "player left"
        );

        if !self.players.is_empty() {
            self.broadcast_roster();
            // Leave notices are broadcast to whoever remains but not
            // recorded in the history.
            let notice = ChatMessage::system(format!(
                "{} left the room.",
                player.username
            ));
            self.relay
                .broadcast(&self.code, ServerEvent::ChatMessage(notice));
        }

        LeaveOutcome {
            removed: true,
            remaining: self.players.len(),
        }
    }

    fn handle_move(&mut self, user: &UserId, index: usize) {
        let Some(player) = self.players.iter().find(|p| &p.id == user)
        else {
            tracing::debug!(
                code = %self.code,
                %user,
                "move from non-member, ignoring"
            );
            return;
        };

        let Some(mark) = player.mark else {
            tracing::debug!(
                code = %self.code,
                user = %player.username,
                "move from spectator, ignoring"
            );
            return;
        };

        match logic::apply_move(&mut self.game, index, mark) {
            Ok(()) => self.broadcast_game(),
            Err(reason) => {
                tracing::debug!(
                    code = %self.code,
                    user = %player.username,
                    index,
                    %reason,
                    "move rejected"
                );
            }
        }
    }

    /// The lowest mark not yet assigned to any roster entry; `None`
    /// makes the joiner a spectator.
    fn free_mark(&self) -> Option<Mark> {
        [Mark::X, Mark::O]
            .into_iter()
            .find(|m| !self.players.iter().any(|p| p.mark == Some(*m)))
    }

    fn update_phase(&mut self) {
        self.phase = if self.players.len() >= 2 {
            RoomPhase::Playing
        } else {
            RoomPhase::Waiting
        };
    }

    fn broadcast_roster(&self) {
        self.relay.broadcast(
            &self.code,
            ServerEvent::RosterUpdate {
                players: self.players.clone(),
                state: self.phase,
            },
        );
    }

    fn broadcast_game(&self) {
        self.relay
            .broadcast(&self.code, ServerEvent::GameState(self.game.clone()));
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            players: self.players.clone(),
            phase: self.phase,
            game: self.game.clone(),
            messages: self.messages.clone(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it fills.
pub(crate) fn spawn_room<R: Relay>(
    code: RoomCode,
    relay: R,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        code: code.clone(),
        players: Vec::new(),
        messages: Vec::new(),
        phase: RoomPhase::Waiting,
        game: logic::reset(),
        relay,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
