//! The event catalogue: everything a client may send or receive.
//!
//! Events are internally tagged JSON, `{ "type": "join-room",
//! "roomCode": "AB12CD" }`, with kebab-case tags and camelCase fields.
//! Signaling payloads are carried as raw [`serde_json::Value`] and are
//! routed, never interpreted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use parlor_transport::ConnectionId;

use crate::{ChatMessage, GameState, Mark, RoomCode, UserId};

// ---------------------------------------------------------------------------
// Roster types
// ---------------------------------------------------------------------------

/// One member of a room's roster, as broadcast in `roster-update`.
///
/// The entry persists across reconnects: rejoining with the same user id
/// updates `connection_id` in place instead of appending a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: UserId,
    pub username: String,
    pub avatar: String,
    /// The connection currently speaking for this player.
    pub connection_id: ConnectionId,
    pub ready: bool,
    /// Assigned at join time: the first two joiners get X and O, later
    /// joiners get `None` and spectate.
    pub mark: Option<Mark>,
}

/// Room lifecycle as shown to clients. Tracked but not gating moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    Waiting,
    Playing,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Establishes who this connection is. Must precede any room action.
    /// A missing id asks the server to mint a guest identity for
    /// `username`.
    AnnounceIdentity {
        #[serde(default)]
        id: Option<UserId>,
        username: String,
        #[serde(default)]
        avatar: Option<String>,
    },

    /// Creates an empty room; the caller joins separately.
    CreateRoom,

    /// Joins (or rejoins) the room with the given code.
    JoinRoom { room_code: RoomCode },

    /// Leaves the current room, if any.
    LeaveRoom,

    /// Places the sender's mark at `index` (0–8).
    ///
    /// Routing is by the sender's current room; `room_code` is carried
    /// for wire compatibility and not trusted.
    Move { room_code: RoomCode, index: usize },

    /// Starts a fresh game in the sender's current room.
    ResetGame { room_code: RoomCode },

    /// Sends a chat line to the sender's current room.
    SendChat { text: String },

    /// Relays an opaque peer-negotiation blob to one connection.
    VoiceSignal {
        target_connection_id: ConnectionId,
        signal: Value,
    },

    /// Announces that the client is going away. The transport-level
    /// close performs the same cleanup if this never arrives.
    Disconnect,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Confirms the identity now bound to this connection (echoing a
    /// supplied one, or carrying a freshly minted guest identity).
    IdentityAck {
        id: UserId,
        username: String,
        avatar: String,
    },

    /// Reply to `create-room`, sent to the creator only.
    RoomCreated { room_code: RoomCode },

    /// Reply to `join-room`, sent to the joiner only.
    RoomJoined { room_code: RoomCode },

    /// Current roster and phase, broadcast to the whole room.
    RosterUpdate {
        players: Vec<Player>,
        state: RoomPhase,
    },

    /// A chat line (player or system), to the room or to a joiner.
    ChatMessage(ChatMessage),

    /// The authoritative game state, to the room or to a joiner.
    GameState(GameState),

    /// Backlog of the room's chat, sent to a joiner only.
    ChatHistory { messages: Vec<ChatMessage> },

    /// A request failed; delivered only to the originating connection.
    Error { message: String },

    /// A relayed peer-negotiation blob. `from_user_id` is null when the
    /// sender never announced an identity.
    VoiceSignal {
        from_user_id: Option<UserId>,
        from_connection_id: ConnectionId,
        signal: Value,
    },
}
