//! Unified error type for the Parlor server.

use parlor_presence::PresenceError;
use parlor_protocol::ProtocolError;
use parlor_room::RoomError;
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors, so embedders
/// deal with one type and `?` converts the rest.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A presence-level error (unannounced connection).
    #[error(transparent)]
    Presence(#[from] PresenceError),

    /// A room-level error (unknown code, actor gone).
    #[error(transparent)]
    Room(#[from] RoomError),
}
