//! Error types for the room layer.

use parlor_protocol::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("Room not found")]
    NotFound(RoomCode),

    /// The room's command channel is closed or full; the actor is gone
    /// or shutting down.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
