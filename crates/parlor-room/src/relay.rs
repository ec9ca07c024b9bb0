//! The broadcast interface the room layer requires from its host.

use parlor_protocol::{RoomCode, ServerEvent};
use parlor_transport::ConnectionId;

/// Topic-based publish primitive, supplied by the transport host.
///
/// Room actors and the coordinator emit every outbound event through
/// this trait; they never talk to sockets directly. All methods are
/// fire-and-forget and must not block: implementations queue onto
/// per-connection channels, so no I/O ever runs inside a room actor.
/// Sends to vanished connections are silently dropped.
pub trait Relay: Clone + Send + Sync + 'static {
    /// Delivers an event to one connection.
    fn unicast(&self, conn: &ConnectionId, event: ServerEvent);

    /// Adds a connection to a room's broadcast group.
    fn subscribe(&self, conn: &ConnectionId, room: &RoomCode);

    /// Removes a connection from a room's broadcast group.
    fn unsubscribe(&self, conn: &ConnectionId, room: &RoomCode);

    /// Delivers an event to every connection in a room's group.
    fn broadcast(&self, room: &RoomCode, event: ServerEvent);
}
