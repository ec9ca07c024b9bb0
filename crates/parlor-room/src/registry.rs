//! Room registry: creates rooms, resolves codes, deletes empties.

use std::collections::HashMap;

use parlor_protocol::{RoomCode, UserId};
use parlor_transport::ConnectionId;
use rand::Rng;

use crate::room::{spawn_room, LeaveOutcome, RoomHandle};
use crate::{Relay, RoomError};

/// Length of a generated room code.
const CODE_LEN: usize = 6;

/// Generated codes draw from uppercase alphanumerics only, so they read
/// well over voice and survive any casing a client types back.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks all live rooms by code.
///
/// The registry only maps codes to actor handles; everything inside a
/// room belongs to its actor. Rooms exist from `create` until the last
/// player leaves — emptiness is the only cleanup trigger, there are no
/// timers.
pub struct RoomRegistry<R: Relay> {
    rooms: HashMap<RoomCode, RoomHandle>,
    relay: R,
}

impl<R: Relay> RoomRegistry<R> {
    /// Creates an empty registry that spawns rooms wired to `relay`.
    pub fn new(relay: R) -> Self {
        Self {
            rooms: HashMap::new(),
            relay,
        }
    }

    /// Creates a fresh, empty room and returns its code.
    ///
    /// Nobody is joined yet; the creator issues a separate join, same
    /// as anyone else. Code collisions are resolved by regenerating.
    pub fn create(&mut self) -> RoomCode {
        let code = loop {
            let candidate = random_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let handle = spawn_room(
            code.clone(),
            self.relay.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(code.clone(), handle);
        tracing::info!(%code, rooms = self.rooms.len(), "room created");
        code
    }

    /// Resolves a code to a room handle.
    ///
    /// Case-insensitive by construction: [`RoomCode`] is uppercase
    /// before it ever reaches the map.
    pub fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).cloned()
    }

    /// Removes a player from a room, deleting the room if it empties.
    pub async fn leave(
        &mut self,
        code: &RoomCode,
        user: UserId,
        conn: ConnectionId,
    ) -> Result<LeaveOutcome, RoomError> {
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let outcome = handle.leave(user, conn).await?;

        if outcome.remaining == 0 {
            if let Some(handle) = self.rooms.remove(code) {
                let _ = handle.shutdown().await;
            }
            tracing::info!(%code, "room deleted (empty)");
        }

        Ok(outcome)
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Codes of all live rooms.
    pub fn codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }
}

/// Generates a random 6-character room code.
fn random_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| {
            let i = rng.random_range(0..CODE_CHARSET.len());
            CODE_CHARSET[i] as char
        })
        .collect();
    RoomCode::new(code)
}
