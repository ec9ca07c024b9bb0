//! The presence registry: which identity and room each connection holds.

use std::collections::HashMap;

use parlor_protocol::{RoomCode, UserIdentity};
use parlor_transport::ConnectionId;

use crate::PresenceError;

/// The live state attached to one connection.
#[derive(Debug, Clone)]
pub struct Presence {
    /// The identity this connection announced.
    pub identity: UserIdentity,
    /// The room this connection currently occupies, if any.
    ///
    /// Invariant: when set, the room exists and its roster contains this
    /// identity. The coordinator maintains this by clearing the field as
    /// part of every leave path.
    pub room: Option<RoomCode>,
    /// Reserved for a future ready-check flow; game logic ignores it.
    pub ready: bool,
}

/// Maps connection ids to [`Presence`] entries.
///
/// Entries are created on the first identity announcement and deleted on
/// disconnect, always after the room-leave cleanup, so no room ever
/// holds a player whose presence is already gone.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: HashMap<ConnectionId, Presence>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establishes or refreshes the presence for a connection.
    ///
    /// Announcing the same identity again only refreshes the name and
    /// avatar, keeping room membership intact (idempotent upsert).
    /// Announcing a *different* identity replaces the entry wholesale;
    /// the room reference is dropped on the safe side.
    pub fn announce(
        &mut self,
        conn: ConnectionId,
        identity: UserIdentity,
    ) {
        let same_identity = self
            .entries
            .get(&conn)
            .is_some_and(|p| p.identity.id == identity.id);

        if same_identity {
            if let Some(existing) = self.entries.get_mut(&conn) {
                existing.identity = identity;
            }
            return;
        }

        tracing::info!(
            %conn,
            user = %identity.username,
            "presence announced"
        );
        self.entries.insert(
            conn,
            Presence {
                identity,
                room: None,
                ready: false,
            },
        );
    }

    /// Looks up the presence for a connection.
    pub fn get(&self, conn: &ConnectionId) -> Option<&Presence> {
        self.entries.get(conn)
    }

    /// Returns the identity for a connection, or `NotAuthenticated`.
    pub fn identity(
        &self,
        conn: &ConnectionId,
    ) -> Result<&UserIdentity, PresenceError> {
        self.entries
            .get(conn)
            .map(|p| &p.identity)
            .ok_or_else(|| PresenceError::NotAuthenticated(conn.clone()))
    }

    /// Records that a connection joined a room.
    pub fn set_room(
        &mut self,
        conn: &ConnectionId,
        room: RoomCode,
    ) -> Result<(), PresenceError> {
        let presence = self
            .entries
            .get_mut(conn)
            .ok_or_else(|| PresenceError::NotAuthenticated(conn.clone()))?;
        presence.room = Some(room);
        Ok(())
    }

    /// Clears a connection's room membership, if any.
    pub fn clear_room(&mut self, conn: &ConnectionId) {
        if let Some(presence) = self.entries.get_mut(conn) {
            presence.room = None;
        }
    }

    /// Deletes the presence for a disconnecting connection.
    pub fn remove(&mut self, conn: &ConnectionId) -> Option<Presence> {
        let removed = self.entries.remove(conn);
        if let Some(presence) = &removed {
            tracing::info!(
                %conn,
                user = %presence.identity.username,
                "presence removed"
            );
        }
        removed
    }

    /// Number of tracked connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_protocol::UserId;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn identity(id: &str, name: &str) -> UserIdentity {
        UserIdentity {
            id: UserId::new(id),
            username: name.into(),
            avatar: format!("https://example.test/{name}.svg"),
        }
    }

    #[test]
    fn test_announce_creates_entry() {
        let mut reg = PresenceRegistry::new();
        reg.announce(conn("c1"), identity("u-1", "ana"));

        let presence = reg.get(&conn("c1")).expect("entry should exist");
        assert_eq!(presence.identity.username, "ana");
        assert_eq!(presence.room, None);
        assert!(!presence.ready);
    }

    #[test]
    fn test_announce_same_identity_keeps_room() {
        let mut reg = PresenceRegistry::new();
        reg.announce(conn("c1"), identity("u-1", "ana"));
        reg.set_room(&conn("c1"), RoomCode::new("AB12CD")).unwrap();

        // Same id, new display name — membership must survive.
        reg.announce(conn("c1"), identity("u-1", "ana-renamed"));

        let presence = reg.get(&conn("c1")).unwrap();
        assert_eq!(presence.identity.username, "ana-renamed");
        assert_eq!(presence.room, Some(RoomCode::new("AB12CD")));
    }

    #[test]
    fn test_announce_different_identity_replaces_entry() {
        let mut reg = PresenceRegistry::new();
        reg.announce(conn("c1"), identity("u-1", "ana"));
        reg.set_room(&conn("c1"), RoomCode::new("AB12CD")).unwrap();

        reg.announce(conn("c1"), identity("u-2", "bob"));

        let presence = reg.get(&conn("c1")).unwrap();
        assert_eq!(presence.identity.id, UserId::new("u-2"));
        assert_eq!(presence.room, None);
    }

    #[test]
    fn test_identity_unknown_connection_is_not_authenticated() {
        let reg = PresenceRegistry::new();
        let result = reg.identity(&conn("ghost"));
        assert!(matches!(
            result,
            Err(PresenceError::NotAuthenticated(_))
        ));
    }

    #[test]
    fn test_set_room_requires_presence() {
        let mut reg = PresenceRegistry::new();
        let result = reg.set_room(&conn("ghost"), RoomCode::new("AB12CD"));
        assert!(matches!(
            result,
            Err(PresenceError::NotAuthenticated(_))
        ));
    }

    #[test]
    fn test_clear_room() {
        let mut reg = PresenceRegistry::new();
        reg.announce(conn("c1"), identity("u-1", "ana"));
        reg.set_room(&conn("c1"), RoomCode::new("AB12CD")).unwrap();

        reg.clear_room(&conn("c1"));

        assert_eq!(reg.get(&conn("c1")).unwrap().room, None);
    }

    #[test]
    fn test_remove_deletes_entry() {
        let mut reg = PresenceRegistry::new();
        reg.announce(conn("c1"), identity("u-1", "ana"));

        let removed = reg.remove(&conn("c1"));

        assert!(removed.is_some());
        assert!(reg.get(&conn("c1")).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_unknown_connection_is_noop() {
        let mut reg = PresenceRegistry::new();
        assert!(reg.remove(&conn("ghost")).is_none());
    }

    #[test]
    fn test_len_tracks_connections() {
        let mut reg = PresenceRegistry::new();
        assert_eq!(reg.len(), 0);

        reg.announce(conn("c1"), identity("u-1", "ana"));
        reg.announce(conn("c2"), identity("u-2", "bob"));
        assert_eq!(reg.len(), 2);

        // Two connections may even share an identity (reconnect overlap).
        reg.announce(conn("c3"), identity("u-1", "ana"));
        assert_eq!(reg.len(), 3);
    }
}
