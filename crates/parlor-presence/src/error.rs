//! Error types for the presence layer.

use parlor_transport::ConnectionId;

/// Errors raised when validating a connection's presence.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The connection never announced an identity. Surfaced to the
    /// originating connection as an error event; all other presence
    /// conditions are benign no-ops.
    #[error("User not authenticated")]
    NotAuthenticated(ConnectionId),
}

/// Errors raised by an identity directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The backing store could not produce an identity.
    #[error("identity lookup failed: {0}")]
    Unavailable(String),
}
