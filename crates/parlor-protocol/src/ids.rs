//! Identifier newtypes and the user identity record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A user's stable identifier.
///
/// Supplied by the caller (or minted by the identity directory) and
/// assumed globally unique per person. Unlike a [`ConnectionId`]
/// (`parlor_transport::ConnectionId`), it survives reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A short public room code.
///
/// Always held uppercase: both construction and deserialization
/// normalize, so lookups are case-insensitive by construction rather than
/// by convention at every call site. Generated codes are 6 uppercase
/// alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a code, normalizing to uppercase.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a connection claims to be: stable id, display name, avatar URL.
///
/// Immutable once announced for a connection. The core trusts it as
/// supplied; verifying it is an external concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub username: String,
    pub avatar: String,
}
