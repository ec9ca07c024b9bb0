//! Presence tracking for Parlor.
//!
//! This crate answers two questions for the coordinator:
//!
//! 1. **Who is this connection?** [`PresenceRegistry`] maps a live
//!    connection to the identity it announced and the room it currently
//!    occupies.
//! 2. **Who is this display name?** The [`Directory`] trait resolves a
//!    name to a stable [`UserIdentity`](parlor_protocol::UserIdentity);
//!    [`GuestDirectory`] is the in-memory implementation that mints guest
//!    identities on first sight.
//!
//! The registry is a plain map, deliberately not synchronised here: it is
//! owned by the coordinator behind a single lock, and keeping it simple
//! avoids hidden double locking.

#![allow(async_fn_in_trait)]

mod directory;
mod error;
mod registry;

pub use directory::{Directory, GuestDirectory};
pub use error::{DirectoryError, PresenceError};
pub use registry::{Presence, PresenceRegistry};
