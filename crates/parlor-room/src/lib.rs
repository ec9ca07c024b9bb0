//! Room lifecycle management for Parlor.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! roster, chat log, and game state. All mutations of one room are
//! serialized through its command channel; distinct rooms run fully in
//! parallel. Outbound traffic leaves through the [`Relay`] interface the
//! host supplies; nothing here touches sockets.
//!
//! # Key pieces
//!
//! - [`logic`]: the pure game engine (apply a move, find a winner)
//! - [`RoomRegistry`]: creates rooms, resolves codes, deletes empties
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Relay`]: unicast/broadcast primitive implemented by the host

mod error;
pub mod logic;
mod registry;
mod relay;
mod room;

pub use error::RoomError;
pub use registry::RoomRegistry;
pub use relay::Relay;
pub use room::{LeaveOutcome, RoomHandle, RoomSnapshot};
