//! # Parlor
//!
//! A room-based session server for a two-player grid game: clients meet
//! through short room codes, exchange authoritative game state and chat,
//! and relay opaque voice-signaling blobs to each other.
//!
//! This crate ties the layers together: the [`Coordinator`] validates
//! and routes every inbound event against the presence and room
//! registries, the [`ClientHub`] fans outbound events onto per-connection
//! queues, and [`ParlorServer`] runs the WebSocket accept loop.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let server = ParlorServerBuilder::new()
//!     .bind("0.0.0.0:5000")
//!     .build(GuestDirectory::new())
//!     .await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod error;
mod handler;
mod hub;
mod server;

pub use coordinator::Coordinator;
pub use error::ParlorError;
pub use hub::ClientHub;
pub use server::{ParlorServer, ParlorServerBuilder};

/// One-stop imports for embedding or extending the server.
pub mod prelude {
    pub use crate::{
        ClientHub, Coordinator, ParlorError, ParlorServer,
        ParlorServerBuilder,
    };
    pub use parlor_presence::{
        Directory, GuestDirectory, Presence, PresenceRegistry,
    };
    pub use parlor_protocol::{
        ChatMessage, ClientEvent, Codec, GameState, JsonCodec, Mark,
        Outcome, Player, RoomCode, RoomPhase, ServerEvent, UserId,
        UserIdentity,
    };
    pub use parlor_room::{logic, Relay, RoomRegistry};
    pub use parlor_transport::ConnectionId;
}
