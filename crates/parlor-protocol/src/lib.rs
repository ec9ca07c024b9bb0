//! Wire protocol for Parlor.
//!
//! This crate defines the language that clients and the server speak:
//!
//! - **Identifiers** ([`UserId`], [`RoomCode`]): stable newtypes that
//!   travel on the wire as plain strings.
//! - **Payloads** ([`GameState`], [`ChatMessage`], [`Player`]): the data
//!   carried by events.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): every message a
//!   client may send or receive, as internally tagged JSON.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//!
//! The protocol layer knows nothing about rooms or presence; it only
//! describes what travels over a connection.

mod chat;
mod codec;
mod error;
mod events;
mod game;
mod ids;

pub use chat::ChatMessage;
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use events::{ClientEvent, Player, RoomPhase, ServerEvent};
pub use game::{GameState, Mark, Outcome, BOARD_CELLS};
pub use ids::{RoomCode, UserId, UserIdentity};
