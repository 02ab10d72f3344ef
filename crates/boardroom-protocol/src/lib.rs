//! Shared vocabulary for Boardroom.
//!
//! This crate defines the values every other layer speaks in:
//!
//! - **Identifiers** ([`PlayerId`], [`RoomId`], [`GameId`], [`LoginId`]):
//!   string newtypes for the public handles.
//! - **Ordered id sequences** ([`OrderedIds`]): join order and seat order
//!   matter, so membership lists are ordered sets, not hash sets.
//! - **Error taxonomy** ([`ErrorKind`]): the coarse kind every crate's
//!   error maps to.
//! - **Id generation** ([`IdGenerator`], [`ShortCodeGenerator`]).
//! - **Codec** ([`Codec`], [`JsonCodec`]): how records become bytes in a
//!   store and how bytes become typed records again.
//!
//! # Architecture
//!
//! ```text
//! Engines (room, game, identity) → Store (Versioned rows) → Protocol (Codec)
//! ```

mod codec;
mod error;
mod ordered;
mod shortcode;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use ordered::OrderedIds;
pub use shortcode::{IdGenerator, ShortCodeGenerator};
pub use types::{ErrorKind, GameId, LoginId, PlayerId, RoomId};
