//! Room lifecycle management for Boardroom.
//!
//! A room is the lobby players gather in before a game: one host, an
//! ordered list of seated players, a capacity, optional password, optional
//! expiry. The [`RoomEngine`] owns every rule about who may sit where.
//!
//! # Key types
//!
//! - [`RoomEngine`]: creates, joins, leaves, edits, archives, sweeps
//! - [`Room`]: the persisted record and its pure membership rules
//! - [`RoomSettings`] / [`RoomPatch`]: create-time and edit-time input
//! - [`RoomFilter`] / [`RoomStats`]: listing and aggregate reads
//! - [`Actor`]: who is asking for a host-or-admin operation

mod config;
mod engine;
mod error;
mod query;
mod room;

pub use config::{RoomEngineConfig, RoomPatch, RoomSettings};
pub use engine::{LeaveOutcome, RoomEngine};
pub use error::RoomError;
pub use query::{RoomFilter, RoomStats};
pub use room::{Actor, Room, SEAT_INDEX};
