//! Game sessions for Boardroom.
//!
//! A session is one round of play started from a room: a draw pile and a
//! discard pile, a turn order over the active players, and the three
//! disjoint player sets (active, eliminated, watching).
//!
//! # Key types
//!
//! - [`GameEngine`]: creates, starts, drives, and finishes sessions
//! - [`GameSession`]: the persisted record and its pure rules
//! - [`GameStatus`]: `Waiting → Active → Finished`
//! - [`NewSession`]: the room snapshot a session is built from
//! - [`deck`]: stateless deck generators keyed by game mode

mod config;
pub mod deck;
mod engine;
mod error;
mod modes;
mod session;
mod state;

pub use config::{GameEngineConfig, SessionFilter};
pub use engine::{Draw, GameEngine};
pub use error::GameError;
pub use modes::{DEFAULT_MODE, max_players_for};
pub use session::{GameSession, LIVE_ROOM_INDEX, NewSession, SessionSummary};
pub use state::{GameStatus, Partition, PlayerRole};
