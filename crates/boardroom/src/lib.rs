//! # Boardroom
//!
//! A board-game lobby: player accounts, rooms to gather in, and turn-based
//! game sessions started from those rooms.
//!
//! The engines are stateless services over a repository store. Everything
//! that must survive between calls (who sits where, whose turn it is, what
//! is left in the deck) lives in the store, and every mutation is an
//! optimistic read-validate-write against one record. Any number of lobby
//! instances can share one store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boardroom::prelude::*;
//!
//! # async fn demo() -> Result<(), LobbyError> {
//! let lobby = Lobby::builder(MemoryStore::new()).build()?;
//!
//! let host = PlayerId::from("alice");
//! let room = lobby.create_room(&host, RoomSettings::new().game_mode("uno")).await?;
//! lobby.join_room(&room.room_id, &PlayerId::from("bob"), None).await?;
//!
//! let game = lobby.start_game_from_room(&room.room_id, &host).await?;
//! let game = lobby.games().advance_turn(&game.game_id).await?;
//! assert_eq!(game.current_player_id, Some(PlayerId::from("bob")));
//! # Ok(())
//! # }
//! ```

mod config;
mod coordinator;
mod error;
pub mod telemetry;

pub use config::{LeavePolicy, LobbyConfig};
pub use coordinator::{Lobby, LobbyBuilder, LobbyStore};
pub use error::LobbyError;

/// Convenient re-exports for lobby users.
///
/// ```rust
/// use boardroom::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{LeavePolicy, Lobby, LobbyBuilder, LobbyConfig, LobbyError, LobbyStore};

    pub use boardroom_protocol::{ErrorKind, GameId, LoginId, PlayerId, RoomId};

    pub use boardroom_store::{Listing, MemoryStore, Page, Repository, StoreConfig, StoreError};

    pub use boardroom_room::{
        Actor, LeaveOutcome, Room, RoomEngine, RoomError, RoomFilter, RoomPatch, RoomSettings,
        RoomStats,
    };

    pub use boardroom_game::{
        Draw, GameEngine, GameError, GameSession, GameStatus, NewSession, PlayerRole,
        SessionFilter, SessionSummary,
    };

    pub use boardroom_identity::{
        Authenticator, IdentityError, IdentityStore, Profile, ProfilePatch, ProfileStatus,
        TokenIssuer, TokenPair,
    };
}
