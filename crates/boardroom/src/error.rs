//! Unified error type for the Boardroom lobby.

use boardroom_game::GameError;
use boardroom_identity::IdentityError;
use boardroom_protocol::{ErrorKind, GameId, PlayerId, RoomId};
use boardroom_room::RoomError;
use boardroom_store::StoreError;

/// Top-level error that wraps every layer's error.
///
/// When using the `boardroom` meta-crate you deal with this single type
/// instead of importing errors from each sub-crate. The `#[from]`
/// conversions let `?` lift sub-crate errors automatically, and
/// [`kind`](Self::kind) still reports the original cause.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// Room membership, hosting, or privacy.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Session state, turns, decks.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Accounts and profiles.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Only the room host (or, once the room is gone, an active player)
    /// may end a game.
    #[error("player {0} may not end game {1}")]
    NotAuthorized(PlayerId, GameId),

    #[error("room {0} has no live game")]
    NoLiveGame(RoomId),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LobbyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Room(e) => e.kind(),
            Self::Game(e) => e.kind(),
            Self::Identity(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::NotAuthorized(..) => ErrorKind::NotAuthorized,
            Self::NoLiveGame(_) => ErrorKind::NotFound,
            Self::Config(_) => ErrorKind::Validation,
        }
    }
}
