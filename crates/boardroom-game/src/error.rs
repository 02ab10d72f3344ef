//! Error types for the game session layer.

use boardroom_protocol::{ErrorKind, GameId, PlayerId, RoomId};
use boardroom_store::StoreError;

use crate::GameStatus;

/// Errors that can occur during game session operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("game {0} not found")]
    SessionNotFound(GameId),

    /// The operation needs an ACTIVE session.
    #[error("game {game_id} is {status}, not active")]
    SessionNotActive { game_id: GameId, status: GameStatus },

    /// A status change the state machine doesn't allow.
    #[error("game {game_id} cannot go from {from} to {to}")]
    InvalidTransition {
        game_id: GameId,
        from: GameStatus,
        to: GameStatus,
    },

    /// Setup-only operation on a session that has left WAITING.
    #[error("game {0} has already started")]
    AlreadyStarted(GameId),

    #[error("game {game_id} needs at least 2 active players, has {active}")]
    NotEnoughPlayers { game_id: GameId, active: usize },

    /// The mode's active-player ceiling is reached.
    #[error("game {game_id} is full (max {max} players)")]
    SessionFull { game_id: GameId, max: usize },

    /// More seated players than the game mode allows at one table.
    #[error("{players} players exceed the {game_mode} limit of {ceiling}")]
    TooManyPlayers {
        game_mode: String,
        players: usize,
        ceiling: usize,
    },

    /// Active players can only be added while the session is waiting.
    #[error("cannot join game {0} as a player once it has started")]
    CannotJoinActiveGame(GameId),

    #[error("player {0} is not an active player in game {1}")]
    PlayerNotActive(PlayerId, GameId),

    /// Already playing or eliminated, so can't become an observer.
    #[error("player {0} already takes part in game {1}")]
    AlreadyParticipating(PlayerId, GameId),

    #[error("winner {0} is not a player in game {1}")]
    WinnerNotParticipant(PlayerId, GameId),

    /// The room already has a session that hasn't finished.
    #[error("room {0} already has a live game")]
    LiveSessionExists(RoomId),

    #[error("no free game id after {0} attempts")]
    IdGenerationExhausted(u32),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionNotFound(_) => ErrorKind::NotFound,
            Self::SessionNotActive { .. }
            | Self::InvalidTransition { .. }
            | Self::AlreadyStarted(_)
            | Self::NotEnoughPlayers { .. }
            | Self::TooManyPlayers { .. }
            | Self::CannotJoinActiveGame(_) => ErrorKind::InvalidStateTransition,
            Self::SessionFull { .. }
            | Self::AlreadyParticipating(..)
            | Self::LiveSessionExists(_)
            | Self::IdGenerationExhausted(_) => ErrorKind::Conflict,
            Self::PlayerNotActive(..) | Self::WinnerNotParticipant(..) | Self::Validation(_) => {
                ErrorKind::Validation
            }
            Self::Store(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_state_errors_to_invalid_transition() {
        let err = GameError::SessionNotActive {
            game_id: GameId::from("g1"),
            status: GameStatus::Waiting,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(err.to_string(), "game g1 is waiting, not active");
    }

    #[test]
    fn test_kind_passes_store_errors_through() {
        let err = GameError::from(StoreError::Unavailable);
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.kind().is_retryable());
    }
}
