//! Error types for the room layer.

use boardroom_protocol::{ErrorKind, PlayerId, RoomId};
use boardroom_store::StoreError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never did, or was deleted).
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The room is archived (`is_using == false`) and can't be joined.
    #[error("room {0} is not in use")]
    RoomInactive(RoomId),

    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("wrong password for room {0}")]
    WrongPassword(RoomId),

    /// The player is already seated in a live room. `room` is that room,
    /// when known.
    #[error("player {player} is already seated in a room")]
    AlreadyInRoom {
        player: PlayerId,
        room: Option<RoomId>,
    },

    #[error("player {0} is not in room {1}")]
    PlayerNotInRoom(PlayerId, RoomId),

    /// The requester lacks the host (or admin) role the operation needs.
    #[error("player {0} may not modify room {1}")]
    NotAuthorized(PlayerId, RoomId),

    /// A host transfer named someone other than the current host.
    #[error("player {0} is not the host of room {1}")]
    NotHost(PlayerId, RoomId),

    /// A caller-requested room id is already in use.
    #[error("room id {0} is already taken")]
    DuplicateId(RoomId),

    /// Every generated room id collided.
    #[error("no free room id after {0} attempts")]
    IdGenerationExhausted(u32),

    #[error("validation failed: {0}")]
    Validation(String),

    /// `max_players` can't drop below the number of seated players.
    #[error("max players {requested} is below current occupancy {occupancy}")]
    CapacityBelowOccupancy { requested: usize, occupancy: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoomNotFound(_) | Self::PlayerNotInRoom(..) => ErrorKind::NotFound,
            Self::RoomInactive(_) => ErrorKind::InvalidStateTransition,
            Self::RoomFull(_)
            | Self::AlreadyInRoom { .. }
            | Self::DuplicateId(_)
            | Self::IdGenerationExhausted(_) => ErrorKind::Conflict,
            Self::WrongPassword(_) | Self::NotAuthorized(..) | Self::NotHost(..) => {
                ErrorKind::NotAuthorized
            }
            Self::Validation(_) | Self::CapacityBelowOccupancy { .. } => ErrorKind::Validation,
            Self::Store(e) => e.kind(),
        }
    }
}
