//! Session status machine and participant roles.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a game session.
///
/// Transitions are strictly ordered and never reverse:
///
/// ```text
/// Waiting → Active → Finished
/// ```
///
/// - **Waiting**: created from a room, players may still be added.
/// - **Active**: turns, draws, and eliminations happen here.
/// - **Finished**: terminal. The record stays readable for history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Waiting,
    Active,
    Finished,
}

impl GameStatus {
    /// Returns `Some(next)` for the one valid forward transition.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Active),
            Self::Active => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// `true` until the session finishes. A room has at most one live
    /// session.
    pub fn is_live(self) -> bool {
        !matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// The role a player is added to a session with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Active,
    Observer,
}

/// Which of the three disjoint participant sets a player is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Active,
    /// Eliminated. Nobody leaves this set.
    Inactive,
    Observer,
}
