//! Game engine configuration and listing filters.

use boardroom_protocol::RoomId;
use serde::{Deserialize, Serialize};

use crate::{GameError, GameSession, GameStatus};

/// Tunables for the [`GameEngine`](crate::GameEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameEngineConfig {
    /// Generated game ids tried before giving up.
    pub id_attempts: u32,
    /// Lost optimistic-write races tolerated per operation.
    pub write_attempts: u32,
}

impl Default for GameEngineConfig {
    fn default() -> Self {
        Self {
            id_attempts: 10,
            write_attempts: 8,
        }
    }
}

impl GameEngineConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.id_attempts == 0 || self.write_attempts == 0 {
            return Err(GameError::Validation(
                "id_attempts and write_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Criteria for [`GameEngine::list_sessions`](crate::GameEngine::list_sessions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFilter {
    pub status: Option<GameStatus>,
    /// Case-insensitive.
    pub game_mode: Option<String>,
    pub room_id: Option<RoomId>,
    pub min_active_players: Option<usize>,
}

impl SessionFilter {
    pub fn matches(&self, session: &GameSession) -> bool {
        self.status.is_none_or(|s| s == session.status)
            && self
                .game_mode
                .as_ref()
                .is_none_or(|m| m.eq_ignore_ascii_case(&session.game_mode))
            && self.room_id.as_ref().is_none_or(|r| *r == session.room_id)
            && self
                .min_active_players
                .is_none_or(|min| session.active_player_ids.len() >= min)
    }
}
