//! Lobby-wide configuration.

use boardroom_game::GameEngineConfig;
use boardroom_identity::{IdentityConfig, TokenConfig};
use boardroom_room::RoomEngineConfig;
use boardroom_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::LobbyError;

/// What happens to a player's game when they leave its room mid-round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavePolicy {
    /// Eliminate them from the room's ACTIVE session.
    #[default]
    Eliminate,
    /// Leave the session alone; the room and the session drift apart.
    Ignore,
}

/// Every tunable in one place. Any section left out of a config file keeps
/// its defaults.
///
/// ```
/// use boardroom::{LeavePolicy, LobbyConfig};
///
/// let config = LobbyConfig::from_json_str(r#"{
///     "rooms": { "default_max_players": 6 },
///     "mid_game_leave": "ignore"
/// }"#).unwrap();
/// assert_eq!(config.rooms.default_max_players, 6);
/// assert_eq!(config.mid_game_leave, LeavePolicy::Ignore);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Tunes the store [`LobbyBuilder::in_memory`](crate::LobbyBuilder::in_memory) creates.
    pub store: StoreConfig,
    pub rooms: RoomEngineConfig,
    pub games: GameEngineConfig,
    pub identity: IdentityConfig,
    pub tokens: TokenConfig,
    pub mid_game_leave: LeavePolicy,
    /// XP the winner of a game earns.
    pub win_experience: u64,
    /// XP every other player of a finished game earns.
    pub play_experience: u64,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            rooms: RoomEngineConfig::default(),
            games: GameEngineConfig::default(),
            identity: IdentityConfig::default(),
            tokens: TokenConfig::default(),
            mid_game_leave: LeavePolicy::default(),
            win_experience: 100,
            play_experience: 25,
        }
    }
}

impl LobbyConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, LobbyError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LobbyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LobbyError> {
        self.rooms.validate()?;
        self.games.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lobby_config_default() {
        let config = LobbyConfig::default();
        assert_eq!(config.mid_game_leave, LeavePolicy::Eliminate);
        assert_eq!(config.rooms.default_max_players, 4);
        assert_eq!(config.games.write_attempts, 8);
        assert_eq!(config.tokens.access_ttl_secs, 900);
        assert_eq!(config.store.acquire_timeout_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_str_empty_object_is_default() {
        let config = LobbyConfig::from_json_str("{}").unwrap();
        assert_eq!(config.win_experience, 100);
        assert_eq!(config.rooms.id_attempts, 10);
    }

    #[test]
    fn test_from_json_str_malformed_is_config_error() {
        let err = LobbyConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, LobbyError::Config(_)));
    }

    #[test]
    fn test_from_json_str_inconsistent_rooms_rejected() {
        let err = LobbyConfig::from_json_str(r#"{"rooms": {"write_attempts": 0}}"#).unwrap_err();
        assert!(matches!(err, LobbyError::Room(_)));
    }
}
