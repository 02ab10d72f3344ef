//! Engine configuration and the inputs for creating and editing rooms.

use boardroom_protocol::RoomId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RoomError;

// ---------------------------------------------------------------------------
// RoomEngineConfig
// ---------------------------------------------------------------------------

/// Tunables for [`RoomEngine`](crate::RoomEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomEngineConfig {
    /// Generated room ids to try before failing with
    /// [`RoomError::IdGenerationExhausted`].
    pub id_attempts: u32,
    /// Optimistic retries per mutation before the store reports contention.
    pub write_attempts: u32,
    /// Capacity used when a room is created without `max_players`.
    pub default_max_players: usize,
    pub min_max_players: usize,
    pub max_max_players: usize,
    pub default_game_mode: String,
    pub max_name_len: usize,
    pub max_password_len: usize,
    pub max_game_mode_len: usize,
}

impl Default for RoomEngineConfig {
    fn default() -> Self {
        Self {
            id_attempts: 10,
            write_attempts: 8,
            default_max_players: 4,
            min_max_players: 2,
            max_max_players: 20,
            default_game_mode: "default".into(),
            max_name_len: 100,
            max_password_len: 100,
            max_game_mode_len: 50,
        }
    }
}

impl RoomEngineConfig {
    /// Checks the config is self-consistent.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.min_max_players < 2 {
            return Err(RoomError::Validation(
                "min_max_players must be at least 2".into(),
            ));
        }
        if !(self.min_max_players..=self.max_max_players).contains(&self.default_max_players) {
            return Err(RoomError::Validation(format!(
                "default_max_players {} is outside [{}, {}]",
                self.default_max_players, self.min_max_players, self.max_max_players
            )));
        }
        if self.id_attempts == 0 || self.write_attempts == 0 {
            return Err(RoomError::Validation(
                "attempt counts must be positive".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_max_players(&self, max_players: usize) -> Result<(), RoomError> {
        if max_players < self.min_max_players || max_players > self.max_max_players {
            return Err(RoomError::Validation(format!(
                "max_players must be between {} and {}",
                self.min_max_players, self.max_max_players
            )));
        }
        Ok(())
    }

    pub(crate) fn check_len(&self, field: &str, value: &str, max: usize) -> Result<(), RoomError> {
        if value.chars().count() > max {
            return Err(RoomError::Validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RoomSettings
// ---------------------------------------------------------------------------

/// Everything a host may choose when opening a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    /// Ask for a specific id instead of a generated one.
    pub room_id: Option<RoomId>,
    pub room_name: Option<String>,
    pub description: Option<String>,
    pub max_players: Option<usize>,
    pub is_private: bool,
    pub password: Option<String>,
    pub game_mode: Option<String>,
    pub game_settings: Map<String, Value>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl RoomSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_players(mut self, max_players: usize) -> Self {
        self.max_players = Some(max_players);
        self
    }

    pub fn private(mut self, password: impl Into<String>) -> Self {
        self.is_private = true;
        self.password = Some(password.into());
        self
    }

    pub fn game_mode(mut self, mode: impl Into<String>) -> Self {
        self.game_mode = Some(mode.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.room_name = Some(name.into());
        self
    }

    pub fn with_id(mut self, room_id: impl Into<RoomId>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub(crate) fn validate(&self, config: &RoomEngineConfig) -> Result<(), RoomError> {
        if let Some(id) = &self.room_id {
            if id.as_str().trim().is_empty() {
                return Err(RoomError::Validation("room_id must not be empty".into()));
            }
        }
        if let Some(max) = self.max_players {
            config.check_max_players(max)?;
        }
        if let Some(name) = &self.room_name {
            config.check_len("room_name", name, config.max_name_len)?;
        }
        if let Some(mode) = &self.game_mode {
            config.check_len("game_mode", mode, config.max_game_mode_len)?;
        }
        if let Some(password) = &self.password {
            config.check_len("password", password, config.max_password_len)?;
        }
        if self.is_private && self.password.as_deref().is_none_or(str::is_empty) {
            return Err(RoomError::Validation(
                "a private room needs a password".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RoomPatch
// ---------------------------------------------------------------------------

/// A host's edit to an existing room. `None` leaves a field untouched.
///
/// Making a room public (`is_private: Some(false)`) also clears its password.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    pub room_name: Option<String>,
    pub description: Option<String>,
    pub max_players: Option<usize>,
    pub is_private: Option<bool>,
    pub password: Option<String>,
    pub game_mode: Option<String>,
    pub game_settings: Option<Map<String, Value>>,
    /// `Some(None)` removes the expiry.
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl RoomPatch {
    pub(crate) fn validate(&self, config: &RoomEngineConfig) -> Result<(), RoomError> {
        if let Some(max) = self.max_players {
            config.check_max_players(max)?;
        }
        if let Some(name) = &self.room_name {
            config.check_len("room_name", name, config.max_name_len)?;
        }
        if let Some(mode) = &self.game_mode {
            config.check_len("game_mode", mode, config.max_game_mode_len)?;
            if mode.trim().is_empty() {
                return Err(RoomError::Validation("game_mode must not be empty".into()));
            }
        }
        if let Some(password) = &self.password {
            config.check_len("password", password, config.max_password_len)?;
        }
        Ok(())
    }
}
