//! The room record and the pure rules that mutate it.
//!
//! Every method here works on an in-memory `Room` and touches nothing else.
//! The engine loads a room, calls one of these, and writes the result back
//! with a version check; if it loses a race it reloads and calls the same
//! method again. Keeping the rules pure is what makes that retry safe.

use boardroom_protocol::{OrderedIds, PlayerId, ProtocolError, RoomId};
use boardroom_store::{Record, UniqueKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{RoomEngineConfig, RoomError, RoomPatch};

/// Index a live room claims for each seated player. One seat per player
/// across all live rooms.
pub const SEAT_INDEX: &str = "seat";

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Who is asking for a host-or-admin operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Player(PlayerId),
    /// Operator or system maintenance. Passes every host check.
    Admin,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player(id) => write!(f, "{id}"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A pre-game lobby.
///
/// Invariants (checked by [`Record::validate`] on every load):
/// - `player_ids` is non-empty and no longer than `max_players`;
/// - `host_id` is one of `player_ids`;
/// - a private room carries a non-empty password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: RoomId,
    pub room_name: String,
    pub description: String,
    pub host_id: PlayerId,
    /// Seated players in join order.
    pub player_ids: OrderedIds<PlayerId>,
    pub max_players: usize,
    pub is_private: bool,
    pub password: Option<String>,
    /// `false` once archived. An archived room holds no seats.
    pub is_using: bool,
    pub game_mode: String,
    pub game_settings: Map<String, Value>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Room {
    pub fn player_count(&self) -> usize {
        self.player_ids.len()
    }

    pub fn is_full(&self) -> bool {
        self.player_ids.len() >= self.max_players
    }

    pub fn is_seated(&self, player: &PlayerId) -> bool {
        self.player_ids.contains(player)
    }

    pub fn is_host(&self, player: &PlayerId) -> bool {
        &self.host_id == player
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    /// Public rooms accept any password, including none.
    pub fn password_matches(&self, given: Option<&str>) -> bool {
        if !self.is_private {
            return true;
        }
        matches!((self.password.as_deref(), given), (Some(expected), Some(given)) if expected == given)
    }

    /// `true` if `actor` may run host-only operations.
    pub fn authorizes(&self, actor: &Actor) -> bool {
        match actor {
            Actor::Admin => true,
            Actor::Player(id) => self.is_host(id),
        }
    }

    /// Seats `player`. Returns `false` (and changes nothing) if they're
    /// already here.
    ///
    /// Seats held in *other* rooms aren't visible from here; the store's
    /// seat index rejects those at write time.
    pub fn admit(
        &mut self,
        player: &PlayerId,
        password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, RoomError> {
        if !self.is_using {
            return Err(RoomError::RoomInactive(self.room_id.clone()));
        }
        if self.is_seated(player) {
            return Ok(false);
        }
        if !self.password_matches(password) {
            return Err(RoomError::WrongPassword(self.room_id.clone()));
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.room_id.clone()));
        }
        self.player_ids.insert(player.clone());
        self.last_activity_at = now;
        Ok(true)
    }

    /// Unseats `player`. If they were host and anyone remains, the earliest
    /// remaining joiner becomes host. Callers delete the room when this
    /// leaves it empty.
    pub fn remove_player(&mut self, player: &PlayerId, now: DateTime<Utc>) -> Result<(), RoomError> {
        if !self.player_ids.remove(player) {
            return Err(RoomError::PlayerNotInRoom(
                player.clone(),
                self.room_id.clone(),
            ));
        }
        if self.is_host(player) {
            if let Some(next) = self.player_ids.first() {
                self.host_id = next.clone();
            }
        }
        self.last_activity_at = now;
        Ok(())
    }

    pub fn transfer_host(
        &mut self,
        current: &PlayerId,
        new_host: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<(), RoomError> {
        if !self.is_host(current) {
            return Err(RoomError::NotHost(current.clone(), self.room_id.clone()));
        }
        if !self.is_seated(new_host) {
            return Err(RoomError::PlayerNotInRoom(
                new_host.clone(),
                self.room_id.clone(),
            ));
        }
        if current != new_host {
            self.host_id = new_host.clone();
            self.last_activity_at = now;
        }
        Ok(())
    }

    /// Applies a host's patch after re-checking the invariants it could
    /// break. Nothing changes if any check fails.
    pub fn apply_patch(
        &mut self,
        patch: &RoomPatch,
        config: &RoomEngineConfig,
        now: DateTime<Utc>,
    ) -> Result<(), RoomError> {
        patch.validate(config)?;

        let mut next = self.clone();
        if let Some(max) = patch.max_players {
            if max < next.player_count() {
                return Err(RoomError::CapacityBelowOccupancy {
                    requested: max,
                    occupancy: next.player_count(),
                });
            }
            next.max_players = max;
        }
        if let Some(name) = &patch.room_name {
            next.room_name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            next.description.clone_from(description);
        }
        if let Some(mode) = &patch.game_mode {
            next.game_mode.clone_from(mode);
        }
        if let Some(settings) = &patch.game_settings {
            next.game_settings.clone_from(settings);
        }
        if let Some(expires_at) = patch.expires_at {
            next.expires_at = expires_at;
        }
        if let Some(password) = &patch.password {
            next.password = Some(password.clone());
        }
        if let Some(is_private) = patch.is_private {
            next.is_private = is_private;
            if !is_private {
                next.password = None;
            }
        }
        if next.is_private && next.password.as_deref().is_none_or(str::is_empty) {
            return Err(RoomError::Validation(
                "a private room needs a password".into(),
            ));
        }

        if next != *self {
            next.last_activity_at = now;
            *self = next;
        }
        Ok(())
    }
}

impl Record for Room {
    const KIND: &'static str = "room";
    type Key = RoomId;

    fn key(&self) -> &RoomId {
        &self.room_id
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        if !self.is_using {
            return Vec::new();
        }
        self.player_ids
            .iter()
            .map(|p| UniqueKey::new(SEAT_INDEX, p.as_str()))
            .collect()
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        let invalid = |why: &str| {
            Err(ProtocolError::InvalidRecord(format!(
                "room {}: {why}",
                self.room_id
            )))
        };
        if self.room_id.is_empty() {
            return invalid("empty room id");
        }
        if self.max_players < 2 {
            return invalid("max_players below 2");
        }
        if self.player_ids.is_empty() {
            return invalid("no players");
        }
        if self.player_ids.len() > self.max_players {
            return invalid("more players than max_players");
        }
        if !self.player_ids.contains(&self.host_id) {
            return invalid("host is not seated");
        }
        if self.is_private && self.password.as_deref().is_none_or(str::is_empty) {
            return invalid("private room without password");
        }
        Ok(())
    }
}
