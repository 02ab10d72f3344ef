//! Read-side shapes: listing filters and aggregate stats.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Room;

/// Criteria for [`RoomEngine::list_rooms`](crate::RoomEngine::list_rooms).
/// All set criteria must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomFilter {
    /// Include archived rooms. Off by default.
    pub include_inactive: bool,
    pub game_mode: Option<String>,
    pub is_private: Option<bool>,
    /// Rooms whose capacity is at least this.
    pub min_capacity: Option<usize>,
    /// Rooms whose capacity is at most this.
    pub max_capacity: Option<usize>,
    /// Case-insensitive substring of the name or description.
    pub search: Option<String>,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        if !self.include_inactive && !room.is_using {
            return false;
        }
        if self
            .game_mode
            .as_ref()
            .is_some_and(|mode| !mode.eq_ignore_ascii_case(&room.game_mode))
        {
            return false;
        }
        if self.is_private.is_some_and(|p| p != room.is_private) {
            return false;
        }
        if self.min_capacity.is_some_and(|min| room.max_players < min) {
            return false;
        }
        if self.max_capacity.is_some_and(|max| room.max_players > max) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            if !room.room_name.to_lowercase().contains(&term)
                && !room.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        true
    }
}

/// Aggregate counts over every stored room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomStats {
    pub total: usize,
    pub active: usize,
    pub private: usize,
    pub by_game_mode: BTreeMap<String, usize>,
    /// Mean seated players across active rooms, to two decimals.
    pub average_players: f64,
}

impl RoomStats {
    pub fn from_rooms<'a>(rooms: impl IntoIterator<Item = &'a Room>) -> Self {
        let mut stats = Self::default();
        let mut seated = 0usize;

        for room in rooms {
            stats.total += 1;
            if room.is_private {
                stats.private += 1;
            }
            if room.is_using {
                stats.active += 1;
                seated += room.player_count();
            }
            *stats.by_game_mode.entry(room.game_mode.clone()).or_default() += 1;
        }

        if stats.active > 0 {
            let mean = seated as f64 / stats.active as f64;
            stats.average_players = (mean * 100.0).round() / 100.0;
        }
        stats
    }
}
