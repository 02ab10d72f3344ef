//! The game session record and the pure rules that mutate it.
//!
//! Like the room record, every rule here works on an in-memory copy. The
//! engine loads, applies, and writes back under a version check, retrying
//! the same rule against fresh state if it loses a race.

use boardroom_protocol::{GameId, OrderedIds, PlayerId, ProtocolError, RoomId};
use boardroom_store::{Record, UniqueKey};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::modes::{DEFAULT_MODE, max_players_for};
use crate::{GameError, GameStatus, Partition, PlayerRole};

/// Index a live (unfinished) session claims on its room id.
pub const LIVE_ROOM_INDEX: &str = "live_room";

// ---------------------------------------------------------------------------
// NewSession
// ---------------------------------------------------------------------------

/// What a session is created from: a snapshot of the room at start time.
/// Nothing here stays linked to the room afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub room_id: RoomId,
    /// Seated players in join order. They become the active players, and
    /// the first one moves first.
    pub player_ids: Vec<PlayerId>,
    pub max_players: usize,
    pub game_mode: String,
    #[serde(default)]
    pub game_settings: Map<String, Value>,
}

impl NewSession {
    pub fn new(room_id: impl Into<RoomId>, player_ids: impl IntoIterator<Item = PlayerId>) -> Self {
        let player_ids: Vec<PlayerId> = player_ids.into_iter().collect();
        Self {
            room_id: room_id.into(),
            max_players: player_ids.len().max(2),
            player_ids,
            game_mode: DEFAULT_MODE.to_string(),
            game_settings: Map::new(),
        }
    }

    pub fn game_mode(mut self, mode: impl Into<String>) -> Self {
        self.game_mode = mode.into();
        self
    }

    pub fn max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn settings(mut self, settings: Map<String, Value>) -> Self {
        self.game_settings = settings;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), GameError> {
        if self.room_id.is_empty() {
            return Err(GameError::Validation("room id must not be empty".into()));
        }
        if self.game_mode.trim().is_empty() {
            return Err(GameError::Validation("game mode must not be empty".into()));
        }
        if self.max_players < 2 {
            return Err(GameError::Validation(format!(
                "max players must be at least 2, got {}",
                self.max_players
            )));
        }
        if self.player_ids.iter().any(PlayerId::is_empty) {
            return Err(GameError::Validation("player ids must not be empty".into()));
        }
        let ceiling = max_players_for(&self.game_mode);
        if self.player_ids.len() > ceiling {
            return Err(GameError::TooManyPlayers {
                game_mode: self.game_mode.clone(),
                players: self.player_ids.len(),
                ceiling,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// One round of play bound to a room.
///
/// The three player sets partition every participant: a player is in at
/// most one of them at any time. Players move from active to inactive on
/// elimination and never back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub game_id: GameId,
    pub room_id: RoomId,
    /// Draw pile. The head (index 0) is the top card.
    pub active_deck: Vec<String>,
    /// Drawn and discarded cards, oldest first.
    pub used_deck: Vec<String>,
    pub turn_cycle_clockwise: bool,
    /// Whose turn it is. May briefly name an eliminated player; the next
    /// turn advance re-syncs to the first active player.
    pub current_player_id: Option<PlayerId>,
    pub active_player_ids: OrderedIds<PlayerId>,
    pub inactive_player_ids: OrderedIds<PlayerId>,
    pub observer_player_ids: OrderedIds<PlayerId>,
    pub status: GameStatus,
    pub max_players: usize,
    pub game_mode: String,
    pub game_settings: Map<String, Value>,
    pub winner_id: Option<PlayerId>,
    pub winner_reason: Option<String>,
    pub total_turns: u64,
    pub total_cards_drawn: u64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Read-only counts and flags derived from a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub game_id: GameId,
    pub room_id: RoomId,
    pub game_mode: String,
    pub status: GameStatus,
    pub current_player_id: Option<PlayerId>,
    pub active_players: usize,
    pub inactive_players: usize,
    pub observers: usize,
    pub active_deck: usize,
    pub used_deck: usize,
    pub clockwise: bool,
    pub total_turns: u64,
    pub is_over: bool,
    /// WAITING with at least two active players.
    pub can_start: bool,
    /// WAITING with room under the mode's ceiling.
    pub can_join: bool,
}

impl GameSession {
    /// A WAITING session built from `seed`. Decks start empty.
    pub fn new(game_id: GameId, seed: &NewSession, now: DateTime<Utc>) -> Self {
        let active_player_ids: OrderedIds<PlayerId> = seed.player_ids.iter().cloned().collect();
        Self {
            game_id,
            room_id: seed.room_id.clone(),
            active_deck: Vec::new(),
            used_deck: Vec::new(),
            turn_cycle_clockwise: true,
            current_player_id: active_player_ids.first().cloned(),
            active_player_ids,
            inactive_player_ids: OrderedIds::new(),
            observer_player_ids: OrderedIds::new(),
            status: GameStatus::Waiting,
            max_players: seed.max_players,
            game_mode: seed.game_mode.clone(),
            game_settings: seed.game_settings.clone(),
            winner_id: None,
            winner_reason: None,
            total_turns: 0,
            total_cards_drawn: 0,
            created_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn partition_of(&self, player: &PlayerId) -> Option<Partition> {
        if self.active_player_ids.contains(player) {
            Some(Partition::Active)
        } else if self.inactive_player_ids.contains(player) {
            Some(Partition::Inactive)
        } else if self.observer_player_ids.contains(player) {
            Some(Partition::Observer)
        } else {
            None
        }
    }

    pub fn is_participant(&self, player: &PlayerId) -> bool {
        self.partition_of(player).is_some()
    }

    /// The most active players this session's mode allows.
    pub fn player_ceiling(&self) -> usize {
        max_players_for(&self.game_mode)
    }

    pub fn can_start(&self) -> bool {
        self.status == GameStatus::Waiting && self.active_player_ids.len() >= 2
    }

    pub fn can_join(&self) -> bool {
        self.status == GameStatus::Waiting && self.active_player_ids.len() < self.player_ceiling()
    }

    fn require_active(&self) -> Result<(), GameError> {
        if self.status != GameStatus::Active {
            return Err(GameError::SessionNotActive {
                game_id: self.game_id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    fn transition(&mut self, to: GameStatus) -> Result<(), GameError> {
        if !self.status.can_transition_to(to) {
            return Err(GameError::InvalidTransition {
                game_id: self.game_id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    // -- Lifecycle --------------------------------------------------------

    /// WAITING → ACTIVE. The first active player moves first.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), GameError> {
        if self.status == GameStatus::Waiting && self.active_player_ids.len() < 2 {
            return Err(GameError::NotEnoughPlayers {
                game_id: self.game_id.clone(),
                active: self.active_player_ids.len(),
            });
        }
        self.transition(GameStatus::Active)?;
        self.current_player_id = self.active_player_ids.first().cloned();
        self.started_at = Some(now);
        Ok(())
    }

    /// ACTIVE → FINISHED. A winner, when named, must have played (active or
    /// eliminated); observers can't win.
    pub fn finish(
        &mut self,
        winner: Option<&PlayerId>,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        if let Some(winner) = winner {
            if !matches!(
                self.partition_of(winner),
                Some(Partition::Active | Partition::Inactive)
            ) {
                return Err(GameError::WinnerNotParticipant(
                    winner.clone(),
                    self.game_id.clone(),
                ));
            }
        }
        self.transition(GameStatus::Finished)?;
        self.winner_id = winner.cloned();
        self.winner_reason = reason;
        self.finished_at = Some(now);
        Ok(())
    }

    /// Replaces the draw pile and clears the discard pile. WAITING only.
    pub fn seed_deck(&mut self, cards: Vec<String>) -> Result<(), GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::AlreadyStarted(self.game_id.clone()));
        }
        self.active_deck = cards;
        self.used_deck.clear();
        Ok(())
    }

    // -- Turns ------------------------------------------------------------

    /// Moves the turn one step in the current direction over the *current*
    /// active players. If the current player is no longer active, the turn
    /// goes to the first active player. No-op when nobody is active.
    pub fn advance_turn(&mut self) -> Result<(), GameError> {
        self.require_active()?;
        let len = self.active_player_ids.len();
        if len == 0 {
            return Ok(());
        }

        let next = match self
            .current_player_id
            .as_ref()
            .and_then(|current| self.active_player_ids.position(current))
        {
            None => 0,
            Some(i) if self.turn_cycle_clockwise => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
        };
        self.current_player_id = self.active_player_ids.get(next).cloned();
        self.total_turns += 1;
        Ok(())
    }

    pub fn set_current_player(&mut self, player: &PlayerId) -> Result<(), GameError> {
        self.require_active()?;
        if !self.active_player_ids.contains(player) {
            return Err(GameError::PlayerNotActive(
                player.clone(),
                self.game_id.clone(),
            ));
        }
        self.current_player_id = Some(player.clone());
        Ok(())
    }

    pub fn reverse_direction(&mut self) -> Result<(), GameError> {
        self.require_active()?;
        self.turn_cycle_clockwise = !self.turn_cycle_clockwise;
        Ok(())
    }

    // -- Deck -------------------------------------------------------------

    /// Takes up to `count` cards from the top of the draw pile.
    ///
    /// When the draw pile runs out, the discard pile as it stood before
    /// this call is shuffled into a new draw pile and drawing continues.
    /// Drawn cards go onto the discard pile. Returns fewer than `count`
    /// cards only when both piles together held fewer.
    pub fn draw<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Result<Vec<String>, GameError> {
        self.require_active()?;
        if count == 0 {
            return Err(GameError::Validation("draw count must be at least 1".into()));
        }

        let from_top = count.min(self.active_deck.len());
        let mut drawn: Vec<String> = self.active_deck.drain(..from_top).collect();

        if drawn.len() < count && !self.used_deck.is_empty() {
            let mut recycled = std::mem::take(&mut self.used_deck);
            recycled.shuffle(rng);
            self.active_deck = recycled;
            tracing::debug!(
                game_id = %self.game_id,
                cards = self.active_deck.len(),
                "draw pile exhausted, discards reshuffled"
            );
            let rest = (count - drawn.len()).min(self.active_deck.len());
            drawn.extend(self.active_deck.drain(..rest));
        }

        self.used_deck.extend(drawn.iter().cloned());
        self.total_cards_drawn += drawn.len() as u64;
        Ok(drawn)
    }

    // -- Membership -------------------------------------------------------

    /// Adds `player` in `role`. Returns `false` if they already hold that
    /// role.
    ///
    /// Active players can only be added while WAITING and below the mode's
    /// ceiling. Observers can be added until the session finishes, but
    /// not from among the players.
    pub fn add_player(&mut self, player: &PlayerId, role: PlayerRole) -> Result<bool, GameError> {
        if player.is_empty() {
            return Err(GameError::Validation("player id must not be empty".into()));
        }
        match role {
            PlayerRole::Active => {
                if self.status != GameStatus::Waiting {
                    return Err(GameError::CannotJoinActiveGame(self.game_id.clone()));
                }
                if self.active_player_ids.contains(player) {
                    return Ok(false);
                }
                let max = self.player_ceiling();
                if self.active_player_ids.len() >= max {
                    return Err(GameError::SessionFull {
                        game_id: self.game_id.clone(),
                        max,
                    });
                }
                self.inactive_player_ids.remove(player);
                self.observer_player_ids.remove(player);
                self.active_player_ids.insert(player.clone());
                if self.current_player_id.is_none() {
                    self.current_player_id = Some(player.clone());
                }
                Ok(true)
            }
            PlayerRole::Observer => {
                if !self.status.is_live() {
                    return Err(GameError::SessionNotActive {
                        game_id: self.game_id.clone(),
                        status: self.status,
                    });
                }
                match self.partition_of(player) {
                    Some(Partition::Observer) => Ok(false),
                    Some(_) => Err(GameError::AlreadyParticipating(
                        player.clone(),
                        self.game_id.clone(),
                    )),
                    None => {
                        self.observer_player_ids.insert(player.clone());
                        Ok(true)
                    }
                }
            }
        }
    }

    /// Moves `player` from active to inactive. Returns `false` if they
    /// weren't active.
    pub fn eliminate(&mut self, player: &PlayerId) -> Result<bool, GameError> {
        self.require_active()?;
        if !self.active_player_ids.remove(player) {
            return Ok(false);
        }
        self.inactive_player_ids.insert(player.clone());
        Ok(true)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            game_id: self.game_id.clone(),
            room_id: self.room_id.clone(),
            game_mode: self.game_mode.clone(),
            status: self.status,
            current_player_id: self.current_player_id.clone(),
            active_players: self.active_player_ids.len(),
            inactive_players: self.inactive_player_ids.len(),
            observers: self.observer_player_ids.len(),
            active_deck: self.active_deck.len(),
            used_deck: self.used_deck.len(),
            clockwise: self.turn_cycle_clockwise,
            total_turns: self.total_turns,
            is_over: self.status == GameStatus::Finished,
            can_start: self.can_start(),
            can_join: self.can_join(),
        }
    }
}

impl Record for GameSession {
    const KIND: &'static str = "game_session";
    type Key = GameId;

    fn key(&self) -> &GameId {
        &self.game_id
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        if self.status.is_live() {
            vec![UniqueKey::new(LIVE_ROOM_INDEX, self.room_id.as_str())]
        } else {
            Vec::new()
        }
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        let invalid = |why: &str| {
            Err(ProtocolError::InvalidRecord(format!(
                "game {}: {why}",
                self.game_id
            )))
        };
        if self.game_id.is_empty() || self.room_id.is_empty() {
            return invalid("empty game or room id");
        }
        let overlaps = self.active_player_ids.iter().any(|p| {
            self.inactive_player_ids.contains(p) || self.observer_player_ids.contains(p)
        }) || self
            .inactive_player_ids
            .iter()
            .any(|p| self.observer_player_ids.contains(p));
        if overlaps {
            return invalid("player sets overlap");
        }
        if self.winner_id.is_some() && self.status != GameStatus::Finished {
            return invalid("winner set before finish");
        }
        if self.status == GameStatus::Waiting && !self.inactive_player_ids.is_empty() {
            return invalid("eliminated players before start");
        }
        Ok(())
    }
}
