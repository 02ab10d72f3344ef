//! The game engine: stateless session operations over a [`Repository`].
//!
//! Each operation loads one session, applies one of the pure rules on
//! [`GameSession`], and writes it back under a version check. One live
//! session per room is enforced by the store's `live_room` index.

use boardroom_protocol::{GameId, IdGenerator, PlayerId, RoomId, ShortCodeGenerator};
use boardroom_store::{Listing, Page, Repository, StoreError, Versioned, modify};
use chrono::Utc;

use crate::session::LIVE_ROOM_INDEX;
use crate::{
    GameEngineConfig, GameError, GameSession, NewSession, PlayerRole, SessionFilter,
    SessionSummary, deck,
};

/// Cards handed out by [`GameEngine::draw_cards`] and the session after
/// the draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub cards: Vec<String>,
    pub session: GameSession,
}

/// Creates and drives game sessions.
///
/// Holds no session state; any number of engines can share one store.
pub struct GameEngine<S, G = ShortCodeGenerator> {
    store: S,
    ids: G,
    config: GameEngineConfig,
}

impl<S: Repository<GameSession>> GameEngine<S> {
    /// An engine that names sessions `game_` + a short code.
    pub fn new(store: S, config: GameEngineConfig) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            store,
            ids: ShortCodeGenerator::with_prefix("game_"),
            config,
        })
    }
}

impl<S: Repository<GameSession>, G: IdGenerator> GameEngine<S, G> {
    pub fn with_id_generator<G2: IdGenerator>(self, ids: G2) -> GameEngine<S, G2> {
        GameEngine {
            store: self.store,
            ids,
            config: self.config,
        }
    }

    pub fn config(&self) -> &GameEngineConfig {
        &self.config
    }

    // -- Lifecycle --------------------------------------------------------

    /// Persists a WAITING session seeded from a room snapshot. Decks start
    /// empty.
    ///
    /// # Errors
    /// [`GameError::LiveSessionExists`] if the room already has an
    /// unfinished session.
    pub async fn create_session(&self, seed: NewSession) -> Result<GameSession, GameError> {
        seed.validate()?;
        let session = self.insert(GameSession::new(GameId::new(""), &seed, Utc::now())).await?;
        tracing::info!(
            game_id = %session.game_id,
            room_id = %session.room_id,
            players = session.active_player_ids.len(),
            "game session created"
        );
        Ok(session)
    }

    /// Builds a session, deals it a shuffled deck for its mode, starts it,
    /// and persists it in a single write. Either the started session
    /// exists afterwards or nothing does.
    pub async fn launch(&self, seed: NewSession) -> Result<GameSession, GameError> {
        seed.validate()?;
        let now = Utc::now();
        let mut session = GameSession::new(GameId::new(""), &seed, now);
        session.seed_deck(deck::shuffled_for_mode(&seed.game_mode, &mut rand::rng()))?;
        session.start(now)?;

        let session = self.insert(session).await?;
        tracing::info!(
            game_id = %session.game_id,
            room_id = %session.room_id,
            players = session.active_player_ids.len(),
            deck = session.active_deck.len(),
            "game session launched"
        );
        Ok(session)
    }

    /// WAITING → ACTIVE.
    pub async fn start(&self, game_id: &GameId) -> Result<GameSession, GameError> {
        let now = Utc::now();
        let (session, ()) = self.modify_session(game_id, |s| s.start(now)).await?;
        tracing::info!(%game_id, first = ?session.current_player_id, "game started");
        Ok(session)
    }

    /// ACTIVE → FINISHED, recording the winner if given.
    pub async fn finish(
        &self,
        game_id: &GameId,
        winner: Option<&PlayerId>,
        reason: Option<String>,
    ) -> Result<GameSession, GameError> {
        let now = Utc::now();
        let (session, ()) = self
            .modify_session(game_id, |s| s.finish(winner, reason.clone(), now))
            .await?;
        tracing::info!(%game_id, winner = ?session.winner_id, turns = session.total_turns, "game finished");
        Ok(session)
    }

    /// Replaces the draw pile of a WAITING session.
    pub async fn seed_deck(&self, game_id: &GameId, cards: Vec<String>) -> Result<GameSession, GameError> {
        let (session, ()) = self
            .modify_session(game_id, |s| s.seed_deck(cards.clone()))
            .await?;
        tracing::debug!(%game_id, cards = session.active_deck.len(), "deck seeded");
        Ok(session)
    }

    // -- Play -------------------------------------------------------------

    pub async fn advance_turn(&self, game_id: &GameId) -> Result<GameSession, GameError> {
        let (session, ()) = self.modify_session(game_id, GameSession::advance_turn).await?;
        tracing::debug!(%game_id, current = ?session.current_player_id, "turn advanced");
        Ok(session)
    }

    pub async fn set_current_player(&self, game_id: &GameId, player: &PlayerId) -> Result<GameSession, GameError> {
        let (session, ()) = self
            .modify_session(game_id, |s| s.set_current_player(player))
            .await?;
        tracing::debug!(%game_id, %player, "current player set");
        Ok(session)
    }

    pub async fn reverse_direction(&self, game_id: &GameId) -> Result<GameSession, GameError> {
        let (session, ()) = self
            .modify_session(game_id, GameSession::reverse_direction)
            .await?;
        tracing::debug!(%game_id, clockwise = session.turn_cycle_clockwise, "turn direction reversed");
        Ok(session)
    }

    /// Draws up to `count` cards, reshuffling the discard pile into the
    /// draw pile if it runs out.
    pub async fn draw_cards(&self, game_id: &GameId, count: usize) -> Result<Draw, GameError> {
        let (session, cards) = self
            .modify_session(game_id, |s| s.draw(count, &mut rand::rng()))
            .await?;
        tracing::debug!(%game_id, requested = count, drawn = cards.len(), "cards drawn");
        Ok(Draw { cards, session })
    }

    pub async fn add_player(
        &self,
        game_id: &GameId,
        player: &PlayerId,
        role: PlayerRole,
    ) -> Result<GameSession, GameError> {
        let (session, added) = self
            .modify_session(game_id, |s| s.add_player(player, role))
            .await?;
        if added {
            tracing::info!(%game_id, %player, ?role, "player added to game");
        }
        Ok(session)
    }

    /// Moves `player` from active to inactive. No-op if they weren't active.
    pub async fn eliminate_player(&self, game_id: &GameId, player: &PlayerId) -> Result<GameSession, GameError> {
        let (session, eliminated) = self
            .modify_session(game_id, |s| s.eliminate(player))
            .await?;
        if eliminated {
            tracing::info!(
                %game_id,
                %player,
                remaining = session.active_player_ids.len(),
                "player eliminated"
            );
        }
        Ok(session)
    }

    // -- Queries ----------------------------------------------------------

    pub async fn find_session(&self, game_id: &GameId) -> Result<GameSession, GameError> {
        self.load(game_id).await.map(Versioned::into_record)
    }

    /// The room's unfinished session, if it has one.
    pub async fn find_live_by_room(&self, room_id: &RoomId) -> Result<Option<GameSession>, GameError> {
        Ok(self
            .store
            .find_by_unique_key(LIVE_ROOM_INDEX, room_id.as_str())
            .await?
            .map(Versioned::into_record))
    }

    /// Filtered sessions, newest first.
    pub async fn list_sessions(&self, filter: &SessionFilter, page: Page) -> Result<Listing<GameSession>, GameError> {
        let mut sessions = self
            .store
            .list(|s: &GameSession| filter.matches(s), Page::all())
            .await?
            .items;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = sessions.len();
        let items = sessions
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .collect();
        Ok(Listing { items, total, page })
    }

    pub async fn summary(&self, game_id: &GameId) -> Result<SessionSummary, GameError> {
        Ok(self.find_session(game_id).await?.summary())
    }

    /// `true` if `player` is active, eliminated, or watching. A missing
    /// session has no participants.
    pub async fn is_participant(&self, game_id: &GameId, player: &PlayerId) -> Result<bool, GameError> {
        Ok(self
            .store
            .find_by_id(game_id)
            .await?
            .is_some_and(|v| v.record.is_participant(player)))
    }

    /// Removes a session record. Returns `false` if it didn't exist.
    pub async fn delete_session(&self, game_id: &GameId) -> Result<bool, GameError> {
        let deleted = self.store.delete(game_id, None).await?;
        if deleted {
            tracing::info!(%game_id, "game session deleted");
        }
        Ok(deleted)
    }

    // -- Internals --------------------------------------------------------

    /// Writes a new session under a fresh generated id.
    async fn insert(&self, mut session: GameSession) -> Result<GameSession, GameError> {
        for attempt in 1..=self.config.id_attempts {
            session.game_id = GameId::new(self.ids.next_id());
            match self.store.create(session.clone()).await {
                Ok(created) => return Ok(created.record),
                Err(StoreError::Duplicate { index: "primary", value, .. }) => {
                    tracing::debug!(game_id = %value, attempt, "game id collision, retrying");
                }
                Err(StoreError::Duplicate {
                    index: LIVE_ROOM_INDEX,
                    ..
                }) => return Err(GameError::LiveSessionExists(session.room_id)),
                Err(e) => return Err(e.into()),
            }
        }
        Err(GameError::IdGenerationExhausted(self.config.id_attempts))
    }

    async fn load(&self, game_id: &GameId) -> Result<Versioned<GameSession>, GameError> {
        self.store
            .find_by_id(game_id)
            .await?
            .ok_or_else(|| GameError::SessionNotFound(game_id.clone()))
    }

    async fn modify_session<T>(
        &self,
        game_id: &GameId,
        change: impl FnMut(&mut GameSession) -> Result<T, GameError>,
    ) -> Result<(GameSession, T), GameError> {
        modify::<GameSession, _, _, _, _>(&self.store, game_id, self.config.write_attempts, change)
            .await?
            .map(|m| (m.record.record, m.output))
            .ok_or_else(|| GameError::SessionNotFound(game_id.clone()))
    }
}
