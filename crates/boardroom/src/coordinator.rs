//! `Lobby` builder and the operations that span rooms and games.
//!
//! The lobby is the entry point a request handler talks to. It ties the
//! engines together: room engine → game engine → (optionally) identity.
//! Like the engines it holds no state of its own beyond their handles.

use boardroom_game::{GameEngine, GameSession, GameStatus, NewSession, PlayerRole};
use boardroom_identity::{Credential, IdentityStore, Profile, ProfileStatus};
use boardroom_protocol::{GameId, JsonCodec, PlayerId, RoomId};
use boardroom_room::{LeaveOutcome, Room, RoomEngine, RoomError, RoomSettings};
use boardroom_store::{MemoryStore, Repository};
use chrono::{DateTime, Utc};

use crate::{LeavePolicy, LobbyConfig, LobbyError};

/// A store that can hold everything the lobby persists.
///
/// Blanket-implemented; `MemoryStore` qualifies, and so would any backend
/// that routes each record type to its own table.
pub trait LobbyStore:
    Repository<Room> + Repository<GameSession> + Repository<Credential> + Repository<Profile> + Clone
{
}

impl<S> LobbyStore for S where
    S: Repository<Room> + Repository<GameSession> + Repository<Credential> + Repository<Profile> + Clone
{
}

/// Builder for a [`Lobby`].
///
/// # Example
///
/// ```rust,no_run
/// use boardroom::prelude::*;
///
/// # fn build() -> Result<(), LobbyError> {
/// let lobby = Lobby::builder(MemoryStore::new())
///     .config(LobbyConfig::default())
///     .with_identity()
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct LobbyBuilder<S> {
    store: S,
    config: LobbyConfig,
    identity: bool,
}

impl<S: LobbyStore> LobbyBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: LobbyConfig::default(),
            identity: false,
        }
    }

    pub fn config(mut self, config: LobbyConfig) -> Self {
        self.config = config;
        self
    }

    /// Wires in the identity store so finished games update profiles.
    pub fn with_identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn build(self) -> Result<Lobby<S>, LobbyError> {
        self.config.validate()?;
        let identity = if self.identity {
            Some(IdentityStore::new(
                self.store.clone(),
                self.config.identity.clone(),
            )?)
        } else {
            None
        };
        Ok(Lobby {
            rooms: RoomEngine::new(self.store.clone(), self.config.rooms.clone())?,
            games: GameEngine::new(self.store, self.config.games.clone())?,
            identity,
            config: self.config,
        })
    }
}

impl LobbyBuilder<MemoryStore> {
    /// A builder over a fresh [`MemoryStore`] tuned by `config.store`.
    pub fn in_memory(config: LobbyConfig) -> Self {
        let store = MemoryStore::with_config(JsonCodec, config.store.clone());
        Self::new(store).config(config)
    }
}

/// Binds the room engine and the game engine.
pub struct Lobby<S> {
    rooms: RoomEngine<S>,
    games: GameEngine<S>,
    identity: Option<IdentityStore<S>>,
    config: LobbyConfig,
}

impl<S: LobbyStore> Lobby<S> {
    pub fn builder(store: S) -> LobbyBuilder<S> {
        LobbyBuilder::new(store)
    }

    pub fn rooms(&self) -> &RoomEngine<S> {
        &self.rooms
    }

    pub fn games(&self) -> &GameEngine<S> {
        &self.games
    }

    pub fn identity(&self) -> Option<&IdentityStore<S>> {
        self.identity.as_ref()
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    // -- Rooms ------------------------------------------------------------

    pub async fn create_room(&self, host: &PlayerId, settings: RoomSettings) -> Result<Room, LobbyError> {
        Ok(self.rooms.create_room(host, settings).await?)
    }

    pub async fn join_room(
        &self,
        room_id: &RoomId,
        player: &PlayerId,
        password: Option<&str>,
    ) -> Result<Room, LobbyError> {
        Ok(self.rooms.join_room(room_id, player, password).await?)
    }

    /// Unseats `player`, then applies the mid-game leave policy to the
    /// room's live session. If the room emptied and was deleted, its live
    /// session is closed so the room id can host a game again. Both steps
    /// are best-effort: the leave stands even if reconciling the session
    /// fails.
    pub async fn leave_room(&self, room_id: &RoomId, player: &PlayerId) -> Result<LeaveOutcome, LobbyError> {
        let outcome = self.rooms.leave_room(room_id, player).await?;
        if self.config.mid_game_leave == LeavePolicy::Eliminate {
            self.eliminate_leaver(room_id, player).await;
        }
        if matches!(outcome, LeaveOutcome::RoomDeleted(_)) {
            self.close_orphaned_game(room_id).await;
        }
        Ok(outcome)
    }

    /// Deletes expired rooms. See [`RoomEngine::sweep_expired`].
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        self.rooms.sweep_expired(now).await
    }

    // -- Games ------------------------------------------------------------

    /// Starts a game from the room's current players. Host only.
    ///
    /// The session is built, dealt its mode's deck, started, and written in
    /// one step; on any failure no session exists afterwards.
    ///
    /// # Errors
    /// - [`RoomError::NotAuthorized`] unless `requester` hosts the room.
    /// - [`RoomError::RoomInactive`] for an archived room.
    /// - [`GameError::NotEnoughPlayers`](boardroom_game::GameError::NotEnoughPlayers)
    ///   with fewer than two seated players.
    /// - [`GameError::LiveSessionExists`](boardroom_game::GameError::LiveSessionExists)
    ///   if a game is already running in the room.
    pub async fn start_game_from_room(&self, room_id: &RoomId, requester: &PlayerId) -> Result<GameSession, LobbyError> {
        let room = self.rooms.find_room(room_id).await?;
        if !room.is_host(requester) {
            return Err(RoomError::NotAuthorized(requester.clone(), room_id.clone()).into());
        }
        if !room.is_using {
            return Err(RoomError::RoomInactive(room_id.clone()).into());
        }

        let seed = NewSession::new(room.room_id.clone(), room.player_ids.iter().cloned())
            .max_players(room.max_players)
            .game_mode(room.game_mode.clone())
            .settings(room.game_settings.clone());
        let session = self.games.launch(seed).await?;

        self.rooms.touch(room_id).await;
        self.mark_status(session.active_player_ids.iter(), ProfileStatus::InGame)
            .await;
        tracing::info!(
            %room_id,
            game_id = %session.game_id,
            players = session.active_player_ids.len(),
            "game started from room"
        );
        Ok(session)
    }

    /// Adds `player` as an observer of the room's live game.
    pub async fn watch_game(&self, room_id: &RoomId, player: &PlayerId) -> Result<GameSession, LobbyError> {
        let live = self
            .games
            .find_live_by_room(room_id)
            .await?
            .ok_or_else(|| LobbyError::NoLiveGame(room_id.clone()))?;
        Ok(self
            .games
            .add_player(&live.game_id, player, PlayerRole::Observer)
            .await?)
    }

    /// Finishes a game and, with identity wired in, records the result on
    /// every player's profile (best-effort).
    ///
    /// The room's host may end the game. If the room no longer exists, any
    /// active player may.
    pub async fn end_game(
        &self,
        game_id: &GameId,
        requester: &PlayerId,
        winner: Option<&PlayerId>,
        reason: Option<String>,
    ) -> Result<GameSession, LobbyError> {
        let session = self.games.find_session(game_id).await?;
        let allowed = match self.rooms.find_room(&session.room_id).await {
            Ok(room) => room.is_host(requester),
            Err(RoomError::RoomNotFound(_)) => session.active_player_ids.contains(requester),
            Err(e) => return Err(e.into()),
        };
        if !allowed {
            return Err(LobbyError::NotAuthorized(requester.clone(), game_id.clone()));
        }

        let finished = self.games.finish(game_id, winner, reason).await?;
        self.record_results(&finished).await;
        Ok(finished)
    }

    // -- Internals --------------------------------------------------------

    async fn eliminate_leaver(&self, room_id: &RoomId, player: &PlayerId) {
        let live = match self.games.find_live_by_room(room_id).await {
            Ok(Some(session)) if session.status == GameStatus::Active => session,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(%room_id, %player, error = %e, "could not look up live game for leaver");
                return;
            }
        };
        if !live.active_player_ids.contains(player) {
            return;
        }
        if let Err(e) = self.games.eliminate_player(&live.game_id, player).await {
            tracing::warn!(
                %room_id,
                game_id = %live.game_id,
                %player,
                error = %e,
                "failed to eliminate player who left mid-game"
            );
        }
    }

    async fn close_orphaned_game(&self, room_id: &RoomId) {
        let live = match self.games.find_live_by_room(room_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(%room_id, error = %e, "could not look up live game of deleted room");
                return;
            }
        };
        let game_id = &live.game_id;
        let closed = match live.status {
            GameStatus::Active => self
                .games
                .finish(game_id, None, Some("room closed".into()))
                .await
                .map(Some),
            _ => self.games.delete_session(game_id).await.map(|_| None),
        };
        match closed {
            Ok(Some(finished)) => {
                tracing::info!(%room_id, %game_id, "game of deleted room finished");
                self.record_results(&finished).await;
            }
            Ok(None) => tracing::info!(%room_id, %game_id, "waiting game of deleted room removed"),
            Err(e) => {
                tracing::warn!(%room_id, %game_id, error = %e, "failed to close game of deleted room");
            }
        }
    }

    async fn record_results(&self, session: &GameSession) {
        let Some(identity) = &self.identity else {
            return;
        };
        for player in players_of(session) {
            let won = session.winner_id.as_ref() == Some(player);
            let experience = if won {
                self.config.win_experience
            } else {
                self.config.play_experience
            };
            if let Err(e) = identity.record_game_result(player, won, experience).await {
                tracing::warn!(game_id = %session.game_id, %player, error = %e, "failed to record game result");
            }
        }
        self.mark_status(players_of(session), ProfileStatus::Online).await;
    }

    async fn mark_status<'a>(&self, players: impl Iterator<Item = &'a PlayerId>, status: ProfileStatus) {
        let Some(identity) = &self.identity else {
            return;
        };
        for player in players {
            if let Err(e) = identity.set_status(player, status).await {
                tracing::warn!(%player, ?status, error = %e, "failed to update profile status");
            }
        }
    }
}

/// Everyone who played: still active or eliminated. Observers don't count.
fn players_of(session: &GameSession) -> impl Iterator<Item = &PlayerId> {
    session
        .active_player_ids
        .iter()
        .chain(session.inactive_player_ids.iter())
}
