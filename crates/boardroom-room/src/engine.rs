//! The room engine: stateless room operations over a [`Repository`].
//!
//! Every mutation is one optimistic read-validate-write cycle against a
//! single room row. Two cross-row rules are enforced by the store rather
//! than by this code:
//!
//! - **One seat per player.** A live room claims a `seat` unique key per
//!   seated player. Two concurrent joins of the same player into different
//!   rooms can't both land; the loser sees [`RoomError::AlreadyInRoom`].
//! - **No lost joins.** Two concurrent joins of different players into the
//!   same room are serialized by the row version, so capacity is checked
//!   against the state that is actually written.

use boardroom_protocol::{IdGenerator, PlayerId, RoomId, ShortCodeGenerator};
use boardroom_store::{Listing, Page, Record, Repository, StoreError, Versioned, modify};
use chrono::{DateTime, Utc};

use crate::room::SEAT_INDEX;
use crate::{Actor, Room, RoomEngineConfig, RoomError, RoomFilter, RoomPatch, RoomSettings, RoomStats};

/// What became of a room after a player left it.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    /// Others remain. Carries the updated room (possibly with a new host).
    Left(Room),
    /// The leaver was the last player; the room no longer exists.
    RoomDeleted(RoomId),
}

/// Creates, joins, edits, and retires rooms.
///
/// Holds no room state of its own. Any number of engines (in any number of
/// processes) can share one store.
pub struct RoomEngine<S, G = ShortCodeGenerator> {
    store: S,
    ids: G,
    config: RoomEngineConfig,
}

impl<S: Repository<Room>> RoomEngine<S> {
    /// An engine that names rooms `room_` + a short code.
    ///
    /// # Errors
    /// [`RoomError::Validation`] if `config` is inconsistent.
    pub fn new(store: S, config: RoomEngineConfig) -> Result<Self, RoomError> {
        config.validate()?;
        Ok(Self {
            store,
            ids: ShortCodeGenerator::with_prefix("room_"),
            config,
        })
    }
}

impl<S: Repository<Room>, G: IdGenerator> RoomEngine<S, G> {
    /// Swaps the room id generator.
    pub fn with_id_generator<G2: IdGenerator>(self, ids: G2) -> RoomEngine<S, G2> {
        RoomEngine {
            store: self.store,
            ids,
            config: self.config,
        }
    }

    pub fn config(&self) -> &RoomEngineConfig {
        &self.config
    }

    // -- Lifecycle --------------------------------------------------------

    /// Opens a room with `host` as its only player.
    ///
    /// # Errors
    /// - [`RoomError::Validation`] for out-of-range settings.
    /// - [`RoomError::AlreadyInRoom`] if `host` is seated in a live room.
    /// - [`RoomError::DuplicateId`] if `settings.room_id` is taken.
    /// - [`RoomError::IdGenerationExhausted`] if every generated id collided.
    pub async fn create_room(&self, host: &PlayerId, settings: RoomSettings) -> Result<Room, RoomError> {
        if host.is_empty() {
            return Err(RoomError::Validation("host id must not be empty".into()));
        }
        settings.validate(&self.config)?;
        let now = Utc::now();

        if let Some(room_id) = settings.room_id.clone() {
            let room = self.build_room(room_id.clone(), host, &settings, now);
            return match self.store.create(room).await {
                Ok(created) => Ok(self.created(created.record)),
                Err(StoreError::Duplicate { index: "primary", .. }) => {
                    Err(RoomError::DuplicateId(room_id))
                }
                Err(e) => Err(seat_conflict(e.into())),
            };
        }

        for attempt in 1..=self.config.id_attempts {
            let room_id = RoomId::new(self.ids.next_id());
            let room = self.build_room(room_id, host, &settings, now);
            match self.store.create(room).await {
                Ok(created) => return Ok(self.created(created.record)),
                Err(StoreError::Duplicate { index: "primary", value, .. }) => {
                    tracing::debug!(room_id = %value, attempt, "room id collision, retrying");
                }
                Err(e) => return Err(seat_conflict(e.into())),
            }
        }
        Err(RoomError::IdGenerationExhausted(self.config.id_attempts))
    }

    /// Seats `player` in a room. Joining a room you're already in returns
    /// it unchanged.
    ///
    /// Checks run in this order: room exists, room live, already here
    /// (no-op), password, seated elsewhere, capacity.
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        player: &PlayerId,
        password: Option<&str>,
    ) -> Result<Room, RoomError> {
        let current = self.load(room_id).await?.record;
        if !current.is_using {
            return Err(RoomError::RoomInactive(room_id.clone()));
        }
        if current.is_seated(player) {
            tracing::debug!(%room_id, %player, "already in room, join is a no-op");
            return Ok(current);
        }
        if !current.password_matches(password) {
            return Err(RoomError::WrongPassword(room_id.clone()));
        }
        if let Some(elsewhere) = self.seated_room(player).await? {
            if &elsewhere.room_id == room_id {
                return Ok(elsewhere);
            }
            return Err(RoomError::AlreadyInRoom {
                player: player.clone(),
                room: Some(elsewhere.room_id),
            });
        }

        let now = Utc::now();
        let modified = modify(
            &self.store,
            room_id,
            self.config.write_attempts,
            |room: &mut Room| room.admit(player, password, now),
        )
        .await
        .map_err(seat_conflict)?
        .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        let room = modified.record.record;
        if modified.output {
            tracing::info!(%room_id, %player, players = room.player_count(), "player joined");
        }
        Ok(room)
    }

    /// Unseats `player`. The room is deleted when its last player leaves.
    pub async fn leave_room(&self, room_id: &RoomId, player: &PlayerId) -> Result<LeaveOutcome, RoomError> {
        for _ in 0..self.config.write_attempts {
            let current = self.load(room_id).await?;
            let mut next = current.record.clone();
            next.remove_player(player, Utc::now())?;

            if next.player_ids.is_empty() {
                match self.store.delete(room_id, Some(current.version)).await {
                    Ok(_) => {
                        tracing::info!(%room_id, %player, "last player left, room deleted");
                        return Ok(LeaveOutcome::RoomDeleted(room_id.clone()));
                    }
                    Err(StoreError::VersionConflict { .. }) => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            let host_changed = next.host_id != current.record.host_id;
            match self.store.update(room_id, current.version, next).await {
                Ok(Some(updated)) => {
                    let room = updated.record;
                    tracing::info!(%room_id, %player, players = room.player_count(), "player left");
                    if host_changed {
                        tracing::info!(%room_id, host = %room.host_id, "host reassigned");
                    }
                    return Ok(LeaveOutcome::Left(room));
                }
                Ok(None) => return Err(RoomError::RoomNotFound(room_id.clone())),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.contended(room_id))
    }

    /// Applies a host's edit.
    ///
    /// # Errors
    /// [`RoomError::NotAuthorized`] unless `requester` is the host;
    /// [`RoomError::CapacityBelowOccupancy`] if `max_players` would drop
    /// below the seated count.
    pub async fn update_room(
        &self,
        room_id: &RoomId,
        requester: &PlayerId,
        patch: RoomPatch,
    ) -> Result<Room, RoomError> {
        let now = Utc::now();
        let room = self
            .modify_room(room_id, |room| {
                if !room.is_host(requester) {
                    return Err(RoomError::NotAuthorized(requester.clone(), room_id.clone()));
                }
                room.apply_patch(&patch, &self.config, now)
            })
            .await?;
        tracing::debug!(%room_id, "room updated");
        Ok(room)
    }

    pub async fn transfer_host(
        &self,
        room_id: &RoomId,
        current_host: &PlayerId,
        new_host: &PlayerId,
    ) -> Result<Room, RoomError> {
        let now = Utc::now();
        let room = self
            .modify_room(room_id, |room| room.transfer_host(current_host, new_host, now))
            .await?;
        tracing::info!(%room_id, from = %current_host, to = %new_host, "host transferred");
        Ok(room)
    }

    /// Deletes a room outright. Host or admin only.
    pub async fn delete_room(&self, room_id: &RoomId, actor: &Actor) -> Result<(), RoomError> {
        for _ in 0..self.config.write_attempts {
            let current = self.load(room_id).await?;
            authorize(&current.record, actor)?;
            match self.store.delete(room_id, Some(current.version)).await {
                Ok(_) => {
                    tracing::info!(%room_id, %actor, "room deleted");
                    return Ok(());
                }
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.contended(room_id))
    }

    /// Archives (`false`) or revives (`true`) a room. Host or admin only.
    /// An archived room frees its players' seats; reviving it claims them
    /// again and fails with [`RoomError::AlreadyInRoom`] if any were taken.
    pub async fn set_active(&self, room_id: &RoomId, actor: &Actor, is_using: bool) -> Result<Room, RoomError> {
        let now = Utc::now();
        let room = self
            .modify_room(room_id, |room| {
                authorize(room, actor)?;
                if room.is_using != is_using {
                    room.is_using = is_using;
                    room.last_activity_at = now;
                }
                Ok(())
            })
            .await?;
        tracing::info!(%room_id, %actor, is_using, "room activity changed");
        Ok(room)
    }

    /// Deletes every room whose `expires_at` is before `now` and returns how
    /// many went. Failures are logged and skipped; running it concurrently
    /// with itself or with normal traffic is safe.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired = match self
            .store
            .list(|room: &Room| room.is_expired(now), Page::all())
            .await
        {
            Ok(listing) => listing.items,
            Err(e) => {
                tracing::warn!(error = %e, "expiry sweep could not list rooms");
                return 0;
            }
        };

        let mut deleted = 0;
        for room in expired {
            match self.delete_if_expired(&room.room_id, now).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(room_id = %room.room_id, error = %e, "failed to delete expired room");
                }
            }
        }
        if deleted > 0 {
            tracing::info!(deleted, "expired rooms swept");
        }
        deleted
    }

    /// Stamps `last_activity_at`. Failures are logged and swallowed.
    pub async fn touch(&self, room_id: &RoomId) {
        let now = Utc::now();
        let result = self
            .modify_room(room_id, |room| {
                room.last_activity_at = now;
                Ok(())
            })
            .await;
        if let Err(e) = result {
            tracing::warn!(%room_id, error = %e, "failed to update last activity");
        }
    }

    // -- Queries ----------------------------------------------------------

    pub async fn find_room(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        self.load(room_id).await.map(Versioned::into_record)
    }

    /// Filtered rooms, most recently active first.
    pub async fn list_rooms(&self, filter: &RoomFilter, page: Page) -> Result<Listing<Room>, RoomError> {
        let rooms = self.rooms_where(|room| filter.matches(room)).await?;
        let total = rooms.len();
        let items = rooms
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .collect();
        Ok(Listing { items, total, page })
    }

    /// Rooms hosted by `host`, live or archived.
    pub async fn rooms_by_host(&self, host: &PlayerId) -> Result<Vec<Room>, RoomError> {
        self.rooms_where(|room| room.is_host(host)).await
    }

    /// Rooms listing `player` among their players, live or archived.
    pub async fn rooms_by_player(&self, player: &PlayerId) -> Result<Vec<Room>, RoomError> {
        self.rooms_where(|room| room.is_seated(player)).await
    }

    /// Live rooms with a free seat. With `max_players`, only rooms holding
    /// fewer than that many players.
    pub async fn available_rooms(&self, max_players: Option<usize>) -> Result<Vec<Room>, RoomError> {
        self.rooms_where(|room| {
            room.is_using && room.player_count() < max_players.unwrap_or(room.max_players).min(room.max_players)
        })
        .await
    }

    pub async fn player_count(&self, room_id: &RoomId) -> Result<usize, RoomError> {
        Ok(self.find_room(room_id).await?.player_count())
    }

    /// The live room `player` is seated in, if any.
    pub async fn seated_room(&self, player: &PlayerId) -> Result<Option<Room>, RoomError> {
        Ok(self
            .store
            .find_by_unique_key(SEAT_INDEX, player.as_str())
            .await?
            .map(Versioned::into_record))
    }

    /// `true` if `password` opens the room. Public rooms always open.
    pub async fn check_password(&self, room_id: &RoomId, password: Option<&str>) -> Result<bool, RoomError> {
        Ok(self.find_room(room_id).await?.password_matches(password))
    }

    pub async fn room_stats(&self) -> Result<RoomStats, RoomError> {
        let all = self.store.list(|_: &Room| true, Page::all()).await?;
        Ok(RoomStats::from_rooms(&all.items))
    }

    // -- Internals --------------------------------------------------------

    fn build_room(&self, room_id: RoomId, host: &PlayerId, settings: &RoomSettings, now: DateTime<Utc>) -> Room {
        Room {
            room_id,
            room_name: settings.room_name.clone().unwrap_or_default(),
            description: settings.description.clone().unwrap_or_default(),
            host_id: host.clone(),
            player_ids: std::iter::once(host.clone()).collect(),
            max_players: settings.max_players.unwrap_or(self.config.default_max_players),
            is_private: settings.is_private,
            password: settings.password.clone().filter(|p| !p.is_empty()),
            is_using: true,
            game_mode: settings
                .game_mode
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.config.default_game_mode.clone()),
            game_settings: settings.game_settings.clone(),
            expires_at: settings.expires_at,
            created_at: now,
            last_activity_at: now,
        }
    }

    fn created(&self, room: Room) -> Room {
        tracing::info!(
            room_id = %room.room_id,
            host = %room.host_id,
            max_players = room.max_players,
            game_mode = %room.game_mode,
            "room created"
        );
        room
    }

    async fn load(&self, room_id: &RoomId) -> Result<Versioned<Room>, RoomError> {
        self.store
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))
    }

    async fn modify_room(
        &self,
        room_id: &RoomId,
        change: impl FnMut(&mut Room) -> Result<(), RoomError>,
    ) -> Result<Room, RoomError> {
        modify::<Room, _, _, _, _>(&self.store, room_id, self.config.write_attempts, change)
            .await
            .map_err(seat_conflict)?
            .map(|m| m.record.record)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))
    }

    async fn rooms_where(&self, keep: impl Fn(&Room) -> bool + Send + Sync) -> Result<Vec<Room>, RoomError> {
        let mut rooms = self.store.list(keep, Page::all()).await?.items;
        rooms.sort_by(|a, b| {
            b.last_activity_at
                .cmp(&a.last_activity_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(rooms)
    }

    async fn delete_if_expired(&self, room_id: &RoomId, now: DateTime<Utc>) -> Result<bool, RoomError> {
        let Some(current) = self.store.find_by_id(room_id).await? else {
            return Ok(false);
        };
        if !current.record.is_expired(now) {
            return Ok(false);
        }
        match self.store.delete(room_id, Some(current.version)).await {
            Ok(deleted) => {
                if deleted {
                    tracing::debug!(%room_id, "expired room deleted");
                }
                Ok(deleted)
            }
            // Touched since we read it; the next sweep will look again.
            Err(StoreError::VersionConflict { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn contended(&self, room_id: &RoomId) -> RoomError {
        StoreError::Contended {
            kind: Room::KIND,
            key: room_id.to_string(),
            attempts: self.config.write_attempts,
        }
        .into()
    }
}

fn authorize(room: &Room, actor: &Actor) -> Result<(), RoomError> {
    if room.authorizes(actor) {
        return Ok(());
    }
    match actor {
        Actor::Player(id) => Err(RoomError::NotAuthorized(id.clone(), room.room_id.clone())),
        Actor::Admin => Ok(()),
    }
}

/// Turns a store-level seat collision into the room-level error.
fn seat_conflict(err: RoomError) -> RoomError {
    match err {
        RoomError::Store(StoreError::Duplicate {
            index: SEAT_INDEX,
            value,
            ..
        }) => RoomError::AlreadyInRoom {
            player: PlayerId::new(value),
            room: None,
        },
        other => other,
    }
}
