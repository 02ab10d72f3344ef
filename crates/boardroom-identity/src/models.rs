//! Account and profile records.
//!
//! An account is split in two rows, the way the login table and the user
//! table are split in most game backends:
//!
//! - [`Credential`]: how someone signs in (username, email, password hash).
//! - [`Profile`]: who they are in the game (public uid, display name,
//!   status, stats). The profile's `uid` is the [`PlayerId`] every other
//!   Boardroom layer uses.

use boardroom_protocol::{LoginId, PlayerId, ProtocolError};
use boardroom_store::{Record, UniqueKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// IdentityConfig
// ---------------------------------------------------------------------------

/// Tunables for [`IdentityStore`](crate::IdentityStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// How many generated ids to try before giving up on a collision streak.
    pub id_attempts: u32,
    /// Optimistic retries for profile writes.
    pub write_attempts: u32,
    pub username_min_len: usize,
    pub username_max_len: usize,
    pub password_min_len: usize,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    /// Argon2 time cost (passes).
    pub hash_iterations: u32,
    /// Gold a new profile starts with.
    pub starting_gold: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            id_attempts: 10,
            write_attempts: 8,
            username_min_len: 3,
            username_max_len: 20,
            password_min_len: 8,
            hash_memory_kib: 19 * 1024,
            hash_iterations: 2,
            starting_gold: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// A sign-in record. Usernames and emails are unique case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub login_id: LoginId,
    pub username: String,
    pub email: String,
    /// PHC-format argon2 hash. Never the password itself.
    pub password_hash: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Record for Credential {
    const KIND: &'static str = "credential";
    type Key = LoginId;

    fn key(&self) -> &LoginId {
        &self.login_id
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey::new("username", self.username.to_lowercase()),
            UniqueKey::new("email", self.email.to_lowercase()),
        ]
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.login_id.is_empty() || self.username.is_empty() {
            return Err(ProtocolError::InvalidRecord(
                "credential without login id or username".into(),
            ));
        }
        if self.password_hash.is_empty() {
            return Err(ProtocolError::InvalidRecord(format!(
                "credential {} has no password hash",
                self.login_id
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Presence shown to other players.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    #[default]
    Offline,
    Online,
    InGame,
    Busy,
}

/// The in-game identity of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub uid: PlayerId,
    pub login_id: LoginId,
    pub name_in_game: String,
    pub status: ProfileStatus,
    pub location: String,
    pub avatar_url: String,
    pub phone: String,
    pub bio: String,
    pub total_games_played: u64,
    pub total_games_won: u64,
    pub gold: u64,
    pub experience_points: u64,
    pub level: u32,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A fresh profile for a just-created credential.
    pub fn new(uid: PlayerId, login_id: LoginId, gold: u64, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            login_id,
            name_in_game: String::new(),
            status: ProfileStatus::Offline,
            location: String::new(),
            avatar_url: String::new(),
            phone: String::new(),
            bio: String::new(),
            total_games_played: 0,
            total_games_won: 0,
            gold,
            experience_points: 0,
            level: 1,
            last_seen_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the outcome of one finished game.
    pub fn record_result(&mut self, won: bool, experience: u64, now: DateTime<Utc>) {
        self.total_games_played += 1;
        if won {
            self.total_games_won += 1;
        }
        self.experience_points = self.experience_points.saturating_add(experience);
        self.level = level_for(self.experience_points);
        self.updated_at = now;
    }
}

impl Record for Profile {
    const KIND: &'static str = "profile";
    type Key = PlayerId;

    fn key(&self) -> &PlayerId {
        &self.uid
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("login_id", self.login_id.as_str())]
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.uid.is_empty() {
            return Err(ProtocolError::InvalidRecord("profile without uid".into()));
        }
        if self.level == 0 {
            return Err(ProtocolError::InvalidRecord(format!(
                "profile {} has level 0",
                self.uid
            )));
        }
        if self.total_games_won > self.total_games_played {
            return Err(ProtocolError::InvalidRecord(format!(
                "profile {} won more games than it played",
                self.uid
            )));
        }
        Ok(())
    }
}

/// `max(1, floor(sqrt(xp / 100)))`.
pub fn level_for(experience_points: u64) -> u32 {
    let level = (experience_points / 100).isqrt();
    u32::try_from(level).unwrap_or(u32::MAX).max(1)
}

// ---------------------------------------------------------------------------
// ProfilePatch
// ---------------------------------------------------------------------------

/// Editable profile fields. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePatch {
    pub name_in_game: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

impl ProfilePatch {
    const LIMITS: [(&'static str, usize); 5] = [
        ("name_in_game", 50),
        ("location", 100),
        ("avatar_url", 500),
        ("phone", 20),
        ("bio", 500),
    ];

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn fields(&self) -> [Option<&String>; 5] {
        [
            self.name_in_game.as_ref(),
            self.location.as_ref(),
            self.avatar_url.as_ref(),
            self.phone.as_ref(),
            self.bio.as_ref(),
        ]
    }

    /// Checks length limits on every supplied field.
    pub fn validate(&self) -> Result<(), String> {
        for ((name, max), value) in Self::LIMITS.iter().zip(self.fields()) {
            if let Some(value) = value {
                if value.chars().count() > *max {
                    return Err(format!("{name} must be at most {max} characters"));
                }
            }
        }
        Ok(())
    }

    pub fn apply(&self, profile: &mut Profile) {
        let targets = [
            (&self.name_in_game, &mut profile.name_in_game),
            (&self.location, &mut profile.location),
            (&self.avatar_url, &mut profile.avatar_url),
            (&self.phone, &mut profile.phone),
            (&self.bio, &mut profile.bio),
        ];
        for (patch, field) in targets {
            if let Some(value) = patch {
                field.clone_from(value);
            }
        }
    }
}
