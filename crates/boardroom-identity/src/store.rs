//! Account and profile operations over a repository.

use std::sync::Arc;

use boardroom_protocol::{IdGenerator, LoginId, PlayerId, ShortCodeGenerator};
use boardroom_store::{Repository, StoreError, Versioned, modify};
use chrono::Utc;

use crate::{
    Credential, IdentityConfig, IdentityError, PasswordHashing, Profile, ProfilePatch,
    ProfileStatus,
};

/// Sign-up, sign-in, and profile bookkeeping.
///
/// `S` is any store that can hold both halves of an account. With the
/// in-memory store that's a single `MemoryStore`; with a SQL backend it
/// would be a handle that routes each record type to its table.
pub struct IdentityStore<S> {
    store: S,
    config: IdentityConfig,
    hashing: PasswordHashing,
    login_ids: Arc<dyn IdGenerator>,
    uids: Arc<dyn IdGenerator>,
}

impl<S> IdentityStore<S>
where
    S: Repository<Credential> + Repository<Profile>,
{
    /// # Errors
    /// [`IdentityError::Hashing`] if the configured argon2 costs are invalid.
    pub fn new(store: S, config: IdentityConfig) -> Result<Self, IdentityError> {
        let hashing = PasswordHashing::new(config.hash_memory_kib, config.hash_iterations)?;
        Ok(Self {
            store,
            config,
            hashing,
            login_ids: Arc::new(ShortCodeGenerator::with_prefix("USER_")),
            uids: Arc::new(ShortCodeGenerator::new()),
        })
    }

    /// Replaces the generators for login ids and profile uids.
    pub fn with_id_generators(
        mut self,
        login_ids: impl IdGenerator,
        uids: impl IdGenerator,
    ) -> Self {
        self.login_ids = Arc::new(login_ids);
        self.uids = Arc::new(uids);
        self
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    // -- Accounts ---------------------------------------------------------

    /// Creates a credential and its profile. Returns the new profile.
    ///
    /// # Errors
    /// - [`IdentityError::Validation`] for a malformed username, email, or
    ///   a too-short password.
    /// - [`IdentityError::UsernameTaken`] / [`IdentityError::EmailTaken`].
    /// - [`IdentityError::IdGenerationExhausted`] after
    ///   `config.id_attempts` colliding ids.
    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Profile, IdentityError> {
        let username = username.trim();
        let email = email.trim();
        self.validate_username(username)?;
        validate_email(email)?;
        if password.chars().count() < self.config.password_min_len {
            return Err(IdentityError::Validation(format!(
                "password must be at least {} characters",
                self.config.password_min_len
            )));
        }

        let password_hash = self.hashing.hash(password)?;
        let now = Utc::now();
        let credential = self
            .create_credential(|login_id| Credential {
                login_id,
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.clone(),
                is_active: true,
                last_login: None,
                created_at: now,
            })
            .await?;

        let login_id = credential.login_id.clone();
        let profile = match self.create_profile(&login_id).await {
            Ok(profile) => profile,
            Err(e) => {
                // Don't leave a credential that can never sign in.
                if let Err(cleanup) =
                    Repository::<Credential>::delete(&self.store, &login_id, None).await
                {
                    tracing::warn!(%login_id, error = %cleanup, "failed to roll back credential");
                }
                return Err(e);
            }
        };

        tracing::info!(uid = %profile.uid, %login_id, %username, "account created");
        Ok(profile)
    }

    /// Verifies a username-or-email and password, stamps `last_login`, and
    /// returns the profile.
    ///
    /// # Errors
    /// - [`IdentityError::InvalidCredentials`] for an unknown account or a
    ///   wrong password.
    /// - [`IdentityError::AccountDisabled`] if the credential is inactive.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Profile, IdentityError> {
        let identifier = identifier.trim().to_lowercase();
        let index = if identifier.contains('@') { "email" } else { "username" };

        let credential: Option<Versioned<Credential>> =
            Repository::<Credential>::find_by_unique_key(&self.store, index, &identifier).await?;
        let Some(credential) = credential else {
            return Err(IdentityError::InvalidCredentials);
        };
        if !self
            .hashing
            .verify(password, &credential.record.password_hash)
        {
            tracing::debug!(login_id = %credential.record.login_id, "wrong password");
            return Err(IdentityError::InvalidCredentials);
        }
        if !credential.record.is_active {
            return Err(IdentityError::AccountDisabled(
                credential.record.login_id.to_string(),
            ));
        }

        let login_id = credential.record.login_id;
        let now = Utc::now();
        modify(
            &self.store,
            &login_id,
            self.config.write_attempts,
            |c: &mut Credential| {
                c.last_login = Some(now);
                Ok::<_, IdentityError>(())
            },
        )
        .await?;

        let profile = self.find_profile_by_login_id(&login_id).await?;
        tracing::info!(uid = %profile.uid, %login_id, "login succeeded");
        Ok(profile)
    }

    /// Enables or disables sign-in for a credential.
    pub async fn set_credential_active(
        &self,
        login_id: &LoginId,
        active: bool,
    ) -> Result<Credential, IdentityError> {
        let modified = modify(
            &self.store,
            login_id,
            self.config.write_attempts,
            |c: &mut Credential| {
                c.is_active = active;
                Ok::<_, IdentityError>(())
            },
        )
        .await?
        .ok_or_else(|| IdentityError::UserNotFound(login_id.to_string()))?;
        tracing::info!(%login_id, active, "credential activity changed");
        Ok(modified.record.record)
    }

    pub async fn find_credential(&self, login_id: &LoginId) -> Result<Credential, IdentityError> {
        Repository::<Credential>::find_by_id(&self.store, login_id)
            .await?
            .map(Versioned::into_record)
            .ok_or_else(|| IdentityError::UserNotFound(login_id.to_string()))
    }

    // -- Profiles ---------------------------------------------------------

    pub async fn find_profile(&self, uid: &PlayerId) -> Result<Profile, IdentityError> {
        Repository::<Profile>::find_by_id(&self.store, uid)
            .await?
            .map(Versioned::into_record)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }

    pub async fn find_profile_by_login_id(
        &self,
        login_id: &LoginId,
    ) -> Result<Profile, IdentityError> {
        Repository::<Profile>::find_by_unique_key(&self.store, "login_id", login_id.as_str())
            .await?
            .map(Versioned::into_record)
            .ok_or_else(|| IdentityError::UserNotFound(login_id.to_string()))
    }

    /// Applies a partial edit of the public profile fields.
    pub async fn update_profile(
        &self,
        uid: &PlayerId,
        patch: ProfilePatch,
    ) -> Result<Profile, IdentityError> {
        patch.validate().map_err(IdentityError::Validation)?;
        let now = Utc::now();
        self.modify_profile(uid, |p| {
            let before = p.clone();
            patch.apply(p);
            if *p != before {
                p.updated_at = now;
            }
        })
        .await
    }

    pub async fn set_status(
        &self,
        uid: &PlayerId,
        status: ProfileStatus,
    ) -> Result<Profile, IdentityError> {
        let now = Utc::now();
        let profile = self
            .modify_profile(uid, |p| {
                if p.status != status {
                    p.status = status;
                    p.updated_at = now;
                }
            })
            .await?;
        tracing::debug!(%uid, ?status, "status changed");
        Ok(profile)
    }

    /// Stamps `last_seen_at`. Failures are logged and swallowed.
    pub async fn touch_last_seen(&self, uid: &PlayerId) {
        let now = Utc::now();
        if let Err(e) = self.modify_profile(uid, |p| p.last_seen_at = Some(now)).await {
            tracing::warn!(%uid, error = %e, "failed to record last seen");
        }
    }

    /// Counts one finished game for `uid` and adds `experience` XP.
    pub async fn record_game_result(
        &self,
        uid: &PlayerId,
        won: bool,
        experience: u64,
    ) -> Result<Profile, IdentityError> {
        let now = Utc::now();
        let profile = self
            .modify_profile(uid, |p| p.record_result(won, experience, now))
            .await?;
        tracing::info!(
            %uid,
            won,
            level = profile.level,
            games = profile.total_games_played,
            "game result recorded"
        );
        Ok(profile)
    }

    // -- Internals --------------------------------------------------------

    async fn modify_profile(
        &self,
        uid: &PlayerId,
        mut change: impl FnMut(&mut Profile),
    ) -> Result<Profile, IdentityError> {
        modify(
            &self.store,
            uid,
            self.config.write_attempts,
            |p: &mut Profile| {
                change(p);
                Ok::<_, IdentityError>(())
            },
        )
        .await?
        .map(|m| m.record.record)
        .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }

    async fn create_credential(
        &self,
        build: impl Fn(LoginId) -> Credential,
    ) -> Result<Credential, IdentityError> {
        for _ in 0..self.config.id_attempts {
            let candidate = build(LoginId::new(self.login_ids.next_id()));
            match Repository::<Credential>::create(&self.store, candidate).await {
                Ok(created) => return Ok(created.record),
                Err(StoreError::Duplicate { index: "primary", value, .. }) => {
                    tracing::debug!(login_id = %value, "login id collision, retrying");
                }
                Err(StoreError::Duplicate { index: "username", value, .. }) => {
                    return Err(IdentityError::UsernameTaken(value));
                }
                Err(StoreError::Duplicate { index: "email", value, .. }) => {
                    return Err(IdentityError::EmailTaken(value));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(IdentityError::IdGenerationExhausted("login"))
    }

    async fn create_profile(&self, login_id: &LoginId) -> Result<Profile, IdentityError> {
        let now = Utc::now();
        for _ in 0..self.config.id_attempts {
            let candidate = Profile::new(
                PlayerId::new(self.uids.next_id()),
                login_id.clone(),
                self.config.starting_gold,
                now,
            );
            match Repository::<Profile>::create(&self.store, candidate).await {
                Ok(created) => return Ok(created.record),
                Err(StoreError::Duplicate { index: "primary", value, .. }) => {
                    tracing::debug!(uid = %value, "uid collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(IdentityError::IdGenerationExhausted("profile"))
    }

    fn validate_username(&self, username: &str) -> Result<(), IdentityError> {
        let len = username.chars().count();
        let (min, max) = (self.config.username_min_len, self.config.username_max_len);
        if len < min || len > max {
            return Err(IdentityError::Validation(format!(
                "username must be {min}-{max} characters"
            )));
        }
        if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(IdentityError::Validation(
                "username can only contain letters, numbers, and underscores".into(),
            ));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), IdentityError> {
    let invalid = || IdentityError::Validation(format!("'{email}' is not a valid email"));
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(())
}
