//! Opaque access/refresh token pairs.
//!
//! Each signed-in player holds at most one grant: an access token for
//! ordinary calls and a longer-lived refresh token to get a new pair
//! without signing in again. Refreshing rotates BOTH tokens, so a leaked
//! refresh token stops working the moment its owner refreshes.
//!
//! ```text
//! issue() ──→ [access valid] ──(access TTL)──→ [refreshable]
//!                  │                                 │
//!                  └──────────refresh()──────────────┤
//!                                                    ▼ (refresh TTL)
//!                                             expire_stale()
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use boardroom_protocol::PlayerId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{Authenticator, IdentityError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Access-token lifetime. Default: 15 minutes.
    pub access_ttl_secs: u64,
    /// Refresh-token lifetime. Default: 7 days.
    pub refresh_ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// What a client receives after signing in or refreshing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub player_id: PlayerId,
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token stops authenticating.
    pub expires_in: u64,
}

// ---------------------------------------------------------------------------
// TokenIssuer
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Grant {
    access_token: String,
    access_expires: Instant,
    refresh_token: String,
    refresh_expires: Instant,
}

#[derive(Debug, Default)]
struct Grants {
    by_player: HashMap<PlayerId, Grant>,
    /// access token → owner. Kept in sync with `by_player`.
    access: HashMap<String, PlayerId>,
    /// refresh token → owner. Kept in sync with `by_player`.
    refresh: HashMap<String, PlayerId>,
}

impl Grants {
    fn remove(&mut self, player_id: &PlayerId) -> Option<Grant> {
        let grant = self.by_player.remove(player_id)?;
        self.access.remove(&grant.access_token);
        self.refresh.remove(&grant.refresh_token);
        Some(grant)
    }
}

/// Issues and validates token pairs in memory.
///
/// Shared behind an `Arc`; the internal mutex is never held across an
/// await point.
#[derive(Debug)]
pub struct TokenIssuer {
    grants: Mutex<Grants>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            grants: Mutex::new(Grants::default()),
            access_ttl: Duration::from_secs(config.access_ttl_secs),
            refresh_ttl: Duration::from_secs(config.refresh_ttl_secs),
        }
    }

    /// Issues a fresh pair for `player_id`, replacing any grant it held.
    pub async fn issue(&self, player_id: PlayerId) -> TokenPair {
        let mut grants = self.grants.lock().await;
        grants.remove(&player_id);
        let pair = self.grant(&mut grants, player_id);
        tracing::info!(player_id = %pair.player_id, "tokens issued");
        pair
    }

    /// Exchanges a refresh token for a new pair. The old pair stops working.
    ///
    /// # Errors
    /// - [`IdentityError::InvalidToken`] if the token is unknown or already
    ///   rotated.
    /// - [`IdentityError::TokenExpired`] if it outlived its TTL. The grant
    ///   is dropped.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, IdentityError> {
        let mut grants = self.grants.lock().await;
        let player_id = grants
            .refresh
            .get(refresh_token)
            .cloned()
            .ok_or(IdentityError::InvalidToken)?;

        let expired = grants
            .by_player
            .get(&player_id)
            .is_none_or(|g| Instant::now() >= g.refresh_expires);
        grants.remove(&player_id);
        if expired {
            return Err(IdentityError::TokenExpired);
        }

        let pair = self.grant(&mut grants, player_id);
        tracing::debug!(player_id = %pair.player_id, "tokens rotated");
        Ok(pair)
    }

    /// Drops the grant for `player_id`. Returns `false` if there was none.
    pub async fn revoke(&self, player_id: &PlayerId) -> bool {
        let revoked = self.grants.lock().await.remove(player_id).is_some();
        if revoked {
            tracing::info!(%player_id, "tokens revoked");
        }
        revoked
    }

    /// Drops every grant whose refresh token has expired and returns the
    /// affected players. Call periodically.
    pub async fn expire_stale(&self) -> Vec<PlayerId> {
        let mut grants = self.grants.lock().await;
        let now = Instant::now();
        let stale: Vec<PlayerId> = grants
            .by_player
            .iter()
            .filter(|(_, g)| now >= g.refresh_expires)
            .map(|(id, _)| id.clone())
            .collect();

        for player_id in &stale {
            grants.remove(player_id);
            tracing::info!(%player_id, "grant expired");
        }
        stale
    }

    /// Number of live grants.
    pub async fn len(&self) -> usize {
        self.grants.lock().await.by_player.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn grant(&self, grants: &mut Grants, player_id: PlayerId) -> TokenPair {
        let now = Instant::now();
        let grant = Grant {
            access_token: generate_token(),
            access_expires: now + self.access_ttl,
            refresh_token: generate_token(),
            refresh_expires: now + self.refresh_ttl,
        };
        let pair = TokenPair {
            player_id: player_id.clone(),
            access_token: grant.access_token.clone(),
            refresh_token: grant.refresh_token.clone(),
            expires_in: self.access_ttl.as_secs(),
        };

        grants
            .access
            .insert(grant.access_token.clone(), player_id.clone());
        grants
            .refresh
            .insert(grant.refresh_token.clone(), player_id.clone());
        grants.by_player.insert(player_id, grant);
        pair
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new(TokenConfig::default())
    }
}

impl Authenticator for TokenIssuer {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, IdentityError> {
        let grants = self.grants.lock().await;
        let player_id = grants
            .access
            .get(token)
            .ok_or(IdentityError::InvalidToken)?;
        let grant = grants
            .by_player
            .get(player_id)
            .ok_or(IdentityError::InvalidToken)?;

        if Instant::now() >= grant.access_expires {
            return Err(IdentityError::TokenExpired);
        }
        Ok(player_id.clone())
    }
}

/// 128 random bits as 32 lowercase hex characters.
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Time-dependent behaviour is tested with TTLs of 0 (expired at once)
    //! and 3600 (never expires during a test), never with sleeps.

    use super::*;

    fn issuer(access_ttl_secs: u64, refresh_ttl_secs: u64) -> TokenIssuer {
        TokenIssuer::new(TokenConfig {
            access_ttl_secs,
            refresh_ttl_secs,
        })
    }

    fn alice() -> PlayerId {
        PlayerId::from("ALI00001")
    }

    #[tokio::test]
    async fn test_authenticate_fresh_access_token_returns_player() {
        let issuer = issuer(3600, 3600);
        let pair = issuer.issue(alice()).await;

        assert_eq!(pair.access_token.len(), 32);
        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(issuer.authenticate(&pair.access_token).await.unwrap(), alice());
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token_is_invalid() {
        let issuer = issuer(3600, 3600);
        let err = issuer.authenticate("nope").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken));
    }

    #[tokio::test]
    async fn test_authenticate_expired_access_token_is_expired() {
        let issuer = issuer(0, 3600);
        let pair = issuer.issue(alice()).await;
        let err = issuer.authenticate(&pair.access_token).await.unwrap_err();
        assert!(matches!(err, IdentityError::TokenExpired));
    }

    #[tokio::test]
    async fn test_refresh_rotates_both_tokens() {
        let issuer = issuer(3600, 3600);
        let first = issuer.issue(alice()).await;
        let second = issuer.refresh(&first.refresh_token).await.unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert!(issuer.authenticate(&first.access_token).await.is_err());
        assert!(matches!(
            issuer.refresh(&first.refresh_token).await,
            Err(IdentityError::InvalidToken)
        ));
        assert_eq!(issuer.authenticate(&second.access_token).await.unwrap(), alice());
    }

    #[tokio::test]
    async fn test_refresh_expired_token_drops_grant() {
        let issuer = issuer(0, 0);
        let pair = issuer.issue(alice()).await;
        let err = issuer.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, IdentityError::TokenExpired));
        assert!(issuer.is_empty().await);
    }

    #[tokio::test]
    async fn test_issue_twice_invalidates_previous_pair() {
        let issuer = issuer(3600, 3600);
        let first = issuer.issue(alice()).await;
        let _second = issuer.issue(alice()).await;
        assert!(issuer.authenticate(&first.access_token).await.is_err());
        assert_eq!(issuer.len().await, 1);
    }

    #[tokio::test]
    async fn test_revoke_removes_grant() {
        let issuer = issuer(3600, 3600);
        let pair = issuer.issue(alice()).await;
        assert!(issuer.revoke(&alice()).await);
        assert!(!issuer.revoke(&alice()).await);
        assert!(issuer.authenticate(&pair.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_expire_stale_only_drops_expired_grants() {
        let short = issuer(0, 0);
        short.issue(alice()).await;
        assert_eq!(short.expire_stale().await, vec![alice()]);
        assert!(short.is_empty().await);

        let long = issuer(3600, 3600);
        long.issue(alice()).await;
        assert!(long.expire_stale().await.is_empty());
    }
}
