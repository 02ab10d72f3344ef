//! Integration tests for sign-up, sign-in, and profile bookkeeping.

use std::sync::Mutex;

use boardroom_identity::{
    IdentityConfig, IdentityError, IdentityStore, ProfilePatch, ProfileStatus,
};
use boardroom_protocol::{ErrorKind, IdGenerator, PlayerId};
use boardroom_store::MemoryStore;

// =========================================================================
// Helpers
// =========================================================================

/// Argon2 costs small enough to keep the suite fast.
fn fast_config() -> IdentityConfig {
    IdentityConfig {
        hash_memory_kib: 64,
        hash_iterations: 1,
        ..IdentityConfig::default()
    }
}

fn identity() -> IdentityStore<MemoryStore> {
    IdentityStore::new(MemoryStore::new(), fast_config()).unwrap()
}

/// Hands out a fixed script of ids, then repeats the last one.
struct Scripted(Mutex<Vec<&'static str>>);

impl Scripted {
    fn new(ids: &[&'static str]) -> Self {
        let mut ids = ids.to_vec();
        ids.reverse();
        Self(Mutex::new(ids))
    }
}

impl IdGenerator for Scripted {
    fn next_id(&self) -> String {
        let mut ids = self.0.lock().unwrap();
        if ids.len() > 1 {
            ids.pop().unwrap().to_string()
        } else {
            ids[0].to_string()
        }
    }
}

// =========================================================================
// Sign-up
// =========================================================================

#[tokio::test]
async fn test_sign_up_creates_profile_with_defaults() {
    let identity = identity();
    let profile = identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(profile.uid.as_str().len(), 8);
    assert!(profile.login_id.as_str().starts_with("USER_"));
    assert_eq!(profile.gold, 1000);
    assert_eq!(profile.level, 1);
    assert_eq!(profile.status, ProfileStatus::Offline);

    let credential = identity.find_credential(&profile.login_id).await.unwrap();
    assert_ne!(credential.password_hash, "password123");
    assert!(credential.is_active);
}

#[tokio::test]
async fn test_sign_up_duplicate_username_is_conflict() {
    let identity = identity();
    identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    let err = identity
        .sign_up("ALICE", "other@example.com", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::UsernameTaken(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_sign_up_duplicate_email_is_conflict() {
    let identity = identity();
    identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    let err = identity
        .sign_up("bob", "Alice@Example.com", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::EmailTaken(_)));
}

#[tokio::test]
async fn test_sign_up_rejects_bad_input() {
    let identity = identity();
    for (username, email, password) in [
        ("al", "al@example.com", "password123"),
        ("al ice", "al@example.com", "password123"),
        ("alice", "not-an-email", "password123"),
        ("alice", "alice@example.com", "short"),
    ] {
        let err = identity.sign_up(username, email, password).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{username}/{email}");
    }
}

#[tokio::test]
async fn test_sign_up_retries_colliding_uid() {
    let identity = IdentityStore::new(MemoryStore::new(), fast_config())
        .unwrap()
        .with_id_generators(
            Scripted::new(&["USER_1", "USER_2"]),
            Scripted::new(&["AAA00001", "AAA00001", "BBB00002"]),
        );

    let first = identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();
    let second = identity
        .sign_up("bob", "bob@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(first.uid, PlayerId::from("AAA00001"));
    assert_eq!(second.uid, PlayerId::from("BBB00002"));
}

#[tokio::test]
async fn test_sign_up_exhausted_ids_rolls_back_credential() {
    let config = IdentityConfig {
        id_attempts: 3,
        ..fast_config()
    };
    let identity = IdentityStore::new(MemoryStore::new(), config)
        .unwrap()
        .with_id_generators(
            Scripted::new(&["USER_1", "USER_2"]),
            Scripted::new(&["AAA00001"]),
        );
    identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    let err = identity
        .sign_up("bob", "bob@example.com", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::IdGenerationExhausted("profile")));

    // The half-created account was rolled back.
    assert!(matches!(
        identity.login("bob", "password123").await,
        Err(IdentityError::InvalidCredentials)
    ));
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_login_by_username_or_email_returns_profile() {
    let identity = identity();
    let created = identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    let by_name = identity.login("Alice", "password123").await.unwrap();
    let by_mail = identity
        .login("alice@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(by_name.uid, created.uid);
    assert_eq!(by_mail.uid, created.uid);

    let credential = identity.find_credential(&created.login_id).await.unwrap();
    assert!(credential.last_login.is_some());
}

#[tokio::test]
async fn test_login_wrong_password_is_not_authorized() {
    let identity = identity();
    identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    let err = identity.login("alice", "password124").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredentials));
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);

    let err = identity.login("nobody", "password123").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredentials));
}

#[tokio::test]
async fn test_login_disabled_account_is_rejected() {
    let identity = identity();
    let profile = identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();
    identity
        .set_credential_active(&profile.login_id, false)
        .await
        .unwrap();

    let err = identity.login("alice", "password123").await.unwrap_err();
    assert!(matches!(err, IdentityError::AccountDisabled(_)));
}

// =========================================================================
// Profiles
// =========================================================================

#[tokio::test]
async fn test_update_profile_applies_patch() {
    let identity = identity();
    let profile = identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    let updated = identity
        .update_profile(
            &profile.uid,
            ProfilePatch {
                name_in_game: Some("Ace".into()),
                bio: Some("hello".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name_in_game, "Ace");
    assert_eq!(updated.bio, "hello");
    assert_eq!(updated.location, "");
}

#[tokio::test]
async fn test_update_profile_unknown_uid_is_not_found() {
    let err = identity()
        .update_profile(&PlayerId::from("ZZZ99999"), ProfilePatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_set_status_and_touch_last_seen() {
    let identity = identity();
    let profile = identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    let updated = identity
        .set_status(&profile.uid, ProfileStatus::InGame)
        .await
        .unwrap();
    assert_eq!(updated.status, ProfileStatus::InGame);

    identity.touch_last_seen(&profile.uid).await;
    // Unknown players are ignored.
    identity.touch_last_seen(&PlayerId::from("ZZZ99999")).await;

    let reloaded = identity.find_profile(&profile.uid).await.unwrap();
    assert!(reloaded.last_seen_at.is_some());
}

#[tokio::test]
async fn test_record_game_result_updates_totals_and_level() {
    let identity = identity();
    let profile = identity
        .sign_up("alice", "alice@example.com", "password123")
        .await
        .unwrap();

    identity
        .record_game_result(&profile.uid, true, 500)
        .await
        .unwrap();
    let updated = identity
        .record_game_result(&profile.uid, false, 400)
        .await
        .unwrap();

    assert_eq!(updated.total_games_played, 2);
    assert_eq!(updated.total_games_won, 1);
    assert_eq!(updated.experience_points, 900);
    assert_eq!(updated.level, 3);

    let by_login = identity
        .find_profile_by_login_id(&profile.login_id)
        .await
        .unwrap();
    assert_eq!(by_login, updated);
}
