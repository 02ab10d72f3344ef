//! Integration tests for the room engine against the in-memory store.

use std::sync::{Arc, Mutex};

use boardroom_protocol::{ErrorKind, IdGenerator, PlayerId, RoomId};
use boardroom_room::{
    Actor, LeaveOutcome, RoomEngine, RoomEngineConfig, RoomError, RoomFilter, RoomPatch,
    RoomSettings,
};
use boardroom_store::{MemoryStore, Page};
use chrono::{Duration, Utc};

// =========================================================================
// Helpers
// =========================================================================

fn engine() -> RoomEngine<MemoryStore> {
    RoomEngine::new(MemoryStore::new(), RoomEngineConfig::default()).unwrap()
}

fn p(id: &str) -> PlayerId {
    PlayerId::from(id)
}

/// Always proposes the same ids, in order, then repeats the last.
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
// Creation
// =========================================================================

#[tokio::test]
async fn test_create_room_seats_host_with_defaults() {
    let rooms = engine();
    let room = rooms.create_room(&p("hostA"), RoomSettings::new()).await.unwrap();

    assert!(room.room_id.as_str().starts_with("room_"));
    assert_eq!(room.host_id, p("hostA"));
    assert_eq!(room.player_ids.as_slice(), &[p("hostA")]);
    assert_eq!(room.max_players, 4);
    assert_eq!(room.game_mode, "default");
    assert!(room.is_using);
}

#[tokio::test]
async fn test_create_room_host_already_seated_fails() {
    let rooms = engine();
    let first = rooms.create_room(&p("hostA"), RoomSettings::new()).await.unwrap();

    let err = rooms
        .create_room(&p("hostA"), RoomSettings::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(rooms.rooms_by_host(&p("hostA")).await.unwrap(), vec![first]);
}

#[tokio::test]
async fn test_create_room_requested_id_collision_is_duplicate() {
    let rooms = engine();
    rooms
        .create_room(&p("A"), RoomSettings::new().with_id("lobby"))
        .await
        .unwrap();

    let err = rooms
        .create_room(&p("B"), RoomSettings::new().with_id("lobby"))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::DuplicateId(_)));
}

#[tokio::test]
async fn test_create_room_retries_generated_collisions() {
    let rooms = engine().with_id_generator(Scripted::new(&["R1", "R1", "R1", "R2"]));
    rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();

    let second = rooms.create_room(&p("B"), RoomSettings::new()).await.unwrap();
    assert_eq!(second.room_id, RoomId::from("R2"));
}

#[tokio::test]
async fn test_create_room_exhausted_ids_fails() {
    let rooms = engine().with_id_generator(Scripted::new(&["R1"]));
    rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();

    let err = rooms
        .create_room(&p("B"), RoomSettings::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::IdGenerationExhausted(10)));
}

#[tokio::test]
async fn test_create_room_invalid_capacity_is_validation() {
    let err = engine()
        .create_room(&p("A"), RoomSettings::new().max_players(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_full_room_scenario() {
    let rooms = engine();
    let room = rooms
        .create_room(&p("hostA"), RoomSettings::new().max_players(2))
        .await
        .unwrap();

    let room = rooms.join_room(&room.room_id, &p("playerB"), None).await.unwrap();
    assert_eq!(room.player_count(), 2);

    let err = rooms
        .join_room(&room.room_id, &p("playerC"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::RoomFull(_)));
}

#[tokio::test]
async fn test_join_private_room_scenario() {
    let rooms = engine();
    let room = rooms
        .create_room(&p("hostA"), RoomSettings::new().private("secret123"))
        .await
        .unwrap();

    let err = rooms
        .join_room(&room.room_id, &p("B"), Some("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::WrongPassword(_)));
    assert!(matches!(
        rooms.join_room(&room.room_id, &p("B"), None).await,
        Err(RoomError::WrongPassword(_))
    ));

    let room = rooms
        .join_room(&room.room_id, &p("B"), Some("secret123"))
        .await
        .unwrap();
    assert!(room.is_seated(&p("B")));
    assert!(rooms.check_password(&room.room_id, Some("secret123")).await.unwrap());
}

#[tokio::test]
async fn test_join_twice_is_idempotent() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    let first = rooms.join_room(&room.room_id, &p("B"), None).await.unwrap();
    let second = rooms.join_room(&room.room_id, &p("B"), None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.player_ids.as_slice(), &[p("A"), p("B")]);
}

#[tokio::test]
async fn test_join_missing_room_is_not_found() {
    let err = engine()
        .join_room(&RoomId::from("nope"), &p("B"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::RoomNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_join_while_seated_elsewhere_fails() {
    let rooms = engine();
    let one = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    let two = rooms.create_room(&p("B"), RoomSettings::new()).await.unwrap();

    let err = rooms.join_room(&two.room_id, &p("A"), None).await.unwrap_err();
    match err {
        RoomError::AlreadyInRoom { player, room } => {
            assert_eq!(player, p("A"));
            assert_eq!(room, Some(one.room_id));
        }
        other => panic!("expected AlreadyInRoom, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_archived_room_is_inactive() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    rooms
        .set_active(&room.room_id, &Actor::Player(p("A")), false)
        .await
        .unwrap();

    let err = rooms.join_room(&room.room_id, &p("B"), None).await.unwrap_err();
    assert!(matches!(err, RoomError::RoomInactive(_)));
}

#[tokio::test]
async fn test_concurrent_joins_never_exceed_capacity() {
    let rooms = Arc::new(engine());
    let room = rooms
        .create_room(&p("host"), RoomSettings::new().max_players(4))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let rooms = Arc::clone(&rooms);
        let room_id = room.room_id.clone();
        handles.push(tokio::spawn(async move {
            rooms
                .join_room(&room_id, &PlayerId::new(format!("P{i}")), None)
                .await
        }));
    }

    let mut joined = 0;
    for result in futures_util::future::join_all(handles).await {
        match result.unwrap() {
            Ok(_) => joined += 1,
            Err(RoomError::RoomFull(_)) => {}
            Err(e) if e.kind() == ErrorKind::Transient => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let room = rooms.find_room(&room.room_id).await.unwrap();
    assert!(joined <= 3);
    assert_eq!(room.player_count(), 1 + joined);
    assert!(room.player_count() <= room.max_players);
}

#[tokio::test]
async fn test_concurrent_joins_seat_player_once() {
    let rooms = Arc::new(engine());
    let mut ids = Vec::new();
    for host in ["H1", "H2", "H3"] {
        ids.push(rooms.create_room(&p(host), RoomSettings::new()).await.unwrap().room_id);
    }

    let mut handles = Vec::new();
    for room_id in ids {
        let rooms = Arc::clone(&rooms);
        handles.push(tokio::spawn(async move {
            rooms.join_room(&room_id, &p("roamer"), None).await
        }));
    }
    let results = futures_util::future::join_all(handles).await;
    let seated = results.into_iter().filter(|r| matches!(r, Ok(Ok(_)))).count();

    assert_eq!(seated, 1);
    assert_eq!(rooms.rooms_by_player(&p("roamer")).await.unwrap().len(), 1);
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test]
async fn test_leave_host_reassigns_to_earliest_joiner() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    rooms.join_room(&room.room_id, &p("B"), None).await.unwrap();
    rooms.join_room(&room.room_id, &p("C"), None).await.unwrap();

    let outcome = rooms.leave_room(&room.room_id, &p("A")).await.unwrap();
    let LeaveOutcome::Left(room) = outcome else {
        panic!("room should survive");
    };
    assert_eq!(room.host_id, p("B"));
    assert_eq!(room.player_ids.as_slice(), &[p("B"), p("C")]);
}

#[tokio::test]
async fn test_leave_last_player_deletes_room() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();

    let outcome = rooms.leave_room(&room.room_id, &p("A")).await.unwrap();
    assert_eq!(outcome, LeaveOutcome::RoomDeleted(room.room_id.clone()));
    assert!(matches!(
        rooms.find_room(&room.room_id).await,
        Err(RoomError::RoomNotFound(_))
    ));

    // The seat is free again.
    rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
}

#[tokio::test]
async fn test_leave_absent_player_fails() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    let err = rooms.leave_room(&room.room_id, &p("Z")).await.unwrap_err();
    assert!(matches!(err, RoomError::PlayerNotInRoom(..)));
}

// =========================================================================
// Host operations
// =========================================================================

#[tokio::test]
async fn test_update_room_requires_host() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    rooms.join_room(&room.room_id, &p("B"), None).await.unwrap();

    let patch = RoomPatch {
        room_name: Some("Friday night".into()),
        ..Default::default()
    };
    let err = rooms
        .update_room(&room.room_id, &p("B"), patch.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);

    let updated = rooms.update_room(&room.room_id, &p("A"), patch).await.unwrap();
    assert_eq!(updated.room_name, "Friday night");
}

#[tokio::test]
async fn test_update_room_below_occupancy_is_rejected() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    rooms.join_room(&room.room_id, &p("B"), None).await.unwrap();
    rooms.join_room(&room.room_id, &p("C"), None).await.unwrap();

    let err = rooms
        .update_room(
            &room.room_id,
            &p("A"),
            RoomPatch {
                max_players: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::CapacityBelowOccupancy { requested: 2, occupancy: 3 }));
}

#[tokio::test]
async fn test_transfer_host_checks_roles() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    rooms.join_room(&room.room_id, &p("B"), None).await.unwrap();

    assert!(matches!(
        rooms.transfer_host(&room.room_id, &p("B"), &p("A")).await,
        Err(RoomError::NotHost(..))
    ));
    assert!(matches!(
        rooms.transfer_host(&room.room_id, &p("A"), &p("Z")).await,
        Err(RoomError::PlayerNotInRoom(..))
    ));

    let room = rooms.transfer_host(&room.room_id, &p("A"), &p("B")).await.unwrap();
    assert_eq!(room.host_id, p("B"));
}

#[tokio::test]
async fn test_delete_room_is_host_or_admin_gated() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    rooms.join_room(&room.room_id, &p("B"), None).await.unwrap();

    let err = rooms
        .delete_room(&room.room_id, &Actor::Player(p("B")))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::NotAuthorized(..)));

    rooms.delete_room(&room.room_id, &Actor::Admin).await.unwrap();
    assert!(rooms.seated_room(&p("B")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_set_active_false_frees_seats() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    let archived = rooms
        .set_active(&room.room_id, &Actor::Admin, false)
        .await
        .unwrap();
    assert!(!archived.is_using);

    // A can open a new room while the old one is archived...
    rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();

    // ...so reviving the old one would double-seat A.
    let err = rooms
        .set_active(&room.room_id, &Actor::Admin, true)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom { .. }));
}

// =========================================================================
// Expiry
// =========================================================================

#[tokio::test]
async fn test_sweep_expired_deletes_only_past_rooms() {
    let rooms = engine();
    let now = Utc::now();
    let stale = rooms
        .create_room(&p("A"), RoomSettings::new().expires_at(now - Duration::minutes(1)))
        .await
        .unwrap();
    let fresh = rooms
        .create_room(&p("B"), RoomSettings::new().expires_at(now + Duration::hours(1)))
        .await
        .unwrap();
    rooms.create_room(&p("C"), RoomSettings::new()).await.unwrap();

    assert_eq!(rooms.sweep_expired(now).await, 1);
    assert!(rooms.find_room(&stale.room_id).await.is_err());
    assert!(rooms.find_room(&fresh.room_id).await.is_ok());

    // Sweeping again finds nothing.
    assert_eq!(rooms.sweep_expired(now).await, 0);
}

#[tokio::test]
async fn test_concurrent_sweeps_delete_each_room_once() {
    let rooms = Arc::new(engine());
    let now = Utc::now();
    for i in 0..5 {
        rooms
            .create_room(
                &PlayerId::new(format!("H{i}")),
                RoomSettings::new().expires_at(now - Duration::seconds(1)),
            )
            .await
            .unwrap();
    }

    let a = tokio::spawn({
        let rooms = Arc::clone(&rooms);
        async move { rooms.sweep_expired(now).await }
    });
    let b = tokio::spawn({
        let rooms = Arc::clone(&rooms);
        async move { rooms.sweep_expired(now).await }
    });
    let total = a.await.unwrap() + b.await.unwrap();
    assert_eq!(total, 5);
}

#[tokio::test]
async fn test_sweep_expired_skips_corrupt_row() {
    let store = MemoryStore::new();
    let rooms = RoomEngine::new(store.clone(), RoomEngineConfig::default()).unwrap();
    let now = Utc::now();
    let stale = rooms
        .create_room(&p("A"), RoomSettings::new().expires_at(now - Duration::minutes(1)))
        .await
        .unwrap();
    store
        .put_raw("room", "room_BAD00001", b"{oops".to_vec())
        .await
        .unwrap();

    assert_eq!(rooms.sweep_expired(now).await, 1);
    assert!(rooms.find_room(&stale.room_id).await.is_err());

    // The bad row stays out of every listing instead of failing it.
    let listing = rooms
        .list_rooms(&RoomFilter::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(listing.total, 0);
    assert_eq!(rooms.room_stats().await.unwrap().total, 0);
    let err = rooms.find_room(&RoomId::from("room_BAD00001")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

// =========================================================================
// Outages
// =========================================================================

#[tokio::test]
async fn test_join_room_store_offline_is_transient() {
    let store = MemoryStore::new();
    let rooms = RoomEngine::new(store.clone(), RoomEngineConfig::default()).unwrap();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();

    store.set_online(false);
    let err = rooms.join_room(&room.room_id, &p("B"), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(err.kind().is_retryable());
    store.set_online(true);

    let after = rooms.find_room(&room.room_id).await.unwrap();
    assert_eq!(after.player_ids.as_slice(), &[p("A")]);
    assert!(rooms.seated_room(&p("B")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_sweep_expired_store_offline_deletes_nothing() {
    let store = MemoryStore::new();
    let rooms = RoomEngine::new(store.clone(), RoomEngineConfig::default()).unwrap();
    let now = Utc::now();
    let stale = rooms
        .create_room(&p("A"), RoomSettings::new().expires_at(now - Duration::minutes(1)))
        .await
        .unwrap();

    store.set_online(false);
    assert_eq!(rooms.sweep_expired(now).await, 0);
    store.set_online(true);

    assert!(rooms.find_room(&stale.room_id).await.is_ok());
    assert_eq!(rooms.sweep_expired(now).await, 1);
}

#[tokio::test]
async fn test_touch_store_offline_is_noop() {
    let store = MemoryStore::new();
    let rooms = RoomEngine::new(store.clone(), RoomEngineConfig::default()).unwrap();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();

    store.set_online(false);
    rooms.touch(&room.room_id).await;
    store.set_online(true);

    let after = rooms.find_room(&room.room_id).await.unwrap();
    assert_eq!(after.last_activity_at, room.last_activity_at);
}

// =========================================================================
// Queries
// =========================================================================

#[tokio::test]
async fn test_list_rooms_filters_and_paginates() {
    let rooms = engine();
    rooms
        .create_room(&p("A"), RoomSettings::new().game_mode("uno").named("Uno night"))
        .await
        .unwrap();
    rooms
        .create_room(&p("B"), RoomSettings::new().game_mode("poker").private("pw"))
        .await
        .unwrap();
    let archived = rooms
        .create_room(&p("C"), RoomSettings::new().game_mode("uno"))
        .await
        .unwrap();
    rooms
        .set_active(&archived.room_id, &Actor::Admin, false)
        .await
        .unwrap();

    let uno = RoomFilter {
        game_mode: Some("UNO".into()),
        ..Default::default()
    };
    let listing = rooms.list_rooms(&uno, Page::default()).await.unwrap();
    assert_eq!(listing.total, 1);

    let with_archived = RoomFilter {
        include_inactive: true,
        ..uno
    };
    assert_eq!(rooms.list_rooms(&with_archived, Page::default()).await.unwrap().total, 2);

    let search = RoomFilter {
        search: Some("night".into()),
        ..Default::default()
    };
    assert_eq!(rooms.list_rooms(&search, Page::default()).await.unwrap().total, 1);

    let page = rooms
        .list_rooms(&RoomFilter::default(), Page::new(2, 1))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_available_rooms_and_stats() {
    let rooms = engine();
    let full = rooms
        .create_room(&p("A"), RoomSettings::new().max_players(2))
        .await
        .unwrap();
    rooms.join_room(&full.room_id, &p("B"), None).await.unwrap();
    let open = rooms
        .create_room(&p("C"), RoomSettings::new().game_mode("uno"))
        .await
        .unwrap();

    let available = rooms.available_rooms(None).await.unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].room_id, open.room_id);
    assert_eq!(rooms.player_count(&full.room_id).await.unwrap(), 2);

    let stats = rooms.room_stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 2);
    assert_eq!(stats.by_game_mode.get("uno"), Some(&1));
    assert!((stats.average_players - 1.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_touch_updates_last_activity() {
    let rooms = engine();
    let room = rooms.create_room(&p("A"), RoomSettings::new()).await.unwrap();
    rooms.touch(&room.room_id).await;
    rooms.touch(&RoomId::from("missing")).await;

    let touched = rooms.find_room(&room.room_id).await.unwrap();
    assert!(touched.last_activity_at >= room.last_activity_at);
}
