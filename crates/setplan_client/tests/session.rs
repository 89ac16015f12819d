//! Session tests: debouncing, failure reporting and bus convergence.

use chrono::Utc;
use setplan_bus::{BusConfig, EventBus, Scope};
use setplan_client::{
    ClientConfig, ClientError, LocalService, MockService, PracticeSession, SessionEvent,
};
use setplan_core::{
    BatchApplier, Caller, ClubId, Location, LocationId, Practice, PracticeId, PracticeSet,
    SetDelta, SetStore, UserId,
};
use std::sync::Arc;
use std::time::Duration;

fn config() -> ClientConfig {
    ClientConfig::default().with_debounce(Duration::from_secs(2))
}

fn mock_with_one_set() -> (Arc<MockService>, PracticeId, PracticeSet) {
    let practice = PracticeId::new();
    let row = PracticeSet::new(practice, LocationId::new(), 1);
    (Arc::new(MockService::with_rows(vec![row.clone()])), practice, row)
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_send_only_the_last_value() {
    let (mock, practice, row) = mock_with_one_set();
    let (session, mut events) = PracticeSession::start(practice, mock.clone(), config());
    session.reload().await.unwrap();

    for note in ["f", "fr", "front cross"] {
        session
            .edit(SetDelta::update(row.id).with_notes(Some(note.into())))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
    }
    assert!(mock.applied().is_empty());
    assert_eq!(session.pending_edits(), 1);

    assert_eq!(events.recv().await, Some(SessionEvent::Sent { set_id: row.id }));
    let applied = mock.applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0][0].notes, Some(Some("front cross".into())));

    let state = session.snapshot();
    assert_eq!(state.get(row.id).unwrap().notes.as_deref(), Some("front cross"));
}

#[tokio::test(start_paused = true)]
async fn edits_of_different_fields_are_merged() {
    let (mock, practice, row) = mock_with_one_set();
    let (session, mut events) = PracticeSession::start(practice, mock.clone(), config());
    session.reload().await.unwrap();

    session
        .edit(SetDelta::update(row.id).with_notes(Some("tight turns".into())))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    session
        .edit(SetDelta::update(row.id).with_rating(Some(4)))
        .unwrap();

    assert_eq!(events.recv().await, Some(SessionEvent::Sent { set_id: row.id }));
    let applied = mock.applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0][0].notes, Some(Some("tight turns".into())));
    assert_eq!(applied[0][0].rating, Some(Some(4)));

    let state = session.snapshot();
    let set = state.get(row.id).unwrap();
    assert_eq!(set.notes.as_deref(), Some("tight turns"));
    assert_eq!(set.rating, Some(4));
    assert_eq!(session.pending_edits(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_edit_is_not_merged_into_the_next() {
    let (mock, practice, row) = mock_with_one_set();
    let (session, mut events) = PracticeSession::start(practice, mock.clone(), config());
    session.reload().await.unwrap();

    session
        .edit(SetDelta::update(row.id).with_notes(Some("discarded".into())))
        .unwrap();
    assert!(session.cancel_edit(row.id));
    assert!(!session.cancel_edit(row.id));
    session
        .edit(SetDelta::update(row.id).with_warmup(true))
        .unwrap();

    assert_eq!(events.recv().await, Some(SessionEvent::Sent { set_id: row.id }));
    let applied = mock.applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0][0].notes, None);
    assert_eq!(applied[0][0].is_warmup, Some(true));
}

#[tokio::test(start_paused = true)]
async fn failed_send_is_reported_and_not_retried() {
    let (mock, practice, row) = mock_with_one_set();
    let (session, mut events) = PracticeSession::start(practice, mock.clone(), config());
    session.reload().await.unwrap();
    let before = session.snapshot();

    mock.set_connected(false);
    session
        .edit(SetDelta::update(row.id).with_warmup(true))
        .unwrap();

    match events.recv().await {
        Some(SessionEvent::SendFailed {
            set_id, retryable, ..
        }) => {
            assert_eq!(set_id, row.id);
            assert!(retryable);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    mock.set_connected(true);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(mock.applied().is_empty());
    assert_eq!(session.snapshot().sets, before.sets);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn edit_requires_a_set_id() {
    let (mock, practice, _) = mock_with_one_set();
    let (session, _events) = PracticeSession::start(practice, mock, config());

    let err = session
        .edit(SetDelta::create(practice, LocationId::new(), 2))
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidEdit(_)));
}

#[tokio::test(start_paused = true)]
async fn delete_drops_pending_edit_and_reloads() {
    let (mock, practice, row) = mock_with_one_set();
    let (session, _events) = PracticeSession::start(practice, mock.clone(), config());
    session.reload().await.unwrap();

    session
        .edit(SetDelta::update(row.id).with_rating(Some(5)))
        .unwrap();
    session.delete(&[row.id]).await.unwrap();
    assert_eq!(session.pending_edits(), 0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(mock.applied().is_empty());
    assert_eq!(mock.deleted(), vec![row.id]);
    assert!(session.snapshot().is_empty());
}

#[tokio::test]
async fn sessions_converge_through_the_bus() {
    let store = Arc::new(SetStore::new());
    let club = ClubId::new();
    let alice = Caller::new(UserId::new(), [club]);
    let bob = Caller::new(UserId::new(), [club]);
    let practice = Practice::new(club, alice.user_id, Utc::now());
    let ring = Location::new(club, "Ring").default_location();
    store.insert_practice(practice.clone());
    store.insert_location(ring.clone());

    let bus = Arc::new(EventBus::new(BusConfig::default(), store.clone()));
    let applier = Arc::new(BatchApplier::new(store, bus.clone()));

    let alice_service = Arc::new(LocalService::new(applier.clone(), alice.clone()));
    let (alice_session, _a) = PracticeSession::start(practice.id, alice_service, config());
    let bob_service = Arc::new(LocalService::new(applier, bob.clone()));
    let (bob_session, _b) = PracticeSession::start(practice.id, bob_service, config());
    let mut bob_watch = bob_session.watch();
    bob_session.follow(bus.subscribe(&bob, Scope::Practice(practice.id)).unwrap());

    let created = alice_session
        .apply_now(vec![
            SetDelta::create(practice.id, ring.id, 2),
            SetDelta::create(practice.id, ring.id, 1),
        ])
        .await
        .unwrap();
    assert_eq!(alice_session.snapshot().indices(), vec![1, 2]);

    // Two set updates and one summary.
    while bob_watch.borrow().summary.is_none() {
        bob_watch.changed().await.unwrap();
    }
    let bob_state = bob_session.snapshot();
    assert_eq!(bob_state.indices(), vec![1, 2]);
    assert_eq!(bob_state.sets, alice_session.snapshot().sets);

    alice_session.delete(&[created[1].id]).await.unwrap();
    assert_eq!(alice_session.snapshot().indices(), vec![1]);
    while bob_watch.borrow().indices() != vec![1] {
        bob_watch.changed().await.unwrap();
    }
    assert_eq!(bob_session.snapshot().sets, alice_session.snapshot().sets);
}
