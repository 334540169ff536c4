//! Hub tests on a paused clock: timers, the delayed opponent turn,
//! persistence and per-session exclusion.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use duel_engine::{
    CardCatalog, EngineConfig, EngineError, ErrorKind, IdleOpponent, MemoryStore, SessionHub, SessionId,
    SessionStatus, Side, Snapshot, SnapshotStore,
};

fn config() -> EngineConfig {
    EngineConfig::default().with_seed(21)
}

fn hub() -> SessionHub<MemoryStore> {
    SessionHub::new(MemoryStore::new(), Arc::new(CardCatalog::standard().unwrap()), config()).unwrap()
}

const DECK: [u32; 5] = [1, 2, 3, 4, 5];

// =============================================================================
// Requests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_match() {
    let hub = hub();
    let view = hub.start_match(DECK.to_vec()).await.unwrap();

    assert_eq!(view.round, 1);
    assert_eq!(view.current_turn, Side::Human);
    assert_eq!(view.human.hand.as_ref().map(Vec::len), Some(5));
    assert!(view.ai.hand.is_none());
    assert!(hub.contains(view.id));
}

#[tokio::test(start_paused = true)]
async fn test_start_match_rejects_bad_deck() {
    let hub = hub();
    let err = hub.start_match(vec![1, 2, 3]).await.unwrap_err();

    assert_eq!(err.code(), "invalid_deck");
    assert!(hub.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_session() {
    let hub = hub();
    let id = SessionId::new_v4();

    assert_eq!(hub.play_card(id, 2).await.unwrap_err(), EngineError::SessionNotFound(id));
    assert_eq!(hub.end_turn(id).await.unwrap_err(), EngineError::SessionNotFound(id));
    assert_eq!(hub.load(id).await.unwrap_err(), EngineError::SessionNotFound(id));
}

#[tokio::test(start_paused = true)]
async fn test_play_and_reject() {
    let hub = hub();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;

    let view = hub.play_card(id, 2).await.unwrap();
    assert_eq!(view.human.field.len(), 1);
    assert_eq!(view.human.energy, 0);

    let err = hub.play_card(id, 4).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RuleViolation);
    let view = hub.view(id, Side::Human).await.unwrap();
    assert_eq!(view.human.hand_count, 4);
}

// =============================================================================
// Background tasks
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_opponent_acts_after_think_delay() {
    let hub = hub();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;

    let view = hub.end_turn(id).await.unwrap();
    assert_eq!(view.current_turn, Side::Ai);
    assert_eq!(view.round, 2);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(hub.view(id, Side::Human).await.unwrap().current_turn, Side::Ai);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let view = hub.view(id, Side::Human).await.unwrap();
    assert_eq!(view.current_turn, Side::Human);
    assert_eq!(view.round, 3);
    assert_eq!(view.ai.field.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_turn_timer_ends_idle_turn() {
    let hub = hub();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;

    tokio::time::sleep(Duration::from_millis(29_900)).await;
    assert_eq!(hub.view(id, Side::Human).await.unwrap().round, 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let view = hub.view(id, Side::Human).await.unwrap();
    assert_eq!(view.current_turn, Side::Ai);
    assert_eq!(view.round, 2);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let view = hub.view(id, Side::Human).await.unwrap();
    assert_eq!(view.current_turn, Side::Human);
    assert_eq!(view.round, 3);
}

#[tokio::test(start_paused = true)]
async fn test_actions_do_not_extend_turn_deadline() {
    let hub = hub();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;

    tokio::time::sleep(Duration::from_secs(20)).await;
    hub.play_card(id, 2).await.unwrap();
    hub.attack(id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(9_900)).await;
    assert_eq!(hub.view(id, Side::Human).await.unwrap().round, 1);

    // 30 s after the turn began, not after the last action.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let view = hub.view(id, Side::Human).await.unwrap();
    assert_eq!(view.round, 2);
    assert_eq!(view.current_turn, Side::Ai);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_end_turn_defuses_timer() {
    let hub = hub();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;

    tokio::time::sleep(Duration::from_secs(29)).await;
    hub.end_turn(id).await.unwrap();

    // Past the original deadline; only the opponent turn happened.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let view = hub.view(id, Side::Human).await.unwrap();
    assert_eq!(view.round, 3);
    assert_eq!(view.current_turn, Side::Human);
}

#[tokio::test(start_paused = true)]
async fn test_updates_are_broadcast() {
    let hub = SessionHub::with_policy(
        MemoryStore::new(),
        Arc::new(CardCatalog::standard().unwrap()),
        config(),
        Arc::new(IdleOpponent),
    )
    .unwrap();
    let mut updates = hub.subscribe();

    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;
    let first = updates.recv().await.unwrap();
    assert_eq!(first.session_id, id);
    assert_eq!(first.view.round, 1);

    hub.end_turn(id).await.unwrap();
    assert_eq!(updates.recv().await.unwrap().view.current_turn, Side::Ai);

    // The delayed opponent turn is broadcast too.
    let update = updates.recv().await.unwrap();
    assert_eq!(update.view.current_turn, Side::Human);
    assert_eq!(update.view.round, 3);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_are_serialized() {
    let hub = hub();
    let id = hub.start_match(vec![2, 2, 2, 2, 2]).await.unwrap().id;
    // One energy: exactly one of the concurrent plays can succeed.
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let hub = hub.clone();
            tokio::spawn(async move { hub.play_card(id, 2).await })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(err) => assert_eq!(err.code(), "insufficient_energy"),
        }
    }

    assert_eq!(ok, 1);
    let view = hub.view(id, Side::Human).await.unwrap();
    assert_eq!(view.human.field.len(), 1);
    assert_eq!(view.human.hand_count, 4);
    assert_eq!(view.human.energy, 0);
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_checkpoint_and_load_elsewhere() {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(CardCatalog::standard().unwrap());
    let first = SessionHub::new(Arc::clone(&store), Arc::clone(&catalog), config()).unwrap();

    let id = first.start_match(DECK.to_vec()).await.unwrap().id;
    first.play_card(id, 2).await.unwrap();
    first.checkpoint(id).await.unwrap();
    let expected = first.view(id, Side::Human).await.unwrap();

    let second = SessionHub::new(Arc::clone(&store), catalog, config()).unwrap();
    assert!(!second.contains(id));
    let loaded = second.load(id).await.unwrap();

    assert_eq!(loaded, expected);
    assert!(second.contains(id));
}

#[tokio::test(start_paused = true)]
async fn test_background_persistence() {
    let hub = hub();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;
    hub.play_card(id, 2).await.unwrap();

    // Let the spawned writes run.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let bytes = hub.store().get(id).unwrap().unwrap();
    let stored = Snapshot::from_bytes(&bytes).unwrap();
    assert_eq!(stored.human.field.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_corrupt_store_entry() {
    let hub = hub();
    let id = SessionId::new_v4();
    hub.store().insert_raw(id, vec![9, 9, 9]);

    let err = hub.load(id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert!(!hub.contains(id));
}

#[tokio::test(start_paused = true)]
async fn test_teardown() {
    let hub = hub();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;

    let view = hub.teardown(id).await.unwrap();
    assert_eq!(view.status, SessionStatus::Aborted);
    assert!(!hub.contains(id));
    assert_eq!(hub.teardown(id).await.unwrap_err(), EngineError::SessionNotFound(id));

    let stored = Snapshot::from_bytes(&hub.store().get(id).unwrap().unwrap()).unwrap();
    assert_eq!(stored.status, SessionStatus::Aborted);

    // A timer that would have fired does nothing.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!hub.contains(id));
}

#[tokio::test(start_paused = true)]
async fn test_failed_teardown_keeps_session_hosted() {
    let store = Arc::new(FlakyStore::failing(0));
    let catalog = Arc::new(CardCatalog::standard().unwrap());
    let hub = SessionHub::new(Arc::clone(&store), catalog, config().with_persist_retries(0)).unwrap();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;
    tokio::time::sleep(Duration::from_millis(10)).await;

    store.failures.store(1, Ordering::SeqCst);
    let err = hub.teardown(id).await.unwrap_err();
    assert_eq!(err.code(), "store_failure");

    // Nothing changed: still hosted, still running, and the timer still fires.
    assert!(hub.contains(id));
    assert_eq!(hub.view(id, Side::Human).await.unwrap().status, SessionStatus::Active);
    let stored = Snapshot::from_bytes(&store.get(id).unwrap().unwrap()).unwrap();
    assert_eq!(stored.status, SessionStatus::Active);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(hub.view(id, Side::Human).await.unwrap().round, 2);

    // A retried teardown goes through.
    assert_eq!(hub.teardown(id).await.unwrap().status, SessionStatus::Aborted);
    assert!(!hub.contains(id));
    let stored = Snapshot::from_bytes(&store.get(id).unwrap().unwrap()).unwrap();
    assert_eq!(stored.status, SessionStatus::Aborted);
}

/// Fails the first `failures` writes.
struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicU32,
}

impl FlakyStore {
    fn failing(failures: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(failures),
        }
    }
}

impl SnapshotStore for FlakyStore {
    fn put(&self, id: SessionId, bytes: &[u8]) -> Result<(), EngineError> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(EngineError::Store("disk unavailable".to_string()));
        }
        self.inner.put(id, bytes)
    }

    fn get(&self, id: SessionId) -> Result<Option<Vec<u8>>, EngineError> {
        self.inner.get(id)
    }

    fn delete(&self, id: SessionId) -> Result<(), EngineError> {
        self.inner.delete(id)
    }
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_retries_then_gives_up() {
    let catalog = Arc::new(CardCatalog::standard().unwrap());

    let store = Arc::new(FlakyStore::failing(0));
    let hub = SessionHub::new(Arc::clone(&store), Arc::clone(&catalog), config().with_persist_retries(2)).unwrap();
    let id = hub.start_match(DECK.to_vec()).await.unwrap().id;
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Two failures fit in two retries.
    store.failures.store(2, Ordering::SeqCst);
    hub.play_card(id, 2).await.unwrap();
    hub.checkpoint(id).await.unwrap();
    assert!(store.get(id).unwrap().is_some());

    // Three do not.
    store.failures.store(3, Ordering::SeqCst);
    let err = hub.checkpoint(id).await.unwrap_err();
    assert_eq!(err.code(), "store_failure");
    assert_eq!(err.kind(), ErrorKind::Integrity);
}
