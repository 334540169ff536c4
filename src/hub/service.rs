//! Session hub: the concurrent front door to many sessions.
//!
//! ## Exclusion
//!
//! Each session lives in a `SessionSlot` behind a `tokio::sync::Mutex`. Every
//! request, timer expiry and scheduled opponent turn takes that lock, so
//! mutations of one session are applied one at a time in arrival order while
//! different sessions proceed in parallel.
//!
//! ## After every mutation
//!
//! 1. Timer and opponent tasks are brought in line with the new state. A
//!    task whose ticket or round is still current keeps running, so acting
//!    within a turn never moves that turn's deadline.
//! 2. A snapshot is captured under the lock and written in the background.
//! 3. A `SessionUpdate` with the human's view is broadcast.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, Mutex};
use tokio::task::AbortHandle;
use tracing::{debug, info};

use super::store::SnapshotStore;
use crate::cards::{CardCatalog, CardId};
use crate::core::{EngineConfig, EngineError, SessionId, Side};
use crate::rules::{GreedyOpponent, OpponentPolicy, TimerTicket};
use crate::session::GameSession;
use crate::snapshot::{PublicSnapshot, Snapshot};

/// Capacity of the update channel. Slow subscribers skip ahead.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Pushed to subscribers after every successful mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUpdate {
    pub session_id: SessionId,
    pub view: PublicSnapshot,
}

/// Mutable state of one hosted session.
pub(crate) struct SlotState {
    pub(crate) session: GameSession,
    /// Expiry task and the ticket it will present.
    pub(crate) timer: Option<(TimerTicket, AbortHandle)>,
    /// Opponent task and the round it was scheduled for.
    pub(crate) opponent: Option<(u32, AbortHandle)>,
    /// Bumped for every captured snapshot.
    pub(crate) revision: u64,
}

impl SlotState {
    pub(crate) fn cancel_tasks(&mut self) {
        if let Some((_, handle)) = self.timer.take() {
            handle.abort();
        }
        if let Some((_, handle)) = self.opponent.take() {
            handle.abort();
        }
    }
}

pub(crate) struct SessionSlot {
    pub(crate) state: Mutex<SlotState>,
    /// Revision of the newest snapshot known to be stored.
    pub(crate) persisted: Mutex<u64>,
}

impl SessionSlot {
    fn new(session: GameSession) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SlotState {
                session,
                timer: None,
                opponent: None,
                revision: 0,
            }),
            persisted: Mutex::new(0),
        })
    }
}

pub(crate) struct HubInner<S> {
    pub(crate) sessions: DashMap<SessionId, Arc<SessionSlot>>,
    pub(crate) store: S,
    pub(crate) catalog: Arc<CardCatalog>,
    pub(crate) config: EngineConfig,
    pub(crate) policy: Arc<dyn OpponentPolicy>,
    pub(crate) updates: broadcast::Sender<SessionUpdate>,
}

/// Hosts sessions for concurrent callers.
///
/// Cheap to clone; clones share the same sessions.
pub struct SessionHub<S: SnapshotStore> {
    inner: Arc<HubInner<S>>,
}

impl<S: SnapshotStore> Clone for SessionHub<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SnapshotStore> SessionHub<S> {
    /// Hub whose automated side plays `GreedyOpponent`.
    pub fn new(store: S, catalog: Arc<CardCatalog>, config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_policy(store, catalog, config, Arc::new(GreedyOpponent))
    }

    pub fn with_policy(
        store: S,
        catalog: Arc<CardCatalog>,
        config: EngineConfig,
        policy: Arc<dyn OpponentPolicy>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(HubInner {
                sessions: DashMap::new(),
                store,
                catalog,
                config,
                policy,
                updates,
            }),
        })
    }

    // === Operations ===

    /// Start a match for the human with `deck_ids` against the standard
    /// opponent deck.
    pub async fn start_match(&self, deck_ids: Vec<u32>) -> Result<PublicSnapshot, EngineError> {
        let session = GameSession::start(&deck_ids, Arc::clone(&self.inner.catalog), self.inner.config.clone())?;
        let id = session.id();
        let slot = SessionSlot::new(session);
        self.inner.sessions.insert(id, Arc::clone(&slot));

        let mut state = slot.state.lock().await;
        self.inner.after_mutation(&slot, &mut state);
        Ok(state.session.view(Side::Human))
    }

    /// Play `card_id` from the human's hand.
    pub async fn play_card(&self, id: SessionId, card_id: u32) -> Result<PublicSnapshot, EngineError> {
        self.mutate(id, |session| session.play_card(Side::Human, CardId::new(card_id)).map(drop))
            .await
    }

    /// Resolve the human's combat now.
    pub async fn attack(&self, id: SessionId) -> Result<PublicSnapshot, EngineError> {
        self.mutate(id, |session| session.attack(Side::Human).map(drop)).await
    }

    /// End the human's turn. The opponent acts after the think delay.
    pub async fn end_turn(&self, id: SessionId) -> Result<PublicSnapshot, EngineError> {
        self.mutate(id, |session| session.end_turn(Side::Human).map(drop)).await
    }

    /// Current view of `id` for `side`.
    pub async fn view(&self, id: SessionId, side: Side) -> Result<PublicSnapshot, EngineError> {
        let slot = self.slot(id)?;
        let state = slot.state.lock().await;
        Ok(state.session.view(side))
    }

    /// Bring `id` into memory from the store, unless it is already hosted.
    ///
    /// Bytes that fail to decode or restore are reported for this request
    /// only; nothing is inserted.
    pub async fn load(&self, id: SessionId) -> Result<PublicSnapshot, EngineError> {
        if let Ok(view) = self.view(id, Side::Human).await {
            return Ok(view);
        }

        let bytes = self.inner.store.get(id)?.ok_or(EngineError::SessionNotFound(id))?;
        let session = Snapshot::from_bytes(&bytes)?
            .restore(Arc::clone(&self.inner.catalog), self.inner.config.clone())?;
        if session.id() != id {
            return Err(EngineError::CorruptSnapshot(format!(
                "stored under {} but holds {}",
                id,
                session.id()
            )));
        }

        let slot = Arc::clone(
            self.inner
                .sessions
                .entry(id)
                .or_insert_with(|| SessionSlot::new(session))
                .value(),
        );
        let mut state = slot.state.lock().await;
        self.inner.reschedule(&slot, &mut state);
        info!(session = %id, round = state.session.round(), "session loaded");
        Ok(state.session.view(Side::Human))
    }

    /// Write the current snapshot of `id` and wait until it is stored.
    pub async fn checkpoint(&self, id: SessionId) -> Result<(), EngineError> {
        let slot = self.slot(id)?;
        let (revision, bytes) = {
            let mut state = slot.state.lock().await;
            let bytes = Snapshot::capture(&state.session).to_bytes()?;
            state.revision += 1;
            (state.revision, bytes)
        };
        self.inner.write_revision(&slot, id, revision, bytes).await
    }

    /// Abort `id`, store its final snapshot and stop hosting it.
    ///
    /// The final snapshot is written before anything changes. If the write
    /// fails the session stays hosted and untouched.
    pub async fn teardown(&self, id: SessionId) -> Result<PublicSnapshot, EngineError> {
        let slot = self.slot(id)?;
        let mut state = slot.state.lock().await;
        // A concurrent teardown may have finished while we waited.
        let hosted = self
            .inner
            .sessions
            .get(&id)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), &slot));
        if !hosted {
            return Err(EngineError::SessionNotFound(id));
        }

        let mut ended = state.session.clone();
        ended.abort();
        let bytes = Snapshot::capture(&ended).to_bytes()?;
        state.revision += 1;
        let revision = state.revision;
        self.inner.write_revision(&slot, id, revision, bytes).await?;

        state.cancel_tasks();
        state.session = ended;
        self.inner.sessions.remove(&id);
        info!(session = %id, "session torn down");
        Ok(state.session.view(Side::Human))
    }

    /// Receive a `SessionUpdate` after every mutation of any hosted session.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.inner.updates.subscribe()
    }

    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.inner.sessions.contains_key(&id)
    }

    /// Number of hosted sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.sessions.is_empty()
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<CardCatalog> {
        &self.inner.catalog
    }

    // === Internals ===

    fn slot(&self, id: SessionId) -> Result<Arc<SessionSlot>, EngineError> {
        self.inner
            .sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::SessionNotFound(id))
    }

    async fn mutate(
        &self,
        id: SessionId,
        op: impl FnOnce(&mut GameSession) -> Result<(), EngineError>,
    ) -> Result<PublicSnapshot, EngineError> {
        let slot = self.slot(id)?;
        let mut state = slot.state.lock().await;
        if let Err(err) = op(&mut state.session) {
            debug!(session = %id, code = err.code(), "request rejected");
            return Err(err);
        }
        self.inner.after_mutation(&slot, &mut state);
        Ok(state.session.view(Side::Human))
    }
}

impl<S: SnapshotStore> HubInner<S> {
    /// Re-schedule tasks, persist and broadcast. Call with the slot locked.
    pub(crate) fn after_mutation(self: &Arc<Self>, slot: &Arc<SessionSlot>, state: &mut SlotState) {
        self.reschedule(slot, state);
        self.publish(slot, state);
    }

    /// Persist and broadcast the current state without touching its tasks.
    pub(crate) fn publish(self: &Arc<Self>, slot: &Arc<SessionSlot>, state: &mut SlotState) {
        self.persist(slot, state);

        let update = SessionUpdate {
            session_id: state.session.id(),
            view: state.session.view(Side::Human),
        };
        // No subscribers is fine.
        let _ = self.updates.send(update);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cards::STANDARD_CATALOG_VERSION;
    use crate::core::{GameRng, InstanceIds, PlayerState};
    use crate::hub::store::MemoryStore;

    const IMP: CardId = CardId::new(2);
    const ARCHER: CardId = CardId::new(7);

    /// Plays the Imp first, then Archers.
    struct ImpThenArcher;

    impl OpponentPolicy for ImpThenArcher {
        fn choose_play(&self, me: &PlayerState, _catalog: &CardCatalog, _config: &EngineConfig) -> Option<CardId> {
            let pick = if me.zones.hand_position(IMP).is_some() { IMP } else { ARCHER };
            me.zones.hand_position(pick).map(|_| pick)
        }
    }

    /// Standard catalog without the Archer.
    fn catalog_without_archer() -> CardCatalog {
        let mut catalog = CardCatalog::new(STANDARD_CATALOG_VERSION);
        for def in CardCatalog::standard().unwrap().iter().filter(|def| def.id != ARCHER) {
            catalog.register(def.clone()).unwrap();
        }
        catalog
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_opponent_turn_publishes_applied_plays() {
        let config = EngineConfig::default().with_seed(5).with_starting_energy(5);
        let full = Arc::new(CardCatalog::standard().unwrap());
        let mut session =
            GameSession::new(SessionId::new_v4(), &[1, 2, 3, 4, 5], &[2, 7, 7, 7, 7], full, config.clone()).unwrap();
        session.end_turn(Side::Human).unwrap();

        // Same state, but the Archers in the AI hand no longer resolve.
        let trimmed = Arc::new(catalog_without_archer());
        let session = GameSession::from_parts(
            session.id(),
            session.status(),
            session.turn().clone(),
            session.players().clone(),
            GameRng::from_state(&session.rng_state()),
            InstanceIds::starting_at(session.next_instance_id()),
            Arc::clone(&trimmed),
            config.clone(),
        );
        let id = session.id();

        let hub = SessionHub::with_policy(MemoryStore::new(), trimmed, config, Arc::new(ImpThenArcher)).unwrap();
        let mut updates = hub.subscribe();
        let slot = SessionSlot::new(session);
        hub.inner.sessions.insert(id, Arc::clone(&slot));
        {
            let mut state = slot.state.lock().await;
            hub.inner.after_mutation(&slot, &mut state);
        }
        assert_eq!(updates.recv().await.unwrap().view.ai.field.len(), 0);

        tokio::time::sleep(Duration::from_millis(900)).await;

        // The Imp stays on the field and is broadcast and stored.
        let update = updates.recv().await.unwrap();
        assert_eq!(update.view.ai.field.len(), 1);
        assert_eq!(update.view.current_turn, Side::Ai);
        let stored = Snapshot::from_bytes(&hub.store().get(id).unwrap().unwrap()).unwrap();
        assert_eq!(stored.ai.field.len(), 1);

        // The turn timer still hands the turn back.
        tokio::time::sleep(Duration::from_secs(30)).await;
        let view = hub.view(id, Side::Human).await.unwrap();
        assert_eq!(view.current_turn, Side::Human);
    }
}
