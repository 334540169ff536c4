//! Background work for hosted sessions: turn timers, the delayed opponent
//! turn and snapshot writes.
//!
//! Timer and opponent tasks hold no state of their own beyond what they were
//! scheduled for. When they wake they take the slot lock and re-check that
//! what they were scheduled for still holds, so a task that loses a race
//! against an abort does nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::service::{HubInner, SessionSlot, SlotState};
use super::store::SnapshotStore;
use crate::core::{EngineError, SessionId, Side};
use crate::rules::TimerTicket;
use crate::snapshot::Snapshot;

/// First retry delay for a failed snapshot write. Doubles per attempt.
const PERSIST_BACKOFF: Duration = Duration::from_millis(50);

impl<S: SnapshotStore> HubInner<S> {
    /// Bring the slot's tasks in line with the session.
    ///
    /// A timer task is kept while the session still holds the ticket it was
    /// spawned for, and an opponent task while the AI is still to act in the
    /// round it was scheduled for. Anything else is aborted and replaced.
    pub(crate) fn reschedule(self: &Arc<Self>, slot: &Arc<SessionSlot>, state: &mut SlotState) {
        if !state.session.is_active() {
            state.cancel_tasks();
            return;
        }

        let ticket = state.session.timer_ticket();
        let held = state.timer.as_ref().map(|(held, _)| *held);
        if held != ticket {
            if let Some((_, handle)) = state.timer.take() {
                handle.abort();
            }
            if let (Some(ticket), Some(deadline)) = (ticket, state.session.turn().timer().deadline()) {
                let task = tokio::spawn(Arc::clone(self).expire_at(Arc::clone(slot), ticket, deadline));
                state.timer = Some((ticket, task.abort_handle()));
            }
        }

        let round = state.session.round();
        let ai_to_act = state.session.current_side() == Side::Ai;
        let scheduled = state.opponent.as_ref().is_some_and(|(held, _)| *held == round);
        if !(ai_to_act && scheduled) {
            if let Some((_, handle)) = state.opponent.take() {
                handle.abort();
            }
            if ai_to_act {
                let task = tokio::spawn(Arc::clone(self).opponent_after(
                    Arc::clone(slot),
                    round,
                    self.config.ai_think_delay(),
                ));
                state.opponent = Some((round, task.abort_handle()));
            }
        }
    }

    async fn expire_at(self: Arc<Self>, slot: Arc<SessionSlot>, ticket: TimerTicket, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;

        let mut state = slot.state.lock().await;
        // This task is finishing; re-scheduling must not abort it.
        state.timer = None;
        match state.session.expire_turn(ticket) {
            Ok(true) => self.after_mutation(&slot, &mut state),
            Ok(false) => {}
            Err(err) => debug!(session = %state.session.id(), code = err.code(), "timer expiry ignored"),
        }
    }

    async fn opponent_after(self: Arc<Self>, slot: Arc<SessionSlot>, round: u32, delay: Duration) {
        tokio::time::sleep(delay).await;

        let mut state = slot.state.lock().await;
        state.opponent = None;
        let session = &state.session;
        if !session.is_active() || session.current_side() != Side::Ai || session.round() != round {
            debug!(session = %session.id(), round, "scheduled opponent turn skipped");
            return;
        }

        let result = state.session.run_opponent_turn(self.policy.as_ref());
        match result {
            Ok(turn) => {
                debug!(
                    session = %state.session.id(),
                    plays = turn.plays.len(),
                    status = %turn.end.status,
                    "opponent turn played"
                );
                self.after_mutation(&slot, &mut state);
            }
            Err(err) => {
                // Plays made before the failure stand. Publish them; the turn
                // timer still ends the turn.
                warn!(session = %state.session.id(), error = %err, "opponent turn failed");
                self.publish(&slot, &mut state);
            }
        }
    }

    /// Capture a snapshot and write it in the background.
    pub(crate) fn persist(self: &Arc<Self>, slot: &Arc<SessionSlot>, state: &mut SlotState) {
        let id = state.session.id();
        let bytes = match Snapshot::capture(&state.session).to_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(session = %id, error = %err, "snapshot encoding failed");
                return;
            }
        };
        state.revision += 1;
        let revision = state.revision;

        let hub = Arc::clone(self);
        let slot = Arc::clone(slot);
        tokio::spawn(async move {
            if let Err(err) = hub.write_revision(&slot, id, revision, bytes).await {
                warn!(session = %id, revision, error = %err, "snapshot write abandoned");
            }
        });
    }

    /// Write `bytes` unless a newer revision is already stored.
    pub(crate) async fn write_revision(
        &self,
        slot: &SessionSlot,
        id: SessionId,
        revision: u64,
        bytes: Vec<u8>,
    ) -> Result<(), EngineError> {
        let mut stored = slot.persisted.lock().await;
        if *stored >= revision {
            return Ok(());
        }
        self.put_with_retry(id, &bytes).await?;
        *stored = revision;
        Ok(())
    }

    async fn put_with_retry(&self, id: SessionId, bytes: &[u8]) -> Result<(), EngineError> {
        let mut delay = PERSIST_BACKOFF;
        let mut attempt = 0;
        loop {
            match self.store.put(id, bytes) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.config.persist_retries => {
                    attempt += 1;
                    warn!(session = %id, attempt, error = %err, "snapshot write failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
