//! Storable session snapshots.
//!
//! A `Snapshot` is a plain owned copy of everything needed to rebuild a
//! session: zones as `Vec`s, the RNG position, the instance-id counter and
//! the turn fields. Timer deadlines are not stored, only whether a timer was
//! armed; a restored session re-arms with the full timeout.
//!
//! ## Integrity
//!
//! `restore` refuses anything it cannot rebuild faithfully. Unknown formats,
//! a different catalog version, card ids the catalog lacks, impossible rounds,
//! stale effects and duplicate instance ids are all reported as integrity
//! errors. Nothing is patched up with defaults.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cards::{CardCatalog, CardInstance};
use crate::core::{
    EngineConfig, EngineError, GameRng, GameRngState, InstanceIds, PlayerState, SessionId, Side, SideMap,
};
use crate::rules::{Phase, SessionStatus, TurnController};
use crate::session::GameSession;
use crate::zones::Zones;

/// Bumped whenever the stored layout changes.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// One side, zones flattened to vectors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub health: i32,
    pub energy: i32,
    pub energy_per_turn: i32,
    /// Bottom first, top of deck last.
    pub deck: Vec<CardInstance>,
    pub hand: Vec<CardInstance>,
    pub field: Vec<CardInstance>,
}

impl PlayerSnapshot {
    fn capture(player: &PlayerState) -> Self {
        Self {
            health: player.health,
            energy: player.energy,
            energy_per_turn: player.energy_per_turn,
            deck: player.zones.deck.iter().cloned().collect(),
            hand: player.zones.hand.iter().cloned().collect(),
            field: player.zones.field.iter().cloned().collect(),
        }
    }

    fn units(&self) -> impl Iterator<Item = &CardInstance> {
        self.deck.iter().chain(self.hand.iter()).chain(self.field.iter())
    }

    fn into_state(self) -> PlayerState {
        PlayerState {
            health: self.health,
            energy: self.energy,
            energy_per_turn: self.energy_per_turn,
            zones: Zones {
                deck: self.deck.into_iter().collect(),
                hand: self.hand.into_iter().collect(),
                field: self.field.into_iter().collect(),
            },
        }
    }
}

/// Complete stored form of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub catalog_version: u32,
    pub id: SessionId,
    pub status: SessionStatus,
    pub round: u32,
    pub current: Side,
    pub phase: Phase,
    pub attacked: bool,
    pub timer_armed: bool,
    pub human: PlayerSnapshot,
    pub ai: PlayerSnapshot,
    pub rng: GameRngState,
    pub next_instance_id: u32,
}

impl Snapshot {
    /// Deep-copy `session`.
    #[must_use]
    pub fn capture(session: &GameSession) -> Self {
        let turn = session.turn();
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            catalog_version: session.catalog().version(),
            id: session.id(),
            status: session.status(),
            round: turn.round(),
            current: turn.current(),
            phase: turn.phase(),
            attacked: turn.attacked(),
            timer_armed: turn.timer().is_armed(),
            human: PlayerSnapshot::capture(session.player(Side::Human)),
            ai: PlayerSnapshot::capture(session.player(Side::Ai)),
            rng: session.rng_state(),
            next_instance_id: session.next_instance_id(),
        }
    }

    /// Rebuild a live session against `catalog`.
    ///
    /// ## Errors
    ///
    /// - `CorruptSnapshot` for an unknown format or inconsistent fields
    /// - `CatalogMismatch` if the snapshot was taken against another catalog
    ///   version
    /// - `MissingCatalogCard` for the first unit whose card is not in the
    ///   catalog
    pub fn restore(self, catalog: Arc<CardCatalog>, config: EngineConfig) -> Result<GameSession, EngineError> {
        self.validate(&catalog)?;

        let turn = TurnController::restore(
            config.turn_timeout(),
            self.round,
            self.current,
            self.phase,
            self.attacked,
            self.timer_armed,
        );
        let players = SideMap::from_pair(self.human.into_state(), self.ai.into_state());
        info!(session = %self.id, round = self.round, status = %self.status, "session restored");

        Ok(GameSession::from_parts(
            self.id,
            self.status,
            turn,
            players,
            GameRng::from_state(&self.rng),
            InstanceIds::starting_at(self.next_instance_id),
            catalog,
            config,
        ))
    }

    fn validate(&self, catalog: &CardCatalog) -> Result<(), EngineError> {
        let corrupt = |msg: String| Err(EngineError::CorruptSnapshot(msg));

        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return corrupt(format!("unsupported format version {}", self.format_version));
        }
        if self.catalog_version != catalog.version() {
            return Err(EngineError::CatalogMismatch {
                expected: catalog.version(),
                found: self.catalog_version,
            });
        }
        if self.round < 1 {
            return corrupt("round must be at least 1".to_string());
        }

        let consistent = if self.status.is_terminal() {
            self.phase == Phase::Terminated
        } else {
            self.phase == Phase::awaiting(self.current)
        };
        if !consistent {
            return corrupt(format!(
                "phase {:?} does not match status {} with {} to act",
                self.phase, self.status, self.current
            ));
        }

        let mut seen = FxHashSet::default();
        for unit in self.human.units().chain(self.ai.units()) {
            if !catalog.contains(unit.card_id) {
                return Err(EngineError::MissingCatalogCard {
                    card: unit.card_id,
                    instance: unit.instance_id,
                });
            }
            if unit.instance_id.raw() >= self.next_instance_id || !seen.insert(unit.instance_id) {
                return corrupt(format!("instance id {} is duplicated or unallocated", unit.instance_id));
            }
        }

        for unit in self.human.field.iter().chain(self.ai.field.iter()) {
            if let Some(effect) = unit.effects.iter().find(|e| !e.is_active(self.round)) {
                return corrupt(format!(
                    "{} effect on {} expired at round {}",
                    effect.kind, unit.instance_id, effect.expires_at_round
                ));
            }
        }

        Ok(())
    }

    /// Encode for the snapshot store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode bytes written by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
