//! The game session aggregate.
//!
//! `GameSession` owns both sides' state, the turn controller, the RNG and the
//! instance-id allocator. All mutation goes through its methods, and every
//! method validates fully before it changes anything, so a rejected request
//! leaves the session untouched.
//!
//! ## Turn flow
//!
//! ```text
//! start ──► human acts (play_card*, attack?) ──► end_turn / timer
//!              ▲                                     │
//!              │                     combat if no attack yet, win check
//!              │                                     ▼
//!        end_turn(Ai) ◄── AI acts (policy) ◄── flip, round+1, sweep,
//!                                              energy, draw, re-arm
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::abilities::{AbilitySystem, Activation};
use crate::cards::{CardCatalog, CardId, STANDARD_OPPONENT_DECK};
use crate::combat::{CombatReport, CombatResolver};
use crate::core::{
    EngineConfig, EngineError, ErrorKind, GameRng, GameRngState, InstanceId, InstanceIds, PlayerState, SessionId,
    Side, SideMap,
};
use crate::effects::EffectResolver;
use crate::rules::{evaluate, OpponentPolicy, Phase, SessionStatus, TimerTicket, TurnController};
use crate::snapshot::PublicSnapshot;

/// Result of a successful `play_card`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayOutcome {
    pub side: Side,
    pub card: CardId,
    pub instance: InstanceId,
    pub cost: i32,
    /// The on-play ability, if the card has one.
    pub activation: Option<Activation>,
}

/// Result of ending a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Side whose turn ended.
    pub ended: Side,
    /// Combat run on the way out, when the side had not attacked yet.
    pub combat: Option<CombatReport>,
    pub status: SessionStatus,
    /// Timer armed for the next turn. `None` when the session ended.
    pub next: Option<TimerTicket>,
    /// Cards drawn by the side now to act.
    pub drawn: usize,
}

/// Everything the automated side did in one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpponentTurn {
    pub plays: Vec<PlayOutcome>,
    pub end: TurnOutcome,
}

/// One match between the human and the automated opponent.
#[derive(Clone, Debug)]
pub struct GameSession {
    id: SessionId,
    status: SessionStatus,
    turn: TurnController,
    players: SideMap<PlayerState>,
    rng: GameRng,
    ids: InstanceIds,
    catalog: Arc<CardCatalog>,
    config: EngineConfig,
}

impl GameSession {
    /// Start a match with an explicit opponent deck.
    ///
    /// Builds and shuffles both decks (human first), credits the human's first
    /// turn and arms the timer.
    pub fn new(
        id: SessionId,
        human_deck: &[u32],
        ai_deck: &[u32],
        catalog: Arc<CardCatalog>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let mut rng = config.seed.map_or_else(GameRng::from_entropy, GameRng::new);
        let mut ids = InstanceIds::default();
        let human = PlayerState::create(human_deck, &catalog, &mut rng, &mut ids, &config)?;
        let ai = PlayerState::create(ai_deck, &catalog, &mut rng, &mut ids, &config)?;

        let mut session = Self {
            id,
            status: SessionStatus::Active,
            turn: TurnController::new(config.turn_timeout()),
            players: SideMap::from_pair(human, ai),
            rng,
            ids,
            catalog,
            config,
        };

        session.players[Side::Human].credit_energy(session.config.max_energy);
        session.turn.start();
        info!(
            session = %session.id,
            seed = session.rng.seed(),
            catalog_version = session.catalog.version(),
            "match started"
        );
        Ok(session)
    }

    /// Start a match against the standard opponent deck with a fresh id.
    pub fn start(human_deck: &[u32], catalog: Arc<CardCatalog>, config: EngineConfig) -> Result<Self, EngineError> {
        Self::new(SessionId::new_v4(), human_deck, &STANDARD_OPPONENT_DECK, catalog, config)
    }

    /// Reassemble a session from restored parts. Callers validate first.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: SessionId,
        status: SessionStatus,
        turn: TurnController,
        players: SideMap<PlayerState>,
        rng: GameRng,
        ids: InstanceIds,
        catalog: Arc<CardCatalog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            id,
            status,
            turn,
            players,
            rng,
            ids,
            catalog,
            config,
        }
    }

    // === Actions ===

    /// Play the first copy of `card` from `side`'s hand onto its field.
    ///
    /// ## Errors
    ///
    /// Checked in this order, nothing changes on failure:
    /// `SessionTerminated`, `NotYourTurn`, `CardNotInHand`,
    /// `InsufficientEnergy`, `FieldFull`.
    pub fn play_card(&mut self, side: Side, card: CardId) -> Result<PlayOutcome, EngineError> {
        self.ensure_active()?;
        self.ensure_turn(side)?;

        let player = &self.players[side];
        let index = player
            .zones
            .hand_position(card)
            .ok_or(EngineError::CardNotInHand(card))?;
        let def = self.catalog.get(card).ok_or(EngineError::MissingCatalogCard {
            card,
            instance: player.zones.hand[index].instance_id,
        })?;
        if def.cost > player.energy {
            return Err(EngineError::InsufficientEnergy {
                cost: def.cost,
                energy: player.energy,
            });
        }
        if player.zones.field.len() >= self.config.max_field_size {
            return Err(EngineError::FieldFull {
                max: self.config.max_field_size,
            });
        }

        let cost = def.cost;
        let round = self.turn.round();
        let player = &mut self.players[side];
        let unit = player.zones.take_from_hand(card).ok_or(EngineError::CardNotInHand(card))?;
        let instance = unit.instance_id;
        player.zones.deploy(unit);
        player.energy -= cost;

        let activation = AbilitySystem::new(&self.catalog, &self.config).activate_on_play(player, instance, round)?;
        debug!(
            session = %self.id,
            side = %side,
            card = %card,
            unit = %instance,
            energy_left = player.energy,
            "card played"
        );

        Ok(PlayOutcome {
            side,
            card,
            instance,
            cost,
            activation,
        })
    }

    /// Resolve `side`'s combat now instead of at the end of the turn.
    ///
    /// Allowed once per turn.
    pub fn attack(&mut self, side: Side) -> Result<CombatReport, EngineError> {
        self.ensure_active()?;
        self.ensure_turn(side)?;
        if self.turn.attacked() {
            return Err(EngineError::AlreadyAttacked);
        }

        let report = self.run_combat(side)?;
        self.turn.mark_attacked();
        self.check_outcome(side);
        Ok(report)
    }

    /// End `side`'s turn.
    ///
    /// Runs the side's combat if it has not attacked, checks the win
    /// conditions, then hands the turn to the other side. Does not run the
    /// opponent; see `end_turn_and_respond`.
    pub fn end_turn(&mut self, side: Side) -> Result<TurnOutcome, EngineError> {
        self.ensure_active()?;
        self.ensure_turn(side)?;
        self.finish_turn()
    }

    /// End `side`'s turn and, if the opponent is now to act, play its whole
    /// turn with `policy` before returning.
    pub fn end_turn_and_respond(
        &mut self,
        side: Side,
        policy: &dyn OpponentPolicy,
    ) -> Result<(TurnOutcome, Option<OpponentTurn>), EngineError> {
        let outcome = self.end_turn(side)?;
        if self.is_active() && self.turn.current() == Side::Ai {
            let reply = self.run_opponent_turn(policy)?;
            return Ok((outcome, Some(reply)));
        }
        Ok((outcome, None))
    }

    /// Play the automated side's turn: cards chosen by `policy`, then end turn.
    pub fn run_opponent_turn(&mut self, policy: &dyn OpponentPolicy) -> Result<OpponentTurn, EngineError> {
        self.ensure_active()?;
        self.ensure_turn(Side::Ai)?;

        let mut plays = Vec::new();
        while let Some(card) = policy.choose_play(&self.players[Side::Ai], &self.catalog, &self.config) {
            match self.play_card(Side::Ai, card) {
                Ok(play) => plays.push(play),
                Err(err) if err.kind() != ErrorKind::Integrity => {
                    debug!(session = %self.id, card = %card, error = %err, "opponent play rejected");
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        let end = self.end_turn(Side::Ai)?;
        Ok(OpponentTurn { plays, end })
    }

    /// Timer expiry for the turn named by `ticket`.
    ///
    /// A ticket for a turn that already ended is ignored and returns
    /// `Ok(false)`. A current ticket ends the turn exactly like `end_turn`.
    pub fn expire_turn(&mut self, ticket: TimerTicket) -> Result<bool, EngineError> {
        if !self.turn.ticket_is_current(ticket) {
            warn!(
                session = %self.id,
                ticket_round = ticket.round,
                round = self.turn.round(),
                "stale turn timer ignored"
            );
            return Ok(false);
        }
        self.ensure_active()?;

        info!(session = %self.id, side = %ticket.side, round = ticket.round, "turn timed out");
        self.finish_turn()?;
        Ok(true)
    }

    /// End the session without a winner. No-op on a finished session.
    pub fn abort(&mut self) {
        if self.is_active() {
            self.status = SessionStatus::Aborted;
            self.turn.terminate();
            info!(session = %self.id, round = self.turn.round(), "session aborted");
        }
    }

    /// Redacted view for `side`.
    #[must_use]
    pub fn view(&self, side: Side) -> PublicSnapshot {
        PublicSnapshot::for_perspective(self, side)
    }

    // === Internals ===

    fn ensure_active(&self) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            Err(EngineError::SessionTerminated)
        } else {
            Ok(())
        }
    }

    fn ensure_turn(&self, side: Side) -> Result<(), EngineError> {
        if self.turn.is_turn(side) {
            Ok(())
        } else {
            Err(EngineError::NotYourTurn {
                side,
                current: self.turn.current(),
            })
        }
    }

    fn run_combat(&mut self, attacker: Side) -> Result<CombatReport, EngineError> {
        CombatResolver::new(&self.catalog, &self.config).resolve(
            attacker,
            &mut self.players,
            self.turn.round(),
            &mut self.rng,
        )
    }

    /// Apply win conditions after a pass by `attacker`. Returns `true` if the
    /// session just ended.
    fn check_outcome(&mut self, attacker: Side) -> bool {
        let status = evaluate(&self.players, attacker);
        if !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.turn.terminate();
        info!(
            session = %self.id,
            status = %status,
            round = self.turn.round(),
            human_health = self.players[Side::Human].health,
            ai_health = self.players[Side::Ai].health,
            "match over"
        );
        true
    }

    fn finish_turn(&mut self) -> Result<TurnOutcome, EngineError> {
        let ended = self.turn.current();

        let combat = if self.turn.attacked() {
            None
        } else {
            let report = self.run_combat(ended)?;
            self.turn.mark_attacked();
            Some(report)
        };

        if self.check_outcome(ended) {
            return Ok(TurnOutcome {
                ended,
                combat,
                status: self.status,
                next: None,
                drawn: 0,
            });
        }

        let ticket = self.turn.advance();
        let round = self.turn.round();
        for (_, player) in self.players.iter_mut() {
            EffectResolver::sweep_field(&mut player.zones.field, round);
        }

        let next = self.turn.current();
        let player = &mut self.players[next];
        let gained = player.credit_energy(self.config.max_energy);
        let drawn = player.zones.draw(self.config.draw_per_turn, self.config.max_hand_size);
        info!(
            session = %self.id,
            ended = %ended,
            next = %next,
            round,
            gained,
            drawn,
            "turn advanced"
        );

        Ok(TurnOutcome {
            ended,
            combat,
            status: self.status,
            next: Some(ticket),
            drawn,
        })
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.turn.round()
    }

    #[must_use]
    pub fn current_side(&self) -> Side {
        self.turn.current()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }

    #[must_use]
    pub fn turn(&self) -> &TurnController {
        &self.turn
    }

    /// Ticket of the armed turn timer, if any.
    #[must_use]
    pub fn timer_ticket(&self) -> Option<TimerTicket> {
        self.turn.timer().ticket()
    }

    #[must_use]
    pub fn player(&self, side: Side) -> &PlayerState {
        &self.players[side]
    }

    #[must_use]
    pub fn players(&self) -> &SideMap<PlayerState> {
        &self.players
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<CardCatalog> {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn rng_state(&self) -> GameRngState {
        self.rng.state()
    }

    /// The id the next dealt card instance would get.
    #[must_use]
    pub fn next_instance_id(&self) -> u32 {
        self.ids.peek()
    }
}
