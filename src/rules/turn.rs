//! Turn controller: phase, round counter and the turn timer.
//!
//! ## Phases
//!
//! ```text
//! AwaitingHuman --advance--> AwaitingAi --advance--> AwaitingHuman ...
//!        \                        \
//!         `---terminate-----------`---> Terminated
//! ```
//!
//! Every `advance` increments the round by one, whichever side was active.
//!
//! ## Timer tickets
//!
//! Arming the timer issues a `TimerTicket { round, side }`. A timer that fires
//! presents its ticket; it only counts if it still names the current round and
//! side. Any other path that ends the turn moves the round on, so a late timer
//! is recognised as stale without having to win a race against cancellation.
//!
//! The deadline is fixed when the timer is armed and only moves when the turn
//! ends. It is read from tokio's clock, so a paused runtime controls it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::core::Side;

/// Turn state machine phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingHuman,
    AwaitingAi,
    Terminated,
}

impl Phase {
    /// The phase in which `side` acts.
    #[must_use]
    pub const fn awaiting(side: Side) -> Self {
        match side {
            Side::Human => Phase::AwaitingHuman,
            Side::Ai => Phase::AwaitingAi,
        }
    }
}

/// Identifies one armed turn timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerTicket {
    pub round: u32,
    pub side: Side,
}

/// Cancellable turn deadline.
///
/// Holds no thread or task; the host schedules the wake-up and presents the
/// ticket back.
#[derive(Clone, Debug)]
pub struct TurnTimer {
    timeout: Duration,
    deadline: Option<Instant>,
    ticket: Option<TimerTicket>,
}

impl TurnTimer {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
            ticket: None,
        }
    }

    /// Arm for the turn of `side` in `round`, replacing any armed deadline.
    pub fn arm(&mut self, round: u32, side: Side) -> TimerTicket {
        let ticket = TimerTicket { round, side };
        self.deadline = Some(Instant::now() + self.timeout);
        self.ticket = Some(ticket);
        ticket
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.ticket = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.ticket.is_some()
    }

    #[must_use]
    pub fn ticket(&self) -> Option<TimerTicket> {
        self.ticket
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left before the deadline, zero once passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

/// Whose turn it is, which round, and the turn timer.
#[derive(Clone, Debug)]
pub struct TurnController {
    phase: Phase,
    round: u32,
    current: Side,
    attacked: bool,
    timer: TurnTimer,
}

impl TurnController {
    /// Round 1, human to act, timer not yet armed.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            phase: Phase::AwaitingHuman,
            round: 1,
            current: Side::Human,
            attacked: false,
            timer: TurnTimer::new(timeout),
        }
    }

    /// Rebuild from stored fields. Re-arms a fresh timer relative to now when
    /// `timer_armed` is set and the phase is live.
    #[must_use]
    pub fn restore(
        timeout: Duration,
        round: u32,
        current: Side,
        phase: Phase,
        attacked: bool,
        timer_armed: bool,
    ) -> Self {
        let mut turn = Self {
            phase,
            round,
            current,
            attacked,
            timer: TurnTimer::new(timeout),
        };
        if timer_armed && phase != Phase::Terminated {
            turn.timer.arm(round, current);
        }
        turn
    }

    /// Arm the timer for the first turn.
    pub fn start(&mut self) -> TimerTicket {
        self.timer.arm(self.round, self.current)
    }

    /// Move to the other side's turn: cancel the timer, flip, increment the
    /// round and re-arm.
    pub fn advance(&mut self) -> TimerTicket {
        self.timer.cancel();
        self.current = self.current.opponent();
        self.round += 1;
        self.attacked = false;
        self.phase = Phase::awaiting(self.current);
        self.timer.arm(self.round, self.current)
    }

    /// Enter `Terminated`. No timer stays armed.
    pub fn terminate(&mut self) {
        self.timer.cancel();
        self.phase = Phase::Terminated;
    }

    /// Whether `ticket` names the current turn.
    #[must_use]
    pub fn ticket_is_current(&self, ticket: TimerTicket) -> bool {
        ticket.round == self.round && ticket.side == self.current
    }

    pub fn mark_attacked(&mut self) {
        self.attacked = true;
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn current(&self) -> Side {
        self.current
    }

    #[must_use]
    pub fn is_turn(&self, side: Side) -> bool {
        self.phase == Phase::awaiting(side)
    }

    #[must_use]
    pub fn attacked(&self) -> bool {
        self.attacked
    }

    #[must_use]
    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }
}
