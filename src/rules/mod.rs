//! Turn and match rules.
//!
//! - `turn`: Phase machine, round counter and the cancellable turn timer
//! - `outcome`: Session status and win conditions with the attacker tie-break
//! - `opponent`: Policies that drive the automated side

pub mod opponent;
pub mod outcome;
pub mod turn;

pub use opponent::{GreedyOpponent, IdleOpponent, OpponentPolicy};
pub use outcome::{evaluate, SessionStatus};
pub use turn::{Phase, TimerTicket, TurnController, TurnTimer};
