//! Match sessions.
//!
//! `GameSession` is the single owner of a match's state. Hosts that share a
//! session across tasks wrap it in the `hub`.

pub mod game;

pub use game::{GameSession, OpponentTurn, PlayOutcome, TurnOutcome};
