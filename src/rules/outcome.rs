//! Session status and win conditions.
//!
//! Checked after every pass that changes health:
//!
//! - human hero at or below zero: `AiWin`
//! - AI hero at or below zero: `HumanWin`
//! - both in the same pass: the side that was attacking wins, i.e. the side
//!   that dealt the lethal blow

use serde::{Deserialize, Serialize};

use crate::core::{PlayerState, Side, SideMap};

/// Lifecycle status of a session. Every value but `Active` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    HumanWin,
    AiWin,
    /// Torn down by the host while still in play.
    Aborted,
}

impl SessionStatus {
    /// Status for a win by `side`.
    #[must_use]
    pub const fn win_for(side: Side) -> Self {
        match side {
            Side::Human => SessionStatus::HumanWin,
            Side::Ai => SessionStatus::AiWin,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    /// The winning side, if the session ended with a winner.
    #[must_use]
    pub const fn winner(self) -> Option<Side> {
        match self {
            SessionStatus::HumanWin => Some(Side::Human),
            SessionStatus::AiWin => Some(Side::Ai),
            SessionStatus::Active | SessionStatus::Aborted => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionStatus::Active => "active",
            SessionStatus::HumanWin => "human_win",
            SessionStatus::AiWin => "ai_win",
            SessionStatus::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// Evaluate win conditions after a pass in which `attacker` was striking.
#[must_use]
pub fn evaluate(players: &SideMap<PlayerState>, attacker: Side) -> SessionStatus {
    match (players[Side::Human].is_defeated(), players[Side::Ai].is_defeated()) {
        (false, false) => SessionStatus::Active,
        (true, false) => SessionStatus::AiWin,
        (false, true) => SessionStatus::HumanWin,
        (true, true) => SessionStatus::win_for(attacker),
    }
}
