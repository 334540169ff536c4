//! Effect kinds and timed modifiers.
//!
//! An `ActiveEffect` is a modifier attached to a field unit that lapses at a
//! fixed round. A unit holds at most one effect per kind; applying another
//! effect of the same kind replaces the previous one.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// What a card's ability does. Also the kind tag of an `ActiveEffect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    /// Strike bonus and target rule, used every combat pass.
    Attack,
    /// Timed damage reduction installed on play.
    Defense,
    /// Timed stat modifier for allies, installed on play and refreshed in combat.
    Buff,
    /// Fires once when the unit's health first drops to zero or below.
    Death,
    /// One-shot evade of the first incoming hit.
    Passive,
    /// No ability.
    None,
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EffectKind::Attack => "ATTACK",
            EffectKind::Defense => "DEFENSE",
            EffectKind::Buff => "BUFF",
            EffectKind::Death => "DEATH",
            EffectKind::Passive => "PASSIVE",
            EffectKind::None => "NONE",
        };
        write!(f, "{}", name)
    }
}

/// Stat a modifier applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stat {
    #[default]
    Strength,
    Defense,
    /// Owner-level stat. Buffs on it change the side's income permanently
    /// instead of leaving a timed modifier.
    EnergyPerTurn,
}

/// A timed modifier on a unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub stat: Stat,
    pub value: i32,
    /// First round at which the effect no longer applies.
    pub expires_at_round: u32,
}

impl ActiveEffect {
    /// Create an effect applied during `round` that lasts `duration` rounds.
    ///
    /// `duration` is clamped to at least 1 so the expiry is always strictly
    /// after the round of application.
    #[must_use]
    pub fn new(kind: EffectKind, stat: Stat, value: i32, round: u32, duration: u32) -> Self {
        Self {
            kind,
            stat,
            value,
            expires_at_round: round + duration.max(1),
        }
    }

    /// Whether the effect still applies in `round`.
    #[must_use]
    pub fn is_active(&self, round: u32) -> bool {
        round < self.expires_at_round
    }
}

/// Per-unit effect list. Kinds are unique, so two inline slots cover the
/// common case (one defense plus one buff).
pub type EffectList = SmallVec<[ActiveEffect; 2]>;

/// Install `effect`, replacing any existing effect of the same kind.
pub fn install(effects: &mut EffectList, effect: ActiveEffect) {
    match effects.iter_mut().find(|e| e.kind == effect.kind) {
        Some(slot) => *slot = effect,
        None => effects.push(effect),
    }
}

/// Drop every effect that has lapsed by `round`. Returns how many were removed.
pub fn sweep(effects: &mut EffectList, round: u32) -> usize {
    let before = effects.len();
    effects.retain(|e| e.is_active(round));
    before - effects.len()
}
