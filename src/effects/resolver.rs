//! Effect resolution - pure stat and damage math.
//!
//! `EffectResolver` computes effective stats from a unit's active modifiers,
//! computes strike damage, and installs or expires timed modifiers. It never
//! looks at anything beyond the units it is handed.
//!
//! ## Damage
//!
//! ```text
//! damage = max(max(strength_eff - defense_eff, 0) + bonus, 0)
//! ```
//!
//! `defense_eff` is forced to zero for piercing strikes. The outer clamp keeps
//! damage non-negative even for negative bonuses or modifiers.

use im::Vector;

use super::effect::{self, ActiveEffect, EffectKind, Stat};
use crate::cards::CardInstance;

/// Stateless resolver for modifiers and damage.
pub struct EffectResolver;

impl EffectResolver {
    /// Sum of active modifiers of `kind` on `stat`.
    fn modifier(unit: &CardInstance, kind: EffectKind, stat: Stat, round: u32) -> i32 {
        unit.effects
            .iter()
            .filter(|e| e.kind == kind && e.stat == stat && e.is_active(round))
            .map(|e| e.value)
            .sum()
    }

    /// Current strength plus any active strength buff.
    #[must_use]
    pub fn effective_strength(unit: &CardInstance, round: u32) -> i32 {
        unit.strength + Self::modifier(unit, EffectKind::Buff, Stat::Strength, round)
    }

    /// Current defense plus active defense modifier and defense buff.
    #[must_use]
    pub fn effective_defense(unit: &CardInstance, round: u32) -> i32 {
        let guard: i32 = unit
            .effects
            .iter()
            .filter(|e| e.kind == EffectKind::Defense && e.is_active(round))
            .map(|e| e.value)
            .sum();
        unit.defense + guard + Self::modifier(unit, EffectKind::Buff, Stat::Defense, round)
    }

    /// Damage of one strike. Never negative.
    #[must_use]
    pub fn damage(strength: i32, defense: i32, bonus: i32, pierce: bool) -> i32 {
        let defense = if pierce { 0 } else { defense };
        ((strength - defense).max(0) + bonus).max(0)
    }

    /// Install a modifier on a unit, replacing any of the same kind.
    pub fn apply(unit: &mut CardInstance, effect: ActiveEffect) {
        effect::install(&mut unit.effects, effect);
    }

    /// Drop lapsed modifiers from every unit on a field.
    ///
    /// Returns the number of effects removed.
    pub fn sweep_field(field: &mut Vector<CardInstance>, round: u32) -> usize {
        field
            .iter_mut()
            .map(|unit| effect::sweep(&mut unit.effects, round))
            .sum()
    }
}
