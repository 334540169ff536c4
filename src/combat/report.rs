//! Record of one combat pass.

use crate::abilities::Hit;
use crate::cards::CardId;
use crate::core::{InstanceId, Side, SideMap};
use crate::effects::Target;

/// Something that happened during a combat pass, in resolution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CombatEvent {
    /// An attacking unit hit a target on `target_side`.
    Strike {
        attacker: InstanceId,
        target_side: Side,
        hit: Hit,
    },
    /// A dying unit's death ability hit a target on `target_side`.
    DeathTrigger {
        source: InstanceId,
        target_side: Side,
        hit: Hit,
    },
    /// A unit spent its last charge and left the field.
    Exhausted { side: Side, unit: InstanceId },
    /// A unit was removed with health at or below zero.
    Died {
        side: Side,
        unit: InstanceId,
        card: CardId,
    },
}

/// Outcome of `CombatResolver::resolve`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombatReport {
    pub attacker: Side,
    pub round: u32,
    /// Effects removed by the opening expiry sweep.
    pub expired: usize,
    pub events: Vec<CombatEvent>,
    /// Damage taken by each hero during the pass.
    pub hero_damage: SideMap<i32>,
}

impl CombatReport {
    #[must_use]
    pub fn new(attacker: Side, round: u32) -> Self {
        Self {
            attacker,
            round,
            expired: 0,
            events: Vec::new(),
            hero_damage: SideMap::with_value(0),
        }
    }

    pub(crate) fn record_hit(&mut self, target_side: Side, hit: &Hit) {
        if hit.target == Target::Hero {
            self.hero_damage[target_side] += hit.damage;
        }
    }

    /// Every strike, in order.
    pub fn strikes(&self) -> impl Iterator<Item = (InstanceId, Side, &Hit)> {
        self.events.iter().filter_map(|e| match e {
            CombatEvent::Strike { attacker, target_side, hit } => Some((*attacker, *target_side, hit)),
            _ => None,
        })
    }

    /// Every unit that died, in removal order.
    pub fn deaths(&self) -> impl Iterator<Item = (Side, InstanceId)> + '_ {
        self.events.iter().filter_map(|e| match e {
            CombatEvent::Died { side, unit, .. } => Some((*side, *unit)),
            _ => None,
        })
    }

    /// Number of hits dealt by `source`'s death ability.
    #[must_use]
    pub fn death_trigger_hits(&self, source: InstanceId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CombatEvent::DeathTrigger { source: s, .. } if *s == source))
            .count()
    }

    #[must_use]
    pub fn died(&self, unit: InstanceId) -> bool {
        self.deaths().any(|(_, u)| u == unit)
    }

    /// A pass with no strikes at all (both fields empty of attackers).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_hero_damage() {
        let mut report = CombatReport::new(Side::Human, 3);
        let hero_hit = Hit { target: Target::Hero, damage: 4, evaded: false, lethal: false };
        let unit_hit = Hit { target: Target::Unit(InstanceId(2)), damage: 9, evaded: false, lethal: true };

        report.record_hit(Side::Ai, &hero_hit);
        report.record_hit(Side::Ai, &unit_hit);

        assert_eq!(report.hero_damage[Side::Ai], 4);
        assert_eq!(report.hero_damage[Side::Human], 0);
    }

    #[test]
    fn test_queries() {
        let mut report = CombatReport::new(Side::Ai, 2);
        let hit = Hit { target: Target::Unit(InstanceId(5)), damage: 3, evaded: false, lethal: true };
        report.events.push(CombatEvent::Strike { attacker: InstanceId(1), target_side: Side::Human, hit });
        report.events.push(CombatEvent::DeathTrigger { source: InstanceId(5), target_side: Side::Ai, hit });
        report.events.push(CombatEvent::Died { side: Side::Human, unit: InstanceId(5), card: CardId::new(5) });

        assert_eq!(report.strikes().count(), 1);
        assert_eq!(report.death_trigger_hits(InstanceId(5)), 1);
        assert!(report.died(InstanceId(5)));
        assert!(!report.died(InstanceId(1)));
        assert!(!report.is_empty());
    }
}
