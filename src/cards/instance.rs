//! Card instances - runtime card state.
//!
//! `CardInstance` is one physical copy of a definition inside a session. It
//! lives in exactly one zone at a time (deck, hand or field) and is moved, not
//! cloned, when it changes zones.

use serde::{Deserialize, Serialize};

use super::definition::{CardDefinition, CardId};
use crate::core::InstanceId;
use crate::effects::{ActiveEffect, EffectKind, EffectList};

/// A card instance in a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique ID for this copy within the session.
    pub instance_id: InstanceId,

    /// Reference to the card definition.
    pub card_id: CardId,

    /// Copied from the definition for display.
    pub name: String,

    pub strength: i32,
    pub health: i32,
    pub defense: i32,

    /// Ability activations left before the unit leaves the field.
    pub charges: u32,

    /// Timed modifiers, at most one per kind.
    #[serde(default)]
    pub effects: EffectList,

    /// One-shot evade armed by a `Passive` ability.
    #[serde(default)]
    pub evade_ready: bool,

    /// Set once the unit's death ability has been handled.
    #[serde(default)]
    pub death_fired: bool,
}

impl CardInstance {
    /// Instantiate a fresh copy of `def`.
    #[must_use]
    pub fn from_definition(instance_id: InstanceId, def: &CardDefinition) -> Self {
        Self {
            instance_id,
            card_id: def.id,
            name: def.name.clone(),
            strength: def.strength,
            health: def.health,
            defense: def.defense,
            charges: def.charges,
            effects: EffectList::new(),
            evade_ready: false,
            death_fired: false,
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// The active effect of the given kind, if any.
    #[must_use]
    pub fn effect(&self, kind: EffectKind) -> Option<&ActiveEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    /// Lose `amount` health.
    ///
    /// Returns `true` exactly once: on the hit that first takes the unit from
    /// positive health to zero or below.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.is_alive();
        self.health -= amount.max(0);
        if was_alive && !self.is_alive() && !self.death_fired {
            self.death_fired = true;
            true
        } else {
            false
        }
    }

    /// Spend one charge. Returns `true` if the unit is now exhausted.
    pub fn spend_charge(&mut self) -> bool {
        self.charges = self.charges.saturating_sub(1);
        self.charges == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::AbilityDescriptor;
    use crate::effects::{Stat, TargetRule};

    fn martyr() -> CardDefinition {
        CardDefinition::new(CardId::new(5), "Ashen Martyr")
            .with_cost(2)
            .with_stats(2, 3)
            .with_charges(1)
            .with_ability(AbilityDescriptor::death(TargetRule::RandomEnemy, 3))
    }

    #[test]
    fn test_from_definition() {
        let unit = CardInstance::from_definition(InstanceId(4), &martyr());

        assert_eq!(unit.instance_id, InstanceId(4));
        assert_eq!(unit.card_id, CardId::new(5));
        assert_eq!(unit.name, "Ashen Martyr");
        assert_eq!(unit.health, 3);
        assert_eq!(unit.charges, 1);
        assert!(unit.effects.is_empty());
        assert!(!unit.evade_ready);
    }

    #[test]
    fn test_death_crossing_reported_once() {
        let mut unit = CardInstance::from_definition(InstanceId(1), &martyr());

        assert!(!unit.take_damage(2));
        assert!(unit.take_damage(4));
        assert_eq!(unit.health, -3);
        assert!(!unit.take_damage(1));
        assert!(unit.death_fired);
    }

    #[test]
    fn test_negative_damage_ignored() {
        let mut unit = CardInstance::from_definition(InstanceId(1), &martyr());
        unit.take_damage(-5);
        assert_eq!(unit.health, 3);
    }

    #[test]
    fn test_spend_charge() {
        let mut unit = CardInstance::from_definition(InstanceId(1), &martyr());
        unit.charges = 2;
        assert!(!unit.spend_charge());
        assert!(unit.spend_charge());
        assert!(unit.spend_charge());
        assert_eq!(unit.charges, 0);
    }

    #[test]
    fn test_effect_lookup() {
        let mut unit = CardInstance::from_definition(InstanceId(1), &martyr());
        unit.effects
            .push(ActiveEffect::new(EffectKind::Buff, Stat::Strength, 1, 1, 3));

        assert!(unit.effect(EffectKind::Buff).is_some());
        assert!(unit.effect(EffectKind::Defense).is_none());
    }
}
