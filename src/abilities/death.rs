//! Hits, evasion and death triggers.
//!
//! All damage to units and heroes goes through `hit_unit` / `hit_hero`, so the
//! one-shot `Passive` evade and the first-crossing death detection live in one
//! place.
//!
//! A death trigger is handed the dying unit's own zones and the opposing
//! player explicitly; it never works out ownership on its own.

use tracing::debug;

use super::system::AbilitySystem;
use crate::cards::CardInstance;
use crate::core::{EngineError, GameRng, InstanceId, PlayerState};
use crate::effects::{EffectKind, Target, TargetSelector};
use crate::zones::Zones;

/// One delivered hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    pub target: Target,
    /// Damage actually dealt (0 when evaded).
    pub damage: i32,
    pub evaded: bool,
    /// This hit took the unit from positive health to zero or below for the
    /// first time. Always `false` for heroes.
    pub lethal: bool,
}

/// Deal `amount` to a unit, consuming its evade if armed.
pub fn hit_unit(unit: &mut CardInstance, amount: i32) -> Hit {
    let target = Target::Unit(unit.instance_id);
    if unit.evade_ready {
        unit.evade_ready = false;
        return Hit {
            target,
            damage: 0,
            evaded: true,
            lethal: false,
        };
    }

    let damage = amount.max(0);
    let lethal = unit.take_damage(damage);
    Hit {
        target,
        damage,
        evaded: false,
        lethal,
    }
}

/// Deal `amount` to a side's hero.
pub fn hit_hero(player: &mut PlayerState, amount: i32) -> Hit {
    let damage = amount.max(0);
    player.health -= damage;
    Hit {
        target: Target::Hero,
        damage,
        evaded: false,
        lethal: false,
    }
}

/// Deliver a hit to a resolved target on `defender`'s side.
pub fn hit_target(defender: &mut PlayerState, target: Target, amount: i32) -> Option<Hit> {
    match target {
        Target::Hero => Some(hit_hero(defender, amount)),
        Target::Unit(id) => defender.zones.field_unit_mut(id).map(|unit| hit_unit(unit, amount)),
    }
}

impl AbilitySystem<'_> {
    /// Fire the death ability of `dying`.
    ///
    /// `own` is the dying unit's zones, `foe` the opposing player. Targets come
    /// from `foe`'s field by the ability's rule, or `foe`'s hero when that field
    /// is empty. Damage is the ability's raw value with no defense applied.
    ///
    /// Units without a `Death` ability produce no hits. The dying unit stays on
    /// its field; the caller removes the dead after the cascade.
    pub fn fire_death(
        &self,
        dying: InstanceId,
        own: &mut Zones,
        foe: &mut PlayerState,
        rng: &mut GameRng,
    ) -> Result<Vec<Hit>, EngineError> {
        let Some(unit) = own.field_unit_mut(dying) else {
            return Ok(Vec::new());
        };
        let ability = self.ability(unit)?;
        if ability.kind != EffectKind::Death {
            return Ok(Vec::new());
        }
        unit.spend_charge();

        let hits: Vec<Hit> = TargetSelector::enemies(ability.target, &foe.zones.field, rng)
            .into_iter()
            .filter_map(|target| hit_target(foe, target, ability.value))
            .collect();

        debug!(unit = %dying, hits = hits.len(), "death trigger fired");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardCatalog, CardId};
    use crate::core::EngineConfig;

    fn unit(catalog: &CardCatalog, instance: u32, card: u32) -> CardInstance {
        CardInstance::from_definition(InstanceId(instance), catalog.get(CardId::new(card)).unwrap())
    }

    fn player(units: Vec<CardInstance>) -> PlayerState {
        let mut zones = Zones::default();
        for u in units {
            zones.deploy(u);
        }
        PlayerState {
            health: 30,
            energy: 0,
            energy_per_turn: 1,
            zones,
        }
    }

    #[test]
    fn test_evade_negates_first_hit_only() {
        let catalog = CardCatalog::standard().unwrap();
        let mut dancer = unit(&catalog, 1, 8);
        dancer.evade_ready = true;

        let first = hit_unit(&mut dancer, 10);
        assert!(first.evaded);
        assert_eq!(first.damage, 0);
        assert_eq!(dancer.health, 3);

        let second = hit_unit(&mut dancer, 10);
        assert!(!second.evaded);
        assert!(second.lethal);
    }

    #[test]
    fn test_hero_hit() {
        let mut p = player(vec![]);
        let hit = hit_hero(&mut p, 4);
        assert_eq!(hit.target, Target::Hero);
        assert_eq!(p.health, 26);
        hit_hero(&mut p, -3);
        assert_eq!(p.health, 26);
    }

    #[test]
    fn test_death_hits_weakest_enemy() {
        let catalog = CardCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let system = AbilitySystem::new(&catalog, &config);
        let mut rng = GameRng::new(1);

        let mut own = player(vec![unit(&catalog, 1, 10)]);
        let mut foe = player(vec![unit(&catalog, 2, 9), unit(&catalog, 3, 7)]);
        own.zones.field_unit_mut(InstanceId(1)).unwrap().take_damage(5);

        let hits = system.fire_death(InstanceId(1), &mut own.zones, &mut foe, &mut rng).unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, Target::Unit(InstanceId(3)));
        assert_eq!(hits[0].damage, 2);
        assert!(hits[0].lethal);
        assert_eq!(own.zones.field[0].charges, 0);
    }

    #[test]
    fn test_death_on_empty_field_hits_hero() {
        let catalog = CardCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let system = AbilitySystem::new(&catalog, &config);
        let mut rng = GameRng::new(1);

        let mut own = player(vec![unit(&catalog, 1, 5)]);
        let mut foe = player(vec![]);

        let hits = system.fire_death(InstanceId(1), &mut own.zones, &mut foe, &mut rng).unwrap();

        assert_eq!(hits, vec![Hit { target: Target::Hero, damage: 3, evaded: false, lethal: false }]);
        assert_eq!(foe.health, 27);
    }

    #[test]
    fn test_non_death_unit_has_no_trigger() {
        let catalog = CardCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let system = AbilitySystem::new(&catalog, &config);
        let mut rng = GameRng::new(1);

        let mut own = player(vec![unit(&catalog, 1, 9)]);
        let mut foe = player(vec![]);

        let hits = system.fire_death(InstanceId(1), &mut own.zones, &mut foe, &mut rng).unwrap();
        assert!(hits.is_empty());
        assert_eq!(foe.health, 30);
    }
}
