//! Descriptor-driven ability activation.
//!
//! `AbilitySystem` interprets a card's `AbilityDescriptor`; there is no
//! per-card code. Activation points by kind:
//!
//! | Kind      | Activates               | Effect                                     |
//! |-----------|-------------------------|--------------------------------------------|
//! | `Buff`    | on play                 | timed stat modifier on allies by rule       |
//! | `Defense` | on play                 | timed damage reduction on allies by rule    |
//! | `Passive` | on play                 | arms the one-shot evade                     |
//! | `Attack`  | each combat strike      | target rule, bonus and pierce of the strike |
//! | `Death`   | health first reaches 0  | damage to the opposing side (see `death`)   |
//! | `None`    | never                   |                                             |
//!
//! Every activation spends one charge. A unit with no charges left leaves the
//! field; modifiers it already installed stay until they expire.

use im::Vector;
use tracing::debug;

use crate::cards::{AbilityDescriptor, CardCatalog, CardDefinition, CardInstance};
use crate::core::{EngineConfig, EngineError, InstanceId, PlayerState};
use crate::effects::{ActiveEffect, EffectKind, EffectResolver, Stat, TargetRule, TargetSelector};
use crate::zones::Zones;

/// Result of one on-play activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activation {
    pub source: InstanceId,
    pub kind: EffectKind,
    /// Units that received a modifier or flag.
    pub affected: Vec<InstanceId>,
    /// The source ran out of charges and left the field.
    pub exhausted: bool,
}

/// How a unit strikes in combat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrikeProfile {
    pub rule: TargetRule,
    pub bonus: i32,
    pub pierce: bool,
    /// Striking counts as an ability activation.
    pub spends_charge: bool,
}

impl StrikeProfile {
    /// Plain strike against the whole opposing field.
    pub const DEFAULT: Self = Self {
        rule: TargetRule::AllEnemies,
        bonus: 0,
        pierce: false,
        spends_charge: false,
    };
}

/// Interprets ability descriptors against the catalog.
#[derive(Clone, Copy)]
pub struct AbilitySystem<'a> {
    catalog: &'a CardCatalog,
    config: &'a EngineConfig,
}

impl<'a> AbilitySystem<'a> {
    #[must_use]
    pub fn new(catalog: &'a CardCatalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Definition behind a unit. A unit whose card vanished from the catalog
    /// is an integrity failure.
    pub fn definition(&self, unit: &CardInstance) -> Result<&'a CardDefinition, EngineError> {
        self.catalog
            .get(unit.card_id)
            .ok_or(EngineError::MissingCatalogCard {
                card: unit.card_id,
                instance: unit.instance_id,
            })
    }

    pub fn ability(&self, unit: &CardInstance) -> Result<&'a AbilityDescriptor, EngineError> {
        Ok(&self.definition(unit)?.ability)
    }

    /// Activate the on-play ability of `source`, which must already be on
    /// `owner`'s field.
    ///
    /// Returns `None` for kinds that do not activate on play.
    pub fn activate_on_play(
        &self,
        owner: &mut PlayerState,
        source: InstanceId,
        round: u32,
    ) -> Result<Option<Activation>, EngineError> {
        let Some(unit) = owner.zones.field_unit(source) else {
            return Ok(None);
        };
        let ability = self.ability(unit)?;

        let affected = match ability.kind {
            EffectKind::Buff if ability.stat == Stat::EnergyPerTurn => {
                owner.energy_per_turn += ability.value;
                vec![source]
            }
            EffectKind::Buff => {
                Self::install_on_allies(&mut owner.zones.field, source, ability, round, self.config.buff_duration)
            }
            EffectKind::Defense => Self::install_on_allies(
                &mut owner.zones.field,
                source,
                ability,
                round,
                self.config.defense_duration,
            ),
            EffectKind::Passive => {
                if let Some(unit) = owner.zones.field_unit_mut(source) {
                    unit.evade_ready = true;
                }
                vec![source]
            }
            EffectKind::Attack | EffectKind::Death | EffectKind::None => return Ok(None),
        };

        let exhausted = Self::spend_charge(&mut owner.zones, source);
        debug!(
            unit = %source,
            kind = %ability.kind,
            affected = affected.len(),
            exhausted,
            "ability activated"
        );

        Ok(Some(Activation {
            source,
            kind: ability.kind,
            affected,
            exhausted,
        }))
    }

    /// Re-apply every field buff to current allies, refreshing expiry.
    ///
    /// This is a refresh, not an activation: no charges are spent. Owner-level
    /// buffs (`EnergyPerTurn`) are permanent and never re-applied.
    pub fn propagate_buffs(&self, field: &mut Vector<CardInstance>, round: u32) -> Result<usize, EngineError> {
        let mut sources = Vec::new();
        for unit in field.iter().filter(|u| u.is_alive()) {
            let ability = self.ability(unit)?;
            if ability.kind == EffectKind::Buff && ability.stat != Stat::EnergyPerTurn {
                sources.push((unit.instance_id, ability));
            }
        }

        let mut refreshed = 0;
        for (source, ability) in sources {
            refreshed +=
                Self::install_on_allies(field, source, ability, round, self.config.buff_duration).len();
        }
        Ok(refreshed)
    }

    /// How `unit` strikes in combat.
    ///
    /// `Attack` abilities with an enemy rule use that rule; `Attack` abilities
    /// naming allies or nothing fall back to the whole opposing field but keep
    /// their bonus and pierce. Every other unit strikes the whole field plainly.
    pub fn strike_profile(&self, unit: &CardInstance) -> Result<StrikeProfile, EngineError> {
        let ability = self.ability(unit)?;
        if ability.kind != EffectKind::Attack {
            return Ok(StrikeProfile::DEFAULT);
        }

        let rule = if ability.target.is_enemy_rule() {
            ability.target
        } else {
            TargetRule::AllEnemies
        };
        Ok(StrikeProfile {
            rule,
            bonus: ability.value,
            pierce: ability.pierce,
            spends_charge: true,
        })
    }

    /// Spend one charge of a field unit, removing it when exhausted.
    ///
    /// Returns `true` if the unit left the field.
    pub fn spend_charge(zones: &mut Zones, id: InstanceId) -> bool {
        let exhausted = match zones.field_unit_mut(id) {
            Some(unit) => unit.spend_charge(),
            None => return false,
        };
        if exhausted {
            zones.remove_from_field(id);
            debug!(unit = %id, "charges exhausted, unit leaves the field");
        }
        exhausted
    }

    fn install_on_allies(
        field: &mut Vector<CardInstance>,
        source: InstanceId,
        ability: &AbilityDescriptor,
        round: u32,
        duration: u32,
    ) -> Vec<InstanceId> {
        let targets = TargetSelector::allies(ability.target, source, field);
        for unit in field.iter_mut().filter(|u| targets.contains(&u.instance_id)) {
            EffectResolver::apply(
                unit,
                ActiveEffect::new(ability.kind, ability.stat, ability.value, round, duration),
            );
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardId;

    struct Fixture {
        catalog: CardCatalog,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                catalog: CardCatalog::standard().unwrap(),
                config: EngineConfig::default(),
            }
        }

        fn system(&self) -> AbilitySystem<'_> {
            AbilitySystem::new(&self.catalog, &self.config)
        }

        fn unit(&self, instance: u32, card: u32) -> CardInstance {
            CardInstance::from_definition(InstanceId(instance), self.catalog.get(CardId::new(card)).unwrap())
        }

        fn player_with_field(&self, units: &[(u32, u32)]) -> PlayerState {
            let mut zones = Zones::default();
            for &(instance, card) in units {
                zones.deploy(self.unit(instance, card));
            }
            PlayerState {
                health: 30,
                energy: 0,
                energy_per_turn: 1,
                zones,
            }
        }
    }

    #[test]
    fn test_buff_all_allies_includes_source() {
        let fx = Fixture::new();
        let mut player = fx.player_with_field(&[(1, 9), (2, 3)]);

        let activation = fx.system().activate_on_play(&mut player, InstanceId(2), 4).unwrap().unwrap();

        assert_eq!(activation.kind, EffectKind::Buff);
        assert_eq!(activation.affected, vec![InstanceId(1), InstanceId(2)]);
        assert!(!activation.exhausted);
        for unit in player.zones.field.iter() {
            let buff = unit.effect(EffectKind::Buff).unwrap();
            assert_eq!(buff.expires_at_round, 7);
            assert_eq!(buff.value, 1);
        }
        assert_eq!(player.zones.field_unit(InstanceId(2)).unwrap().charges, 1);
    }

    #[test]
    fn test_defense_self_only() {
        let fx = Fixture::new();
        let mut player = fx.player_with_field(&[(1, 9), (2, 1)]);

        fx.system().activate_on_play(&mut player, InstanceId(2), 1).unwrap();

        let guard = player.zones.field_unit(InstanceId(2)).unwrap().effect(EffectKind::Defense).unwrap();
        assert_eq!(guard.expires_at_round, 3);
        assert_eq!(guard.value, 2);
        assert!(player.zones.field_unit(InstanceId(1)).unwrap().effects.is_empty());
    }

    #[test]
    fn test_energy_buff_is_permanent_and_exhausts() {
        let fx = Fixture::new();
        let mut player = fx.player_with_field(&[(1, 11)]);

        let activation = fx.system().activate_on_play(&mut player, InstanceId(1), 1).unwrap().unwrap();

        assert_eq!(player.energy_per_turn, 2);
        assert!(activation.exhausted);
        assert!(player.zones.field.is_empty());
    }

    #[test]
    fn test_passive_arms_evade() {
        let fx = Fixture::new();
        let mut player = fx.player_with_field(&[(1, 8)]);

        fx.system().activate_on_play(&mut player, InstanceId(1), 1).unwrap();

        let unit = player.zones.field_unit(InstanceId(1)).unwrap();
        assert!(unit.evade_ready);
        assert_eq!(unit.charges, 1);
    }

    #[test]
    fn test_non_play_kinds_do_nothing() {
        let fx = Fixture::new();
        let mut player = fx.player_with_field(&[(1, 2), (2, 5), (3, 9)]);
        let before = player.clone();

        for id in 1..=3 {
            assert!(fx.system().activate_on_play(&mut player, InstanceId(id), 1).unwrap().is_none());
        }
        assert_eq!(player, before);
    }

    #[test]
    fn test_propagate_buffs_is_free() {
        let fx = Fixture::new();
        let mut player = fx.player_with_field(&[(1, 3), (2, 9)]);

        let refreshed = fx.system().propagate_buffs(&mut player.zones.field, 5).unwrap();

        assert_eq!(refreshed, 2);
        assert_eq!(player.zones.field[0].charges, 2);
        assert_eq!(player.zones.field[1].effect(EffectKind::Buff).unwrap().expires_at_round, 8);
    }

    #[test]
    fn test_strike_profiles() {
        let fx = Fixture::new();
        let sys = fx.system();

        let lancer = sys.strike_profile(&fx.unit(1, 4)).unwrap();
        assert_eq!(lancer.rule, TargetRule::WeakestEnemy);
        assert!(lancer.pierce);
        assert!(lancer.spends_charge);

        let imp = sys.strike_profile(&fx.unit(2, 2)).unwrap();
        assert_eq!(imp.bonus, 1);

        assert_eq!(sys.strike_profile(&fx.unit(3, 9)).unwrap(), StrikeProfile::DEFAULT);
    }

    #[test]
    fn test_missing_card_is_integrity_error() {
        let fx = Fixture::new();
        let mut ghost = fx.unit(1, 9);
        ghost.card_id = CardId::new(404);

        let err = fx.system().strike_profile(&ghost).unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingCatalogCard { card: CardId::new(404), instance: InstanceId(1) }
        );
    }
}
