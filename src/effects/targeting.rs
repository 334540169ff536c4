//! Effect targeting.
//!
//! - `TargetRule`: Which units an ability addresses, as stored on a card
//! - `Target`: A resolved target, either a unit or the opposing hero
//! - `TargetSelector`: Turns a rule plus a field into concrete targets
//!
//! Only living units are ever selected. When the opposing field has no living
//! units, every enemy rule resolves to the opposing hero.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::CardInstance;
use crate::core::{GameRng, InstanceId};

/// Target rule carried by an ability descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetRule {
    /// The unit carrying the ability.
    #[serde(rename = "SELF")]
    SelfUnit,
    /// Every unit on the owner's field, including the source.
    AllAllies,
    /// One opposing unit chosen uniformly at random.
    RandomEnemy,
    /// The opposing unit with the lowest current health.
    WeakestEnemy,
    /// Every opposing unit.
    AllEnemies,
    None,
}

impl TargetRule {
    /// Whether the rule addresses the opposing side.
    #[must_use]
    pub const fn is_enemy_rule(self) -> bool {
        matches!(
            self,
            TargetRule::RandomEnemy | TargetRule::WeakestEnemy | TargetRule::AllEnemies
        )
    }
}

/// A concrete target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Unit(InstanceId),
    /// The opposing side's health pool.
    Hero,
}

/// Resolves target rules against a field.
pub struct TargetSelector;

impl TargetSelector {
    /// Pick enemy targets on `field` for `rule`.
    ///
    /// - `WeakestEnemy`: lowest health, ties to the lowest field index
    /// - `RandomEnemy`: one uniform pick from `rng`
    /// - `AllEnemies` and every non-enemy rule: the whole field
    ///
    /// The RNG is only consulted for `RandomEnemy` with at least one living unit,
    /// so selection on an empty field never advances the stream.
    pub fn enemies(rule: TargetRule, field: &Vector<CardInstance>, rng: &mut GameRng) -> Vec<Target> {
        let living: Vec<&CardInstance> = field.iter().filter(|u| u.is_alive()).collect();
        if living.is_empty() {
            return vec![Target::Hero];
        }

        match rule {
            TargetRule::WeakestEnemy => {
                // min_by_key keeps the first minimum, which is the lowest index.
                let weakest = living.iter().min_by_key(|u| u.health);
                weakest
                    .map(|u| vec![Target::Unit(u.instance_id)])
                    .unwrap_or_default()
            }
            TargetRule::RandomEnemy => rng
                .choose_index(living.len())
                .map(|i| vec![Target::Unit(living[i].instance_id)])
                .unwrap_or_default(),
            _ => living.iter().map(|u| Target::Unit(u.instance_id)).collect(),
        }
    }

    /// Pick friendly units on `field` for `rule`, relative to `source`.
    ///
    /// `SelfUnit` selects the source only. Every other rule selects all living
    /// allies, source included.
    #[must_use]
    pub fn allies(rule: TargetRule, source: InstanceId, field: &Vector<CardInstance>) -> Vec<InstanceId> {
        match rule {
            TargetRule::SelfUnit => field
                .iter()
                .filter(|u| u.instance_id == source && u.is_alive())
                .map(|u| u.instance_id)
                .collect(),
            _ => field
                .iter()
                .filter(|u| u.is_alive())
                .map(|u| u.instance_id)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId};

    fn unit(id: u32, health: i32) -> CardInstance {
        let def = CardDefinition::new(CardId::new(1), "Dummy").with_stats(1, health.max(1));
        let mut unit = CardInstance::from_definition(InstanceId(id), &def);
        unit.health = health;
        unit
    }

    fn field(units: &[(u32, i32)]) -> Vector<CardInstance> {
        units.iter().map(|&(id, hp)| unit(id, hp)).collect()
    }

    #[test]
    fn test_empty_field_targets_hero() {
        let mut rng = GameRng::new(1);
        let empty = Vector::new();
        for rule in [TargetRule::WeakestEnemy, TargetRule::RandomEnemy, TargetRule::AllEnemies] {
            assert_eq!(TargetSelector::enemies(rule, &empty, &mut rng), vec![Target::Hero]);
        }

        let dead_only = field(&[(1, 0), (2, -3)]);
        assert_eq!(
            TargetSelector::enemies(TargetRule::AllEnemies, &dead_only, &mut rng),
            vec![Target::Hero]
        );
    }

    #[test]
    fn test_empty_field_does_not_consume_rng() {
        let mut rng = GameRng::new(5);
        let before = rng.state();
        TargetSelector::enemies(TargetRule::RandomEnemy, &Vector::new(), &mut rng);
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn test_weakest_ties_to_lowest_index() {
        let mut rng = GameRng::new(1);
        let f = field(&[(1, 4), (2, 2), (3, 2), (4, 5)]);
        assert_eq!(
            TargetSelector::enemies(TargetRule::WeakestEnemy, &f, &mut rng),
            vec![Target::Unit(InstanceId(2))]
        );
    }

    #[test]
    fn test_random_is_deterministic_per_seed() {
        let f = field(&[(1, 4), (2, 2), (3, 2), (4, 5)]);
        let picks = |seed| {
            let mut rng = GameRng::new(seed);
            (0..8)
                .map(|_| TargetSelector::enemies(TargetRule::RandomEnemy, &f, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(11), picks(11));
        assert!(picks(11).iter().all(|t| t.len() == 1));
    }

    #[test]
    fn test_default_is_whole_field() {
        let mut rng = GameRng::new(1);
        let f = field(&[(1, 4), (2, 0), (3, 2)]);
        let expected = vec![Target::Unit(InstanceId(1)), Target::Unit(InstanceId(3))];

        assert_eq!(TargetSelector::enemies(TargetRule::AllEnemies, &f, &mut rng), expected);
        assert_eq!(TargetSelector::enemies(TargetRule::None, &f, &mut rng), expected);
        assert_eq!(TargetSelector::enemies(TargetRule::AllAllies, &f, &mut rng), expected);
    }

    #[test]
    fn test_allies() {
        let f = field(&[(1, 4), (2, 2), (3, 0)]);
        assert_eq!(
            TargetSelector::allies(TargetRule::SelfUnit, InstanceId(2), &f),
            vec![InstanceId(2)]
        );
        assert_eq!(
            TargetSelector::allies(TargetRule::AllAllies, InstanceId(2), &f),
            vec![InstanceId(1), InstanceId(2)]
        );
    }

    #[test]
    fn test_rule_serialization() {
        assert_eq!(serde_json::to_string(&TargetRule::SelfUnit).unwrap(), "\"SELF\"");
        assert_eq!(
            serde_json::to_string(&TargetRule::WeakestEnemy).unwrap(),
            "\"WEAKEST_ENEMY\""
        );
        assert!(TargetRule::RandomEnemy.is_enemy_rule());
        assert!(!TargetRule::AllAllies.is_enemy_rule());
    }
}
