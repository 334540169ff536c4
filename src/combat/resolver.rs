//! One combat pass for the attacking side.
//!
//! ## Steps
//!
//! 1. Expiry sweep on both fields.
//! 2. Buff propagation on both fields (a refresh, no charges spent).
//! 3. Each attacker, in field order:
//!    - pick targets by its strike profile (whole field by default, the
//!      opposing hero when that field is empty)
//!    - deal `max(str - def, 0) + bonus` per target, defense zero if piercing
//!    - spend a charge if the strike was an ability activation
//!    - run the death-trigger cascade, then remove the dead from both fields
//!
//! The only random step is `RandomEnemy` selection, drawn from the session RNG,
//! so a pass is fully determined by the seed.

use std::collections::VecDeque;

use tracing::debug;

use super::report::{CombatEvent, CombatReport};
use crate::abilities::{hit_target, AbilitySystem};
use crate::cards::CardCatalog;
use crate::core::{EngineConfig, EngineError, GameRng, InstanceId, PlayerState, Side, SideMap};
use crate::effects::{EffectResolver, Target, TargetSelector};

/// Runs combat passes.
#[derive(Clone, Copy)]
pub struct CombatResolver<'a> {
    abilities: AbilitySystem<'a>,
}

impl<'a> CombatResolver<'a> {
    #[must_use]
    pub fn new(catalog: &'a CardCatalog, config: &'a EngineConfig) -> Self {
        Self {
            abilities: AbilitySystem::new(catalog, config),
        }
    }

    /// Resolve one pass with `attacker`'s field striking.
    pub fn resolve(
        &self,
        attacker: Side,
        players: &mut SideMap<PlayerState>,
        round: u32,
        rng: &mut GameRng,
    ) -> Result<CombatReport, EngineError> {
        let defender = attacker.opponent();
        let mut report = CombatReport::new(attacker, round);

        for (_, player) in players.iter_mut() {
            report.expired += EffectResolver::sweep_field(&mut player.zones.field, round);
        }
        for (_, player) in players.iter_mut() {
            self.abilities.propagate_buffs(&mut player.zones.field, round)?;
        }

        let order: Vec<InstanceId> = players[attacker]
            .zones
            .field
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| u.instance_id)
            .collect();

        for id in order {
            let (atk, def) = players.split_mut(attacker);
            // Earlier cascades may have removed this unit.
            let Some(unit) = atk.zones.field_unit(id).filter(|u| u.is_alive()) else {
                continue;
            };
            let profile = self.abilities.strike_profile(unit)?;
            let strength = EffectResolver::effective_strength(unit, round);

            let mut dying = VecDeque::new();
            for target in TargetSelector::enemies(profile.rule, &def.zones.field, rng) {
                let defense = match target {
                    Target::Unit(t) => def
                        .zones
                        .field_unit(t)
                        .map_or(0, |u| EffectResolver::effective_defense(u, round)),
                    Target::Hero => 0,
                };
                let amount = EffectResolver::damage(strength, defense, profile.bonus, profile.pierce);

                if let Some(hit) = hit_target(def, target, amount) {
                    if let (true, Target::Unit(t)) = (hit.lethal, hit.target) {
                        dying.push_back((defender, t));
                    }
                    report.record_hit(defender, &hit);
                    report.events.push(CombatEvent::Strike {
                        attacker: id,
                        target_side: defender,
                        hit,
                    });
                }
            }

            if profile.spends_charge && AbilitySystem::spend_charge(&mut atk.zones, id) {
                report.events.push(CombatEvent::Exhausted {
                    side: attacker,
                    unit: id,
                });
            }

            self.run_cascade(players, dying, rng, &mut report)?;

            for side in Side::ALL {
                for dead in players[side].zones.remove_dead() {
                    report.events.push(CombatEvent::Died {
                        side,
                        unit: dead.instance_id,
                        card: dead.card_id,
                    });
                }
            }
        }

        debug!(
            attacker = %attacker,
            round,
            events = report.events.len(),
            deaths = report.deaths().count(),
            human_hero_damage = report.hero_damage[Side::Human],
            ai_hero_damage = report.hero_damage[Side::Ai],
            "combat resolved"
        );
        Ok(report)
    }

    /// Fire death abilities breadth-first until no new unit dies.
    ///
    /// Each unit reports lethal at most once, so the queue drains.
    fn run_cascade(
        &self,
        players: &mut SideMap<PlayerState>,
        mut queue: VecDeque<(Side, InstanceId)>,
        rng: &mut GameRng,
        report: &mut CombatReport,
    ) -> Result<(), EngineError> {
        while let Some((side, id)) = queue.pop_front() {
            let target_side = side.opponent();
            let (own, foe) = players.split_mut(side);

            for hit in self.abilities.fire_death(id, &mut own.zones, foe, rng)? {
                if let (true, Target::Unit(t)) = (hit.lethal, hit.target) {
                    queue.push_back((target_side, t));
                }
                report.record_hit(target_side, &hit);
                report.events.push(CombatEvent::DeathTrigger {
                    source: id,
                    target_side,
                    hit,
                });
            }
        }
        Ok(())
    }
}
