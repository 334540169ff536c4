//! Per-side player state.
//!
//! ## PlayerState
//!
//! - Hero health and the energy economy (current energy, income per turn)
//! - The side's deck, hand and field (`Zones`)
//!
//! Built once per side from a validated deck list. The deck is instantiated,
//! shuffled once with the session RNG, and the opening hand is drawn.

use serde::{Deserialize, Serialize};

use super::{EngineConfig, EngineError, GameRng, InstanceIds};
use crate::cards::{CardCatalog, CardId, CardInstance};
use crate::zones::Zones;

/// One side's health, energy and cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub health: i32,
    pub energy: i32,
    pub energy_per_turn: i32,
    pub zones: Zones,
}

impl PlayerState {
    /// Build a side from a deck list.
    ///
    /// ## Errors
    ///
    /// - `InvalidDeck` if the list is not exactly `config.deck_size` long
    /// - `UnknownCard` for the first id the catalog does not know
    pub fn create(
        deck_ids: &[u32],
        catalog: &CardCatalog,
        rng: &mut GameRng,
        ids: &mut InstanceIds,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        if deck_ids.len() != config.deck_size {
            return Err(EngineError::InvalidDeck {
                expected: config.deck_size,
                actual: deck_ids.len(),
            });
        }

        // Resolve every id before allocating anything.
        let defs = deck_ids
            .iter()
            .map(|&id| catalog.require(CardId::new(id)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut deck: Vec<CardInstance> = defs
            .into_iter()
            .map(|def| CardInstance::from_definition(ids.alloc(), def))
            .collect();
        rng.shuffle(&mut deck);

        let mut zones = Zones::new(deck.into_iter().collect());
        zones.draw(config.opening_hand, config.max_hand_size);

        Ok(Self {
            health: config.starting_health,
            energy: config.starting_energy,
            energy_per_turn: config.energy_per_turn,
            zones,
        })
    }

    /// Add this side's income, capped at `max_energy`. Returns the amount gained.
    pub fn credit_energy(&mut self, max_energy: i32) -> i32 {
        let before = self.energy;
        self.energy = (self.energy + self.energy_per_turn.max(0)).min(max_energy).max(before);
        self.energy - before
    }

    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    #[must_use]
    pub fn deck_count(&self) -> usize {
        self.zones.deck.len()
    }

    #[must_use]
    pub fn hand_count(&self) -> usize {
        self.zones.hand.len()
    }
}
