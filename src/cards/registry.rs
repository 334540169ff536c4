//! Card catalog for definition lookup.
//!
//! The `CardCatalog` is the immutable, versioned set of card definitions a
//! process serves. It is built once (from the built-in set or from JSON),
//! wrapped in an `Arc`, and never mutated while sessions read it.
//!
//! The version is stamped into every snapshot so a snapshot is never restored
//! against a catalog whose cards might mean something else.

use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::definition::{AbilityDescriptor, CardDefinition, CardId};
use crate::core::EngineError;
use crate::effects::{Stat, TargetRule};

/// Version of the built-in card set.
pub const STANDARD_CATALOG_VERSION: u32 = 1;

/// Deck the automated opponent plays with the built-in set.
pub const STANDARD_OPPONENT_DECK: [u32; 5] = [6, 7, 8, 9, 10];

/// Versioned registry of card definitions.
///
/// ## Example
///
/// ```
/// use duel_engine::cards::{CardCatalog, CardDefinition, CardId};
///
/// let mut catalog = CardCatalog::new(3);
/// catalog
///     .register(CardDefinition::new(CardId::new(1), "Recruit").with_stats(1, 2))
///     .unwrap();
///
/// assert_eq!(catalog.version(), 3);
/// assert_eq!(catalog.get(CardId::new(1)).unwrap().name, "Recruit");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardCatalog {
    version: u32,
    cards: FxHashMap<CardId, CardDefinition>,
}

/// On-disk catalog document.
#[derive(Deserialize)]
struct CatalogDocument {
    version: u32,
    cards: Vec<CardDefinition>,
}

impl CardCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new(version: u32) -> Self {
        Self {
            version,
            cards: FxHashMap::default(),
        }
    }

    /// Register a card definition.
    ///
    /// Rejects definitions that break the card invariants and duplicate IDs.
    pub fn register(&mut self, card: CardDefinition) -> Result<(), EngineError> {
        card.validate()?;
        if self.cards.contains_key(&card.id) {
            return Err(EngineError::InvalidCard {
                card: card.id,
                reason: "duplicate card id".to_string(),
            });
        }
        self.cards.insert(card.id, card);
        Ok(())
    }

    /// Load a catalog from `{"version": n, "cards": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let doc: CatalogDocument =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        let mut catalog = Self::new(doc.version);
        for card in doc.cards {
            catalog.register(card)?;
        }
        Ok(catalog)
    }

    /// The built-in card set.
    ///
    /// Returns an error only if the built-in definitions themselves are
    /// invalid, which the unit tests rule out.
    pub fn standard() -> Result<Self, EngineError> {
        use TargetRule::*;

        let card = |id: u32, name: &str, cost, strength, health, charges| {
            CardDefinition::new(CardId::new(id), name)
                .with_cost(cost)
                .with_stats(strength, health)
                .with_charges(charges)
        };

        let mut catalog = Self::new(STANDARD_CATALOG_VERSION);
        for def in [
            card(1, "Iron Vanguard", 2, 3, 5, 2)
                .with_defense(1)
                .with_ability(AbilityDescriptor::defense(SelfUnit, 2)),
            card(2, "Spark Imp", 1, 2, 2, 2)
                .with_ability(AbilityDescriptor::attack(RandomEnemy, 1, false)),
            card(3, "War Drummer", 3, 2, 4, 2)
                .with_ability(AbilityDescriptor::buff(AllAllies, Stat::Strength, 1)),
            card(4, "Shade Lancer", 2, 3, 3, 3)
                .with_ability(AbilityDescriptor::attack(WeakestEnemy, 0, true)),
            card(5, "Ashen Martyr", 2, 2, 3, 1)
                .with_ability(AbilityDescriptor::death(RandomEnemy, 3)),
            card(6, "Grave Sentinel", 2, 2, 6, 2)
                .with_defense(1)
                .with_ability(AbilityDescriptor::defense(AllAllies, 1)),
            card(7, "Hex Archer", 1, 2, 2, 2)
                .with_ability(AbilityDescriptor::attack(AllEnemies, 0, false)),
            card(8, "Mirage Dancer", 2, 2, 3, 2).with_ability(AbilityDescriptor::passive()),
            card(9, "Bone Colossus", 3, 4, 5, 1),
            card(10, "Plague Rat", 1, 1, 1, 1)
                .with_ability(AbilityDescriptor::death(WeakestEnemy, 2)),
            card(11, "Mana Wellspring", 3, 1, 3, 1)
                .with_ability(AbilityDescriptor::buff(SelfUnit, Stat::EnergyPerTurn, 1)),
        ] {
            catalog.register(def)?;
        }
        Ok(catalog)
    }

    /// Catalog version stamped into snapshots.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Get a card definition by ID.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.cards.get(&id)
    }

    /// Get a card definition, failing with `UnknownCard`.
    pub fn require(&self, id: CardId) -> Result<&CardDefinition, EngineError> {
        self.get(id).ok_or(EngineError::UnknownCard(id))
    }

    /// Check if a card ID is registered.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    /// Get the number of registered cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all definitions in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        let mut cards: Vec<_> = self.cards.values().collect();
        cards.sort_by_key(|c| c.id);
        cards.into_iter()
    }
}
