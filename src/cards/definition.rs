//! Card definitions - static card data.
//!
//! `CardDefinition` holds the immutable properties of a card type: cost,
//! base stats, charge count and a structured ability descriptor. The
//! descriptor is interpreted by one generic ability system, so a new card
//! needs data, not code.
//!
//! Runtime values (current health, remaining charges, active modifiers)
//! live in `CardInstance`.

use serde::{Deserialize, Serialize};

use crate::core::EngineError;
use crate::effects::{EffectKind, Stat, TargetRule};

/// Unique identifier for a card definition.
///
/// This identifies the "type" of card (e.g., "Spark Imp"),
/// not a specific instance in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Structured description of what a card's ability does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDescriptor {
    pub kind: EffectKind,
    pub target: TargetRule,
    #[serde(default)]
    pub stat: Stat,
    /// Modifier amount, strike bonus, or death damage depending on `kind`.
    #[serde(default)]
    pub value: i32,
    /// Strikes with this ability ignore the defender's defense.
    #[serde(default)]
    pub pierce: bool,
}

impl AbilityDescriptor {
    /// A card with no ability.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: EffectKind::None,
            target: TargetRule::None,
            stat: Stat::Strength,
            value: 0,
            pierce: false,
        }
    }

    #[must_use]
    pub const fn attack(target: TargetRule, bonus: i32, pierce: bool) -> Self {
        Self {
            kind: EffectKind::Attack,
            target,
            stat: Stat::Strength,
            value: bonus,
            pierce,
        }
    }

    #[must_use]
    pub const fn defense(target: TargetRule, value: i32) -> Self {
        Self {
            kind: EffectKind::Defense,
            target,
            stat: Stat::Defense,
            value,
            pierce: false,
        }
    }

    #[must_use]
    pub const fn buff(target: TargetRule, stat: Stat, value: i32) -> Self {
        Self {
            kind: EffectKind::Buff,
            target,
            stat,
            value,
            pierce: false,
        }
    }

    #[must_use]
    pub const fn death(target: TargetRule, damage: i32) -> Self {
        Self {
            kind: EffectKind::Death,
            target,
            stat: Stat::Strength,
            value: damage,
            pierce: false,
        }
    }

    #[must_use]
    pub const fn passive() -> Self {
        Self {
            kind: EffectKind::Passive,
            target: TargetRule::SelfUnit,
            stat: Stat::Strength,
            value: 0,
            pierce: false,
        }
    }
}

impl Default for AbilityDescriptor {
    fn default() -> Self {
        Self::none()
    }
}

/// Static card definition.
///
/// ## Example
///
/// ```
/// use duel_engine::cards::{AbilityDescriptor, CardDefinition, CardId};
/// use duel_engine::effects::TargetRule;
///
/// let imp = CardDefinition::new(CardId::new(2), "Spark Imp")
///     .with_cost(1)
///     .with_stats(2, 2)
///     .with_charges(2)
///     .with_ability(AbilityDescriptor::attack(TargetRule::RandomEnemy, 1, false));
///
/// assert!(imp.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unique identifier for this card definition.
    pub id: CardId,

    /// Card name (for display/debugging).
    pub name: String,

    pub cost: i32,
    pub strength: i32,
    pub health: i32,

    /// Base defense, before modifiers.
    #[serde(default)]
    pub defense: i32,

    /// Number of ability activations before the unit leaves the field.
    pub charges: u32,

    #[serde(default)]
    pub ability: AbilityDescriptor,
}

impl CardDefinition {
    /// Create a definition with minimal legal stats (cost 1, 0/1, one charge).
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cost: 1,
            strength: 0,
            health: 1,
            defense: 0,
            charges: 1,
            ability: AbilityDescriptor::none(),
        }
    }

    #[must_use]
    pub fn with_cost(mut self, cost: i32) -> Self {
        self.cost = cost;
        self
    }

    /// Set base strength and health.
    #[must_use]
    pub fn with_stats(mut self, strength: i32, health: i32) -> Self {
        self.strength = strength;
        self.health = health;
        self
    }

    #[must_use]
    pub fn with_defense(mut self, defense: i32) -> Self {
        self.defense = defense;
        self
    }

    #[must_use]
    pub fn with_charges(mut self, charges: u32) -> Self {
        self.charges = charges;
        self
    }

    #[must_use]
    pub fn with_ability(mut self, ability: AbilityDescriptor) -> Self {
        self.ability = ability;
        self
    }

    /// Check the definition invariants.
    pub fn validate(&self) -> Result<(), EngineError> {
        let reason = if self.cost < 1 {
            "cost must be at least 1"
        } else if self.charges < 1 {
            "charges must be at least 1"
        } else if self.health < 1 {
            "health must be at least 1"
        } else if self.strength < 0 {
            "strength must not be negative"
        } else if self.defense < 0 {
            "defense must not be negative"
        } else {
            return Ok(());
        };

        Err(EngineError::InvalidCard {
            card: self.id,
            reason: reason.to_string(),
        })
    }
}
