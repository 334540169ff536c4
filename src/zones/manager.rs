//! Zone storage and card movement for one side.
//!
//! `Zones` owns a side's three card containers:
//! - deck: ordered, the back of the vector is the top card
//! - hand: capped by the caller-supplied hand limit
//! - field: index order is resolution order
//!
//! Every move takes the `CardInstance` out of one vector and pushes it into
//! another, so an instance can never be present in two zones at once.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::{CardId, CardInstance};
use crate::core::InstanceId;

/// One of the three card containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Deck,
    Hand,
    Field,
}

/// A side's deck, hand and field.
///
/// ## Usage
///
/// ```
/// use duel_engine::cards::{CardDefinition, CardId, CardInstance};
/// use duel_engine::core::InstanceId;
/// use duel_engine::zones::{Zone, Zones};
///
/// let def = CardDefinition::new(CardId::new(1), "Recruit");
/// let deck = (1..=3).map(|i| CardInstance::from_definition(InstanceId(i), &def)).collect();
///
/// let mut zones = Zones::new(deck);
/// assert_eq!(zones.draw(2, 7), 2);
///
/// // Top of the deck is the back.
/// assert_eq!(zones.locate(InstanceId(3)), Some(Zone::Hand));
/// assert_eq!(zones.locate(InstanceId(1)), Some(Zone::Deck));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zones {
    pub deck: Vector<CardInstance>,
    pub hand: Vector<CardInstance>,
    pub field: Vector<CardInstance>,
}

impl Zones {
    /// Start with every card in the deck.
    #[must_use]
    pub fn new(deck: Vector<CardInstance>) -> Self {
        Self {
            deck,
            hand: Vector::new(),
            field: Vector::new(),
        }
    }

    /// Draw up to `count` cards from the top of the deck.
    ///
    /// Stops early when the deck runs out or the hand reaches `max_hand`.
    /// Never fails; returns how many cards moved.
    pub fn draw(&mut self, count: usize, max_hand: usize) -> usize {
        let mut drawn = 0;
        while drawn < count && self.hand.len() < max_hand {
            match self.deck.pop_back() {
                Some(card) => {
                    self.hand.push_back(card);
                    drawn += 1;
                }
                None => break,
            }
        }
        drawn
    }

    /// Index of the first hand card with definition `card`.
    #[must_use]
    pub fn hand_position(&self, card: CardId) -> Option<usize> {
        self.hand.iter().position(|c| c.card_id == card)
    }

    /// Remove the first copy of `card` from the hand.
    pub fn take_from_hand(&mut self, card: CardId) -> Option<CardInstance> {
        let index = self.hand_position(card)?;
        Some(self.hand.remove(index))
    }

    /// Append a unit to the end of the field.
    pub fn deploy(&mut self, unit: CardInstance) {
        self.field.push_back(unit);
    }

    #[must_use]
    pub fn field_index(&self, id: InstanceId) -> Option<usize> {
        self.field.iter().position(|u| u.instance_id == id)
    }

    #[must_use]
    pub fn field_unit(&self, id: InstanceId) -> Option<&CardInstance> {
        self.field.iter().find(|u| u.instance_id == id)
    }

    pub fn field_unit_mut(&mut self, id: InstanceId) -> Option<&mut CardInstance> {
        self.field.iter_mut().find(|u| u.instance_id == id)
    }

    /// Take a unit off the field.
    pub fn remove_from_field(&mut self, id: InstanceId) -> Option<CardInstance> {
        let index = self.field_index(id)?;
        Some(self.field.remove(index))
    }

    /// Remove every unit with health at or below zero, in field order.
    pub fn remove_dead(&mut self) -> Vec<CardInstance> {
        let mut dead = Vec::new();
        let mut alive = Vector::new();
        for unit in std::mem::take(&mut self.field) {
            if unit.is_alive() {
                alive.push_back(unit);
            } else {
                dead.push(unit);
            }
        }
        self.field = alive;
        dead
    }

    /// Which zone currently holds `id`.
    #[must_use]
    pub fn locate(&self, id: InstanceId) -> Option<Zone> {
        let holds = |v: &Vector<CardInstance>| v.iter().any(|c| c.instance_id == id);
        if holds(&self.deck) {
            Some(Zone::Deck)
        } else if holds(&self.hand) {
            Some(Zone::Hand)
        } else if holds(&self.field) {
            Some(Zone::Field)
        } else {
            None
        }
    }

    /// Cards across all three zones.
    #[must_use]
    pub fn total(&self) -> usize {
        self.deck.len() + self.hand.len() + self.field.len()
    }

    /// All instances, deck then hand then field.
    pub fn all(&self) -> impl Iterator<Item = &CardInstance> {
        self.deck.iter().chain(self.hand.iter()).chain(self.field.iter())
    }
}
