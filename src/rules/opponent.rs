//! Opponent policies for the automated side.
//!
//! A policy only decides *which* card to play next; the session validates and
//! applies the play exactly as it would for the human. When the policy returns
//! `None` the opponent's turn ends.

use crate::cards::{CardCatalog, CardId};
use crate::core::{EngineConfig, PlayerState};

// =============================================================================
// Opponent Policy
// =============================================================================

/// Chooses the automated side's plays.
pub trait OpponentPolicy: Send + Sync {
    /// Choose the next card to play from `me`'s hand.
    ///
    /// Returns `None` to stop playing this turn.
    fn choose_play(&self, me: &PlayerState, catalog: &CardCatalog, config: &EngineConfig) -> Option<CardId>;
}

/// Plays the most expensive affordable card, ties broken by hand order.
///
/// Stops when nothing is affordable or the field is full.
#[derive(Clone, Debug, Default)]
pub struct GreedyOpponent;

impl OpponentPolicy for GreedyOpponent {
    fn choose_play(&self, me: &PlayerState, catalog: &CardCatalog, config: &EngineConfig) -> Option<CardId> {
        if me.zones.field.len() >= config.max_field_size {
            return None;
        }

        let mut best: Option<(i32, CardId)> = None;
        for card in me.zones.hand.iter() {
            let Some(def) = catalog.get(card.card_id) else {
                continue;
            };
            if def.cost > me.energy {
                continue;
            }
            // Strictly greater keeps the earliest card on ties.
            if best.map_or(true, |(cost, _)| def.cost > cost) {
                best = Some((def.cost, card.card_id));
            }
        }
        best.map(|(_, id)| id)
    }
}

/// Never plays. Its turns consist only of combat.
#[derive(Clone, Debug, Default)]
pub struct IdleOpponent;

impl OpponentPolicy for IdleOpponent {
    fn choose_play(&self, _me: &PlayerState, _catalog: &CardCatalog, _config: &EngineConfig) -> Option<CardId> {
        None
    }
}
