//! Redacted per-side view of a session, in the wire shape hosts send to
//! clients.
//!
//! The requesting side sees its own hand; the other side's hand is reduced to
//! a count. Fields are public on both sides.

use serde::{Deserialize, Serialize};

use crate::cards::{CardId, CardInstance};
use crate::core::{EngineError, InstanceId, PlayerState, SessionId, Side};
use crate::effects::{EffectKind, Stat};
use crate::rules::SessionStatus;
use crate::session::GameSession;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectView {
    pub kind: EffectKind,
    pub stat: Stat,
    pub value: i32,
    pub expires_at_round: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitView {
    /// Card definition id.
    pub id: CardId,
    /// Instance id.
    pub uid: InstanceId,
    pub name: String,
    pub strength: i32,
    pub health: i32,
    pub charges: u32,
    pub active_effects: Vec<EffectView>,
}

impl UnitView {
    fn of(unit: &CardInstance, round: u32) -> Self {
        Self {
            id: unit.card_id,
            uid: unit.instance_id,
            name: unit.name.clone(),
            strength: unit.strength,
            health: unit.health,
            charges: unit.charges,
            active_effects: unit
                .effects
                .iter()
                .filter(|e| e.is_active(round))
                .map(|e| EffectView {
                    kind: e.kind,
                    stat: e.stat,
                    value: e.value,
                    expires_at_round: e.expires_at_round,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideView {
    pub health: i32,
    pub energy: i32,
    pub deck_count: usize,
    pub hand_count: usize,
    /// Only present for the requesting side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<UnitView>>,
    pub field: Vec<UnitView>,
}

impl SideView {
    fn of(player: &PlayerState, reveal_hand: bool, round: u32) -> Self {
        Self {
            health: player.health,
            energy: player.energy,
            deck_count: player.deck_count(),
            hand_count: player.hand_count(),
            hand: reveal_hand.then(|| player.zones.hand.iter().map(|u| UnitView::of(u, round)).collect()),
            field: player.zones.field.iter().map(|u| UnitView::of(u, round)).collect(),
        }
    }
}

/// What one side is allowed to see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSnapshot {
    pub id: SessionId,
    pub status: SessionStatus,
    pub round: u32,
    pub current_turn: Side,
    pub human: SideView,
    pub ai: SideView,
}

impl PublicSnapshot {
    #[must_use]
    pub fn for_perspective(session: &GameSession, viewer: Side) -> Self {
        let round = session.round();
        let side = |s: Side| SideView::of(session.player(s), s == viewer, round);
        Self {
            id: session.id(),
            status: session.status(),
            round,
            current_turn: session.current_side(),
            human: side(Side::Human),
            ai: side(Side::Ai),
        }
    }

    /// The block for `side`.
    #[must_use]
    pub fn side(&self, side: Side) -> &SideView {
        match side {
            Side::Human => &self.human,
            Side::Ai => &self.ai,
        }
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cards::CardCatalog;
    use crate::core::EngineConfig;

    fn session() -> GameSession {
        GameSession::start(
            &[1, 2, 3, 4, 5],
            Arc::new(CardCatalog::standard().unwrap()),
            EngineConfig::default().with_seed(3),
        )
        .unwrap()
    }

    #[test]
    fn test_hides_opponent_hand() {
        let s = session();
        let view = PublicSnapshot::for_perspective(&s, Side::Human);

        assert_eq!(view.human.hand.as_ref().map(Vec::len), Some(5));
        assert!(view.ai.hand.is_none());
        assert_eq!(view.ai.hand_count, 5);
        assert_eq!(view.current_turn, Side::Human);

        let theirs = PublicSnapshot::for_perspective(&s, Side::Ai);
        assert!(theirs.human.hand.is_none());
        assert!(theirs.ai.hand.is_some());
    }

    #[test]
    fn test_wire_shape() {
        let mut s = session();
        s.play_card(Side::Human, CardId::new(2)).unwrap();
        let json: serde_json::Value = serde_json::to_value(s.view(Side::Human)).unwrap();

        assert_eq!(json["status"], "active");
        assert_eq!(json["currentTurn"], "human");
        assert_eq!(json["human"]["deckCount"], 0);
        assert_eq!(json["human"]["handCount"], 4);
        assert!(json["ai"].get("hand").is_none());

        let unit = &json["human"]["field"][0];
        assert_eq!(unit["id"], 2);
        assert_eq!(unit["name"], "Spark Imp");
        assert_eq!(unit["charges"], 2);
        assert!(unit["activeEffects"].as_array().unwrap().is_empty());
    }
}
