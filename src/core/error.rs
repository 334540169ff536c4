//! Engine error taxonomy.
//!
//! Every fallible engine operation returns `Result<T, EngineError>`. Each
//! variant belongs to exactly one `ErrorKind`:
//!
//! - **Validation**: malformed input from the caller (bad deck, unknown card).
//! - **RuleViolation**: well-formed request that the rules forbid right now.
//!   Clients use these to enable or disable controls.
//! - **Integrity**: stored or loaded data is damaged. Fatal to the request,
//!   never papered over with default state.
//!
//! A timer firing after its turn already ended is not an error at all; see
//! `GameSession::expire_turn`.

use serde::Serialize;

use crate::cards::CardId;
use crate::core::{InstanceId, SessionId, Side};

/// Broad class of an `EngineError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    RuleViolation,
    Integrity,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::RuleViolation => write!(f, "rule_violation"),
            ErrorKind::Integrity => write!(f, "integrity"),
        }
    }
}

/// All errors the engine reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    // Validation
    /// Deck has the wrong number of cards.
    InvalidDeck { expected: usize, actual: usize },
    /// Deck references a card id the catalog does not know.
    UnknownCard(CardId),
    /// The requested card is not in the acting side's hand.
    CardNotInHand(CardId),
    /// No session with this id is hosted.
    SessionNotFound(SessionId),
    /// A card definition breaks the catalog invariants.
    InvalidCard { card: CardId, reason: String },
    /// Engine configuration is unusable.
    InvalidConfig(String),

    // Rule violations
    /// It is the other side's turn.
    NotYourTurn { side: Side, current: Side },
    /// Card costs more than the side's current energy.
    InsufficientEnergy { cost: i32, energy: i32 },
    /// The session has already finished.
    SessionTerminated,
    /// The side's field is at capacity.
    FieldFull { max: usize },
    /// The side already resolved combat this turn.
    AlreadyAttacked,

    // Integrity
    /// Snapshot bytes or contents could not be decoded.
    CorruptSnapshot(String),
    /// A stored unit references a card the catalog no longer has.
    MissingCatalogCard { card: CardId, instance: InstanceId },
    /// Snapshot was written against a different catalog version.
    CatalogMismatch { expected: u32, found: u32 },
    /// The backing store failed.
    Store(String),
}

impl EngineError {
    /// The class this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidDeck { .. }
            | EngineError::UnknownCard(_)
            | EngineError::CardNotInHand(_)
            | EngineError::SessionNotFound(_)
            | EngineError::InvalidCard { .. }
            | EngineError::InvalidConfig(_) => ErrorKind::Validation,

            EngineError::NotYourTurn { .. }
            | EngineError::InsufficientEnergy { .. }
            | EngineError::SessionTerminated
            | EngineError::FieldFull { .. }
            | EngineError::AlreadyAttacked => ErrorKind::RuleViolation,

            EngineError::CorruptSnapshot(_)
            | EngineError::MissingCatalogCard { .. }
            | EngineError::CatalogMismatch { .. }
            | EngineError::Store(_) => ErrorKind::Integrity,
        }
    }

    /// Stable machine-readable code for the wire.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidDeck { .. } => "invalid_deck",
            EngineError::UnknownCard(_) => "unknown_card",
            EngineError::CardNotInHand(_) => "card_not_in_hand",
            EngineError::SessionNotFound(_) => "session_not_found",
            EngineError::InvalidCard { .. } => "invalid_card",
            EngineError::InvalidConfig(_) => "invalid_config",
            EngineError::NotYourTurn { .. } => "not_your_turn",
            EngineError::InsufficientEnergy { .. } => "insufficient_energy",
            EngineError::SessionTerminated => "session_terminated",
            EngineError::FieldFull { .. } => "field_full",
            EngineError::AlreadyAttacked => "already_attacked",
            EngineError::CorruptSnapshot(_) => "corrupt_snapshot",
            EngineError::MissingCatalogCard { .. } => "missing_catalog_card",
            EngineError::CatalogMismatch { .. } => "catalog_mismatch",
            EngineError::Store(_) => "store_failure",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidDeck { expected, actual } => {
                write!(f, "Deck must contain {} cards, got {}", expected, actual)
            }
            EngineError::UnknownCard(card) => write!(f, "Unknown card: {}", card),
            EngineError::CardNotInHand(card) => write!(f, "{} is not in hand", card),
            EngineError::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            EngineError::InvalidCard { card, reason } => {
                write!(f, "Invalid definition for {}: {}", card, reason)
            }
            EngineError::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            EngineError::NotYourTurn { side, current } => {
                write!(f, "Not {}'s turn (current: {})", side, current)
            }
            EngineError::InsufficientEnergy { cost, energy } => {
                write!(f, "Card costs {} but only {} energy available", cost, energy)
            }
            EngineError::SessionTerminated => write!(f, "Session has already ended"),
            EngineError::FieldFull { max } => write!(f, "Field is full ({} units)", max),
            EngineError::AlreadyAttacked => write!(f, "Combat already resolved this turn"),
            EngineError::CorruptSnapshot(msg) => write!(f, "Corrupt snapshot: {}", msg),
            EngineError::MissingCatalogCard { card, instance } => {
                write!(f, "{} references {} which is not in the catalog", instance, card)
            }
            EngineError::CatalogMismatch { expected, found } => write!(
                f,
                "Snapshot written for catalog v{}, loaded catalog is v{}",
                found, expected
            ),
            EngineError::Store(msg) => write!(f, "Store failure: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<bincode::Error> for EngineError {
    fn from(err: bincode::Error) -> Self {
        EngineError::CorruptSnapshot(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(EngineError::UnknownCard(CardId(9)).kind(), ErrorKind::Validation);
        assert_eq!(
            EngineError::InsufficientEnergy { cost: 2, energy: 1 }.kind(),
            ErrorKind::RuleViolation
        );
        assert_eq!(EngineError::SessionTerminated.kind(), ErrorKind::RuleViolation);
        assert_eq!(
            EngineError::CorruptSnapshot("eof".into()).kind(),
            ErrorKind::Integrity
        );
        assert_eq!(
            EngineError::CatalogMismatch { expected: 1, found: 2 }.kind(),
            ErrorKind::Integrity
        );
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            EngineError::InvalidDeck { expected: 5, actual: 4 },
            EngineError::CardNotInHand(CardId(1)),
            EngineError::NotYourTurn { side: Side::Ai, current: Side::Human },
            EngineError::FieldFull { max: 5 },
            EngineError::AlreadyAttacked,
            EngineError::Store("down".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(EngineError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display() {
        let err = EngineError::InsufficientEnergy { cost: 2, energy: 1 };
        assert_eq!(err.to_string(), "Card costs 2 but only 1 energy available");

        let err = EngineError::NotYourTurn { side: Side::Ai, current: Side::Human };
        assert_eq!(err.to_string(), "Not ai's turn (current: human)");
    }

    #[test]
    fn test_bincode_error_is_corrupt_snapshot() {
        let err: EngineError = bincode::deserialize::<u64>(&[1, 2]).unwrap_err().into();
        assert_eq!(err.code(), "corrupt_snapshot");
    }
}
