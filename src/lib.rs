//! # duel-engine
//!
//! Authoritative game-state engine for a two-sided, turn-based card battler:
//! a human against an automated opponent.
//!
//! ## Design Principles
//!
//! 1. **One owner per session**: `GameSession` owns both sides, the turn
//!    controller and the RNG. Nothing else mutates game state.
//!
//! 2. **Descriptor-driven abilities**: A card's behaviour is data
//!    (`AbilityDescriptor`), interpreted by the ability and combat resolvers.
//!
//! 3. **Fail loudly on bad data**: Missing catalog entries or inconsistent
//!    snapshots are integrity errors, never filled in with defaults.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: Zones are `im::Vector`s, so sessions
//!   clone cheaply for snapshots and views.
//!
//! - **Deterministic RNG**: Seeded ChaCha8; its word position is part of the
//!   snapshot, so a restored session draws the same numbers.
//!
//! - **Ticketed timers**: Turn timers carry the round they were armed for and
//!   are ignored once that turn is over.
//!
//! ## Modules
//!
//! - `core`: Sides, ids, RNG, configuration, player state, errors
//! - `cards`: Card definitions, instances and the catalog
//! - `zones`: Deck, hand and field
//! - `effects`: Timed modifiers, damage arithmetic, targeting
//! - `abilities`: On-play activations and death triggers
//! - `combat`: The combat pass
//! - `rules`: Turn controller, win conditions, opponent policies
//! - `session`: The `GameSession` aggregate
//! - `snapshot`: Storable snapshots and redacted views
//! - `hub`: Concurrent hosting with timers, delayed opponent and persistence

pub mod core;
pub mod cards;
pub mod zones;
pub mod effects;
pub mod abilities;
pub mod combat;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod hub;

// Re-export commonly used types
pub use crate::core::{
    EngineConfig, EngineError, ErrorKind,
    GameRng, GameRngState,
    InstanceId, SessionId,
    PlayerState, Side, SideMap,
};

pub use crate::cards::{
    AbilityDescriptor, CardCatalog, CardDefinition, CardId, CardInstance,
    STANDARD_CATALOG_VERSION, STANDARD_OPPONENT_DECK,
};

pub use crate::zones::{Zone, Zones};

pub use crate::effects::{ActiveEffect, EffectKind, EffectResolver, Stat, Target, TargetRule, TargetSelector};

pub use crate::abilities::{AbilitySystem, Activation, Hit};

pub use crate::combat::{CombatEvent, CombatReport, CombatResolver};

pub use crate::rules::{
    GreedyOpponent, IdleOpponent, OpponentPolicy,
    Phase, SessionStatus, TimerTicket, TurnController,
};

pub use crate::session::{GameSession, OpponentTurn, PlayOutcome, TurnOutcome};

pub use crate::snapshot::{PublicSnapshot, Snapshot, SNAPSHOT_FORMAT_VERSION};

pub use crate::hub::{MemoryStore, SessionHub, SessionUpdate, SnapshotStore};
