//! Core engine types: sides, identifiers, RNG, configuration, player state, errors.
//!
//! Everything else in the crate builds on these. Rule constants come from
//! `EngineConfig` rather than being hardcoded in the turn or combat code.

pub mod config;
pub mod entity;
pub mod error;
pub mod rng;
pub mod side;
pub mod state;

pub use config::EngineConfig;
pub use entity::{InstanceId, InstanceIds, SessionId};
pub use error::{EngineError, ErrorKind};
pub use rng::{GameRng, GameRngState};
pub use side::{Side, SideMap};
pub use state::PlayerState;
