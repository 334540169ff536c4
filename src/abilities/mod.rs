//! Ability system: descriptor-driven activation, hits and death triggers.
//!
//! ## Key Types
//!
//! - `AbilitySystem`: Interprets `AbilityDescriptor`s against the catalog
//! - `Activation`: What an on-play activation did
//! - `StrikeProfile`: How a unit strikes in combat
//! - `Hit`: One delivered hit (unit or hero)

mod death;
mod system;

pub use death::{hit_hero, hit_target, hit_unit, Hit};
pub use system::{AbilitySystem, Activation, StrikeProfile};
