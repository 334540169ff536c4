//! Effect system: timed modifiers, targeting and damage math.
//!
//! - `EffectKind` / `Stat` / `ActiveEffect`: Timed modifiers on field units
//! - `TargetRule` / `TargetSelector`: Which units an ability addresses
//! - `EffectResolver`: Effective stats, strike damage, expiry sweeps
//!
//! Everything here is pure with respect to the session: functions take the
//! units or fields they work on and nothing else.

mod effect;
mod resolver;
mod targeting;

pub use effect::{install, sweep, ActiveEffect, EffectKind, EffectList, Stat};
pub use resolver::EffectResolver;
pub use targeting::{Target, TargetRule, TargetSelector};
