//! Combat resolution.
//!
//! - `CombatResolver`: Runs one pass for the attacking side
//! - `CombatReport` / `CombatEvent`: What happened, in order

mod report;
mod resolver;

pub use report::{CombatEvent, CombatReport};
pub use resolver::CombatResolver;
