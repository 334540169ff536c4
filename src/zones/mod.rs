//! Zone system for card locations.
//!
//! Each side owns three zones: deck, hand and field. Cards move between them
//! by value.
//!
//! ## Key Types
//!
//! - `Zone`: Deck, hand or field
//! - `Zones`: A side's containers and the moves between them

pub mod manager;

pub use manager::{Zone, Zones};
