//! Card system: definitions, instances, and the catalog.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for card definitions
//! - `AbilityDescriptor`: Structured ability data (kind, target, stat, value, pierce)
//! - `CardDefinition`: Static card data
//! - `CardInstance`: Runtime card state (health, charges, modifiers)
//! - `CardCatalog`: Versioned, read-only definition lookup

pub mod definition;
pub mod instance;
pub mod registry;

pub use definition::{AbilityDescriptor, CardDefinition, CardId};
pub use instance::CardInstance;
pub use registry::{CardCatalog, STANDARD_CATALOG_VERSION, STANDARD_OPPONENT_DECK};
