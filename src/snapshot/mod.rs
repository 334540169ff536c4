//! Snapshot codec.
//!
//! - `codec`: Full, storable `Snapshot` with integrity-checked restore
//! - `view`: Redacted `PublicSnapshot` for one side

pub mod codec;
pub mod view;

pub use codec::{PlayerSnapshot, Snapshot, SNAPSHOT_FORMAT_VERSION};
pub use view::{EffectView, PublicSnapshot, SideView, UnitView};
