//! Entity identification.
//!
//! Every card instance dealt into a session gets a unique `InstanceId`, so two
//! copies of the same card definition stay distinguishable as they move
//! between deck, hand and field. Sessions themselves are keyed by `SessionId`.
//!
//! ```
//! use duel_engine::core::{InstanceId, InstanceIds};
//!
//! let mut ids = InstanceIds::default();
//! let a = ids.alloc();
//! let b = ids.alloc();
//!
//! assert_ne!(a, b);
//! assert_eq!(b, InstanceId(2));
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a card instance within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.0)
    }
}

/// Monotonic allocator for instance IDs.
///
/// IDs start at 1 and are never reused inside a session. The counter is part
/// of the session snapshot so restored sessions keep allocating fresh IDs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceIds {
    next: u32,
}

impl Default for InstanceIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl InstanceIds {
    /// Resume allocation at `next`.
    #[must_use]
    pub const fn starting_at(next: u32) -> Self {
        Self { next }
    }

    /// Allocate a new instance ID.
    pub fn alloc(&mut self) -> InstanceId {
        let id = InstanceId(self.next);
        self.next += 1;
        id
    }

    /// The ID the next call to `alloc` will return.
    #[must_use]
    pub const fn peek(&self) -> u32 {
        self.next
    }
}

/// Identifier of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a fresh random session ID.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
