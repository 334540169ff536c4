//! Concurrent hosting of sessions.
//!
//! - `service`: `SessionHub`, the async operations and update broadcast
//! - `store`: `SnapshotStore` and the in-memory `MemoryStore`
//! - `tasks`: Turn timers, delayed opponent turns and snapshot writes

pub mod service;
pub mod store;
mod tasks;

pub use service::{SessionHub, SessionUpdate};
pub use store::{MemoryStore, SnapshotStore};
