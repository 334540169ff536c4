//! Snapshot persistence.
//!
//! The hub writes encoded `Snapshot` bytes through `SnapshotStore`. The trait
//! is synchronous; the hub calls it from spawned tasks so request handlers
//! never wait on a write unless they ask to (`checkpoint`).

use std::sync::Arc;

use dashmap::DashMap;

use crate::core::{EngineError, SessionId};

/// Durable key-value storage for encoded snapshots.
pub trait SnapshotStore: Send + Sync + 'static {
    /// Store `bytes` as the latest snapshot of `id`, replacing any previous one.
    fn put(&self, id: SessionId, bytes: &[u8]) -> Result<(), EngineError>;

    /// Latest snapshot of `id`, or `None` if nothing was stored.
    fn get(&self, id: SessionId) -> Result<Option<Vec<u8>>, EngineError>;

    fn delete(&self, id: SessionId) -> Result<(), EngineError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn put(&self, id: SessionId, bytes: &[u8]) -> Result<(), EngineError> {
        (**self).put(id, bytes)
    }

    fn get(&self, id: SessionId) -> Result<Option<Vec<u8>>, EngineError> {
        (**self).get(id)
    }

    fn delete(&self, id: SessionId) -> Result<(), EngineError> {
        (**self).delete(id)
    }
}

/// In-process store backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<SessionId, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Overwrite the stored bytes directly, bypassing the codec.
    pub fn insert_raw(&self, id: SessionId, bytes: Vec<u8>) {
        self.entries.insert(id, bytes);
    }
}

impl SnapshotStore for MemoryStore {
    fn put(&self, id: SessionId, bytes: &[u8]) -> Result<(), EngineError> {
        self.entries.insert(id, bytes.to_vec());
        Ok(())
    }

    fn get(&self, id: SessionId) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.entries.get(&id).map(|entry| entry.value().clone()))
    }

    fn delete(&self, id: SessionId) -> Result<(), EngineError> {
        self.entries.remove(&id);
        Ok(())
    }
}
