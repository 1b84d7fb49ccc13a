//! Holder for the live snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use civic_quest_pipeline::snapshot::Snapshot;

/// The snapshot currently being served.
///
/// Readers take a cheap `Arc` clone and query it without holding the lock,
/// so a replacement never blocks in-flight requests and each request sees
/// exactly one snapshot.
pub struct SnapshotStore {
    live: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    /// Creates a store serving `snapshot`.
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            live: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Returns the live snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.live.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swaps in `snapshot` and returns the one it replaced.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *live, Arc::new(snapshot))
    }
}
