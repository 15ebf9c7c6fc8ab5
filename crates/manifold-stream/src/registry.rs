//! Subscriber registry
//!
//! The set of live delivery buffers, keyed by identity handles. Reads are
//! snapshot copies under a shared lock; add/remove take the exclusive lock
//! only for the mutation itself, never across a buffer write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use manifold_core::Terminal;

use crate::buffer::BufferHandle;

/// Stable identity of one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SubscriberId(u64);

impl SubscriberId {
    pub(crate) fn value(&self) -> u64 {
        self.0
    }
}

pub(crate) struct Registry<T> {
    buffers: RwLock<HashMap<SubscriberId, BufferHandle<T>>>,
    next_id: AtomicU64,
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Self {
        Registry {
            buffers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a buffer and return its handle id.
    ///
    /// `settled` is re-evaluated under the exclusive lock: a terminal
    /// transition drains the registry under this same lock after settling,
    /// so a subscriber that loses the race is rejected here with the settled
    /// state instead of landing in a registry nobody will ever close.
    pub(crate) fn register(
        &self,
        handle: BufferHandle<T>,
        settled: impl FnOnce() -> Option<Terminal>,
    ) -> Result<SubscriberId, Terminal> {
        let mut buffers = self.buffers.write();
        if let Some(terminal) = settled() {
            return Err(terminal);
        }
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        buffers.insert(id, handle);
        Ok(id)
    }

    /// Detach one subscriber. Safe to call for an id already drained.
    pub(crate) fn remove(&self, id: SubscriberId) {
        self.buffers.write().remove(&id);
    }

    /// Stable snapshot of the live buffers for one dispatch pass.
    ///
    /// The shared lock is held only for the copy; buffer writes happen after
    /// release so a slow consumer cannot stall subscribe/detach.
    pub(crate) fn snapshot(&self) -> Vec<BufferHandle<T>> {
        self.buffers.read().values().cloned().collect()
    }

    /// Remove and return every live buffer (terminal transition).
    pub(crate) fn drain(&self) -> Vec<BufferHandle<T>> {
        let mut buffers = self.buffers.write();
        buffers.drain().map(|(_, handle)| handle).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.buffers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer;
    use tokio_util::sync::CancellationToken;

    fn handle() -> BufferHandle<u32> {
        let (handle, _reader) = buffer::channel(None, CancellationToken::new());
        handle
    }

    #[test]
    fn test_register_and_remove() {
        let registry = Registry::new();

        let a = registry.register(handle(), || None).unwrap();
        let b = registry.register(handle(), || None).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        registry.remove(a);
        assert_eq!(registry.len(), 1);

        // Removing again is a no-op.
        registry.remove(a);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejected_once_settled() {
        let registry = Registry::new();

        let rejected = registry.register(handle(), || Some(Terminal::Completed));
        assert!(matches!(rejected, Err(Terminal::Completed)));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let registry = Registry::new();
        registry.register(handle(), || None).unwrap();

        let snapshot = registry.snapshot();
        registry.register(handle(), || None).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_drain_empties_registry() {
        let registry = Registry::new();
        registry.register(handle(), || None).unwrap();
        registry.register(handle(), || None).unwrap();

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(registry.len(), 0);
    }
}
