//! Per-request registry of open Server-Sent-Events connections.
//!
//! The connection's own read loop and reconnection policy live with the
//! HTTP client the host embeds; this registry only needs to track which
//! connections a request owns so teardown can close all of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A handle to one open EventSource connection.
#[derive(Clone)]
pub struct EventSourceHandle {
    closed: Arc<AtomicBool>,
}

impl EventSourceHandle {
    /// Builds a handle in the open state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Marks the connection closed. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Whether [`close`] has been called.
    ///
    /// [`close`]: EventSourceHandle::close
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for EventSourceHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-request registry of open EventSource connections, keyed by id.
#[derive(Default)]
pub struct EventSourceRegistry {
    sources: HashMap<u64, EventSourceHandle>,
    next_id: u64,
}

impl EventSourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            next_id: 1,
        }
    }

    /// Registers a new open connection, returning its id.
    pub fn insert(&mut self, handle: EventSourceHandle) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.sources.insert(id, handle);
        id
    }

    /// Looks up a connection by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&EventSourceHandle> {
        self.sources.get(&id)
    }

    /// Closes and removes connection `id`, if present.
    pub fn close(&mut self, id: u64) {
        if let Some(handle) = self.sources.remove(&id) {
            handle.close();
        }
    }

    /// Closes and removes every connection, for request teardown.
    pub fn close_all(&mut self) {
        for (_, handle) in self.sources.drain() {
            handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_all_closes_every_registered_handle() {
        let mut registry = EventSourceRegistry::new();
        let a = EventSourceHandle::new();
        let b = EventSourceHandle::new();
        registry.insert(a.clone());
        registry.insert(b.clone());
        registry.close_all();
        assert!(a.is_closed());
        assert!(b.is_closed());
    }

    #[test]
    fn close_removes_from_the_registry() {
        let mut registry = EventSourceRegistry::new();
        let id = registry.insert(EventSourceHandle::new());
        registry.close(id);
        assert!(registry.get(id).is_none());
    }
}
