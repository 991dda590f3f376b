//! Per-request registry of cancellation handles for in-flight outbound
//! fetches.

use std::collections::HashMap;

/// A cancellation callback for one in-flight fetch. Invoked at most once.
pub type CancelHandle = Box<dyn FnOnce() + Send>;

/// Maps string fetch-ids (opaque, non-empty) to their cancellation handle.
#[derive(Default)]
pub struct FetchCancelRegistry {
    cancels: HashMap<String, CancelHandle>,
    next_id: u64,
}

impl FetchCancelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancels: HashMap::new(),
            next_id: 1,
        }
    }

    /// Registers `handle`, returning a freshly-allocated, non-empty id.
    pub fn register(&mut self, handle: CancelHandle) -> String {
        let id = format!("fetch-{}", self.next_id);
        self.next_id += 1;
        self.cancels.insert(id.clone(), handle);
        id
    }

    /// Removes and returns the handle for `id`, if still present. Safe to
    /// call after the fetch has already completed (returns `None`).
    pub fn remove(&mut self, id: &str) -> Option<CancelHandle> {
        self.cancels.remove(id)
    }

    /// Invokes and removes the handle for `id` in one step. A no-op if the
    /// fetch already completed or was already cancelled.
    pub fn call(&mut self, id: &str) {
        if let Some(handle) = self.cancels.remove(id) {
            handle();
        }
    }

    /// Invokes and removes every still-registered handle, for request
    /// teardown.
    pub fn call_all(&mut self) {
        for (_, handle) in self.cancels.drain() {
            handle();
        }
    }
}
