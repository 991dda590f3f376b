//! Pool of leasable script engine instances.
//!
//! Each request binds exactly one engine for its lifetime (no multi-tenant
//! sharing); the pool exists so that building a fresh engine instance — not
//! a cheap operation for a real embedded script engine — doesn't happen on
//! every request.

use super::ScriptHost;
use crossbeam_queue::SegQueue;

/// A pool of idle `H` instances, built lazily via a factory closure when the
/// pool is empty. Idle engines sit in a lock-free queue: lease/release never
/// blocks on a mutex even under many concurrent requests.
pub struct EnginePool<H: ScriptHost> {
    idle: SegQueue<H>,
    factory: Box<dyn Fn() -> H + Send + Sync>,
}

impl<H: ScriptHost> EnginePool<H> {
    /// Builds an empty pool backed by `factory` for constructing new
    /// engines on demand.
    pub fn new(factory: impl Fn() -> H + Send + Sync + 'static) -> Self {
        Self {
            idle: SegQueue::new(),
            factory: Box::new(factory),
        }
    }

    /// Leases an idle engine, building a new one if none is available.
    pub fn lease(&self) -> H {
        self.idle.pop().unwrap_or_else(|| (self.factory)())
    }

    /// Returns `engine` to the pool for reuse by a future request.
    pub fn release(&self, engine: H) {
        self.idle.push(engine);
    }

    /// Number of idle engines currently held by the pool.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{HostCallable, ScriptEvent};
    use crate::error::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHost(u64);

    impl ScriptHost for CountingHost {
        fn register_callable(&mut self, _name: &str, _callable: HostCallable) {}
        fn eval(&mut self, _source: &str) -> Result<()> {
            Ok(())
        }
        fn dispatch_event(&mut self, _event: ScriptEvent) {}
        fn run_microtasks(&mut self) {}
    }

    #[test]
    fn lease_builds_fresh_when_empty_and_reuses_after_release() {
        let built = Arc::new(AtomicUsize::new(0));
        let built_for_factory = Arc::clone(&built);
        let pool = EnginePool::new(move || {
            built_for_factory.fetch_add(1, Ordering::SeqCst);
            CountingHost(0)
        });

        let first = pool.lease();
        assert_eq!(built.load(Ordering::SeqCst), 1);
        pool.release(first);
        assert_eq!(pool.idle_count(), 1);

        let _second = pool.lease();
        assert_eq!(built.load(Ordering::SeqCst), 1, "reused the released engine");
        assert_eq!(pool.idle_count(), 0);
    }
}
