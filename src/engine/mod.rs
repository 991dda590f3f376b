//! Glue between the host and an embedded script engine.
//!
//! The engine itself — module loading, value marshaling, bytecode — is an
//! external collaborator; this module only encodes the narrow contract the
//! rest of the crate needs from it: register a named host callable, evaluate
//! a source string, and run pending microtasks to completion. Every bridge
//! (TCP, WebSocket, compression, SQL) dispatches events to script through
//! that same contract rather than touching engine internals directly.

mod pool;
pub mod pending;

pub use pending::Pending;
pub use pool::EnginePool;

use crate::constants::MICROTASK_DRAIN_WINDOW;
use crate::error::Result;
use std::time::{Duration, Instant};

/// A host function invocable by name from script. Arguments and the result
/// are plain strings; binary payloads are base64-encoded by the caller.
pub type HostCallable = Box<dyn Fn(&[String]) -> Result<String> + Send + Sync>;

/// An event a bridge wants delivered to script on the next microtask drain —
/// a WebSocket `message`/`close`, a cancelled fetch, and so on.
#[derive(Debug, Clone)]
pub struct ScriptEvent {
    /// The script-visible object the event targets (e.g. `"websocket"`).
    pub target: String,
    /// The event name, matching its web-platform counterpart (`"message"`,
    /// `"close"`, `"error"`).
    pub name: String,
    /// Event payload. Binary data is base64-encoded by the caller.
    pub payload: String,
}

impl ScriptEvent {
    /// Builds an event with the given target/name/payload.
    #[must_use]
    pub fn new(target: impl Into<String>, name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// The single-threaded, cooperative script host. One instance is leased to
/// each request for its lifetime; it is never driven from more than one
/// thread concurrently.
pub trait ScriptHost: Send {
    /// Registers `callable` under `name`, invocable as a script function.
    fn register_callable(&mut self, name: &str, callable: HostCallable);

    /// Evaluates `source` as the request's handler module.
    ///
    /// # Errors
    /// Returns a runtime error if evaluation fails.
    fn eval(&mut self, source: &str) -> Result<()>;

    /// Queues `event` for dispatch to script on the next microtask drain.
    fn dispatch_event(&mut self, event: ScriptEvent);

    /// Drains every currently-queued microtask, including ones newly
    /// enqueued while draining, until the engine is quiescent.
    fn run_microtasks(&mut self);

    /// Whether the host expects more work to arrive shortly from an
    /// out-of-band source (a timer, a background callback resolving a
    /// promise) that hasn't reached the microtask queue yet. Hosts with no
    /// such source can rely on the default of `false`, which makes
    /// [`run_to_quiescence`] a single drain with no extra wait.
    fn has_pending(&self) -> bool {
        false
    }
}

/// The "run to quiescence" primitive every bridge calls after dispatching an
/// event, in place of ad-hoc draining at each call site. Drains queued
/// microtasks, then, for up to [`MICROTASK_DRAIN_WINDOW`], keeps draining as
/// long as the host reports more work is still arriving — bounding how long
/// a bridge can be held up waiting for a host whose work trickles in from
/// outside the microtask queue.
pub fn run_to_quiescence(host: &mut dyn ScriptHost) {
    let deadline = Instant::now() + MICROTASK_DRAIN_WINDOW;
    loop {
        host.run_microtasks();
        if !host.has_pending() || Instant::now() >= deadline {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeHost {
        queue: VecDeque<ScriptEvent>,
        drained: Vec<ScriptEvent>,
    }

    impl ScriptHost for FakeHost {
        fn register_callable(&mut self, _name: &str, _callable: HostCallable) {}
        fn eval(&mut self, _source: &str) -> Result<()> {
            Ok(())
        }
        fn dispatch_event(&mut self, event: ScriptEvent) {
            self.queue.push_back(event);
        }
        fn run_microtasks(&mut self) {
            while let Some(event) = self.queue.pop_front() {
                self.drained.push(event);
            }
        }
    }

    #[test]
    fn run_to_quiescence_drains_queued_events_in_order() {
        let mut host = FakeHost::default();
        host.dispatch_event(ScriptEvent::new("websocket", "message", "ping"));
        host.dispatch_event(ScriptEvent::new("websocket", "close", ""));
        run_to_quiescence(&mut host);
        assert!(host.queue.is_empty());
        assert_eq!(host.drained[0].name, "message");
        assert_eq!(host.drained[1].name, "close");
    }
}
