//! Process-wide per-request state: the registry every capability call is
//! keyed through, and the bundle of resources one request owns.
//!
//! A request-id is meaningless on its own; every host callable resolves it
//! against [`RequestRegistry`] first and reports "no such request" rather
//! than panicking if teardown already ran. This is distinct from the
//! host-process `tracing` spans a request's lifetime is also wrapped in —
//! those exist for operators, this registry is the actual resource owner.

mod digest;
mod event_source;
mod fetch;
mod keys;

pub use digest::{DigestRegistry, DigestStream};
pub use event_source::{EventSourceHandle, EventSourceRegistry};
pub use fetch::{CancelHandle, FetchCancelRegistry};
pub use keys::KeyRegistry;

use crate::compression::StreamRegistry;
use crate::config::RuntimeConfig;
use crate::crypto::normalize;
use crate::error::{Error, Result};
use crate::ids::RequestId;
use crate::keys::KeyEntry;
use crate::log::{LogBuffer, LogLevel};
use crate::net::{SsrfFilter, TcpSocketRegistry};
use crate::sql::SqlBridge;
use crate::websocket::WebSocketHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything one in-flight request owns. Dropped in full at teardown, in
/// the fixed order [`RequestRegistry::clear`] enforces.
pub struct RequestState {
    /// Outbound-fetch budget for this request.
    pub max_fetches: u64,
    /// Read-only tenant configuration reference, opaque to the core.
    pub env: Arc<serde_json::Value>,
    /// Append-only, capped log buffer.
    pub logs: LogBuffer,
    /// Imported/generated key material, by key-id.
    pub keys: KeyRegistry,
    /// The upgraded WebSocket connection, once one has been accepted.
    pub websocket: Option<WebSocketHandle>,
    /// Running hash streams, by digest-id.
    pub digest_streams: DigestRegistry,
    /// Open EventSource connections, by source-id.
    pub event_sources: EventSourceRegistry,
    /// Open TCP sockets, by socket-id.
    pub tcp_sockets: TcpSocketRegistry,
    /// Live compression/decompression streams, by stream-id.
    pub compress_streams: StreamRegistry,
    /// Cancellation handles for in-flight outbound fetches, by fetch-id.
    pub fetch_cancels: FetchCancelRegistry,
    /// SQL bridges opened during this request, in open order.
    pub sql_bridges: Vec<SqlBridge>,
}

impl RequestState {
    fn new(max_fetches: u64, env: Arc<serde_json::Value>, config: &RuntimeConfig, ssrf_filter: SsrfFilter) -> Self {
        Self {
            max_fetches,
            env,
            logs: LogBuffer::new(),
            keys: KeyRegistry::new(),
            websocket: None,
            digest_streams: DigestRegistry::new(),
            event_sources: EventSourceRegistry::new(),
            tcp_sockets: TcpSocketRegistry::new(
                config.max_tcp_sockets,
                config.max_tcp_buffer_size,
                ssrf_filter,
            ),
            compress_streams: StreamRegistry::new(),
            fetch_cancels: FetchCancelRegistry::new(),
            sql_bridges: Vec::new(),
        }
    }

    /// Tears down every owned resource in the required order: event
    /// sources, then TCP sockets, then compression streams (both encoder
    /// and decompressor pipe), then in-flight fetch cancellations, then SQL
    /// bridges. `self` is dropped by the caller once this returns.
    fn teardown(&mut self) {
        self.event_sources.close_all();
        self.tcp_sockets.close_all();
        self.compress_streams.close_all();
        self.fetch_cancels.call_all();
        self.sql_bridges.clear();
    }
}

/// Process-wide `request-id → RequestState` map plus the shared runtime
/// configuration new states are constructed against.
pub struct RequestRegistry {
    states: Mutex<HashMap<u64, RequestState>>,
    config: RuntimeConfig,
    ssrf_filter: SsrfFilter,
}

impl RequestRegistry {
    /// Builds an empty registry bound to `config`.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        let ssrf_filter = if config.ssrf_filter_enabled {
            SsrfFilter::default()
        } else {
            SsrfFilter::disabled()
        };
        Self {
            states: Mutex::new(HashMap::new()),
            config,
            ssrf_filter,
        }
    }

    /// Admits a new request, returning its freshly-allocated id.
    pub fn new_request(&self, max_fetches: u64, env: Arc<serde_json::Value>) -> u64 {
        let id = RequestId::next().as_u64();
        let state = RequestState::new(max_fetches, env, &self.config, self.ssrf_filter);
        self.states.lock().insert(id, state);
        id
    }

    /// Runs `f` against the live state for `id`, if any.
    pub fn with_state<T>(&self, id: u64, f: impl FnOnce(&mut RequestState) -> T) -> Option<T> {
        self.states.lock().get_mut(&id).map(f)
    }

    /// Tears down and removes the state for `id`, returning whether a live
    /// state existed. Idempotent: calling this on an already-cleared or
    /// unknown id is a no-op that returns `false`.
    pub fn clear(&self, id: u64) -> bool {
        let removed = self.states.lock().remove(&id);
        match removed {
            Some(mut state) => {
                state.teardown();
                true
            }
            None => false,
        }
    }

    /// Appends a log entry for `id`. A no-op if the request has already
    /// been torn down.
    pub fn add_log(&self, id: u64, level: LogLevel, message: impl Into<String>) {
        self.with_state(id, |state| state.logs.push(level, message));
    }

    /// Imports an HMAC-style secret key from raw bytes and a hash
    /// algorithm, the common case for `importKey("raw", ...)` with an
    /// implicit HMAC algorithm. Returns the new key-id.
    ///
    /// # Errors
    /// Returns a not-found error if `id` has no live state.
    pub fn import_key(&self, id: u64, hash_algorithm: &str, data: Vec<u8>) -> Result<u64> {
        let entry = KeyEntry::secret(data, "HMAC", Some(normalize(hash_algorithm)), true);
        self.import_key_full(id, entry)
    }

    /// Imports a fully-specified key entry, returning its new key-id.
    ///
    /// # Errors
    /// Returns a not-found error if `id` has no live state.
    pub fn import_key_full(&self, id: u64, entry: KeyEntry) -> Result<u64> {
        self.with_state(id, |state| state.keys.insert(entry))
            .ok_or_else(|| Error::not_found("request"))
    }

    /// Looks up key `key_id` within request `id`'s own key registry. A key
    /// registered under a different request is never visible here.
    #[must_use]
    pub fn get_key(&self, id: u64, key_id: u64) -> Option<KeyEntry> {
        self.with_state(id, |state| state.keys.get(key_id).cloned())
            .flatten()
    }

    /// Registers a fetch-cancellation callback for request `id`, returning
    /// its fetch-id.
    ///
    /// # Errors
    /// Returns a not-found error if `id` has no live state.
    pub fn register_fetch_cancel(&self, id: u64, handle: CancelHandle) -> Result<String> {
        self.with_state(id, |state| state.fetch_cancels.register(handle))
            .ok_or_else(|| Error::not_found("request"))
    }

    /// Removes and returns the cancellation handle for `fetch_id` within
    /// request `id`, if still registered.
    pub fn remove_fetch_cancel(&self, id: u64, fetch_id: &str) -> Option<CancelHandle> {
        self.with_state(id, |state| state.fetch_cancels.remove(fetch_id))
            .flatten()
    }

    /// Invokes and removes the cancellation handle for `fetch_id` within
    /// request `id`. A no-op if already completed or cancelled, or if `id`
    /// has no live state.
    pub fn call_fetch_cancel(&self, id: u64, fetch_id: &str) {
        self.with_state(id, |state| state.fetch_cancels.call(fetch_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{Format, Mode};

    fn registry() -> RequestRegistry {
        RequestRegistry::new(RuntimeConfig::default())
    }

    #[test]
    fn new_request_ids_are_distinct_and_state_is_retrievable() {
        let registry = registry();
        let env = Arc::new(serde_json::json!({"tenant": "acme"}));
        let a = registry.new_request(10, env.clone());
        let b = registry.new_request(10, env);
        assert_ne!(a, b);
        assert!(registry.with_state(a, |s| s.max_fetches).is_some());
    }

    #[test]
    fn clear_is_idempotent_and_reports_whether_a_state_existed() {
        let registry = registry();
        let id = registry.new_request(1, Arc::new(serde_json::Value::Null));
        assert!(registry.clear(id));
        assert!(!registry.clear(id));
    }

    #[test]
    fn operations_after_teardown_report_missing_state_not_a_panic() {
        let registry = registry();
        let id = registry.new_request(1, Arc::new(serde_json::Value::Null));
        registry.clear(id);
        registry.add_log(id, LogLevel::Info, "after teardown");
        assert!(registry.import_key(id, "sha-256", vec![1, 2, 3]).is_err());
        assert!(registry.get_key(id, 1).is_none());
    }

    #[test]
    fn keys_are_scoped_to_their_owning_request() {
        let registry = registry();
        let env = Arc::new(serde_json::Value::Null);
        let a = registry.new_request(1, env.clone());
        let b = registry.new_request(1, env);
        let key_id = registry.import_key(a, "sha-256", vec![9, 9, 9]).unwrap();
        assert!(registry.get_key(a, key_id).is_some());
        assert!(registry.get_key(b, key_id).is_none());
    }

    #[test]
    fn teardown_closes_event_sources_sockets_and_streams_and_cancels_fetches() {
        let registry = registry();
        let id = registry.new_request(1, Arc::new(serde_json::Value::Null));

        let source = EventSourceHandle::new();
        let fetch_cancelled = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let fetch_cancelled_for_closure = Arc::clone(&fetch_cancelled);

        registry.with_state(id, |state| {
            state.event_sources.insert(source.clone());
            state.compress_streams.init(Format::Gzip, Mode::Compress).unwrap();
            state.fetch_cancels.register(Box::new(move || {
                fetch_cancelled_for_closure.store(true, std::sync::atomic::Ordering::SeqCst);
            }));
        });

        assert!(registry.clear(id));
        assert!(source.is_closed());
        assert!(fetch_cancelled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn import_key_normalizes_the_hash_algorithm_and_defaults_to_hmac() {
        let registry = registry();
        let id = registry.new_request(1, Arc::new(serde_json::Value::Null));
        let key_id = registry.import_key(id, "sha256", vec![1]).unwrap();
        let entry = registry.get_key(id, key_id).unwrap();
        assert_eq!(entry.algorithm, "HMAC");
        assert_eq!(entry.hash_algorithm.as_deref(), Some("SHA-256"));
    }

    #[test]
    fn register_fetch_cancel_returns_a_usable_id() {
        let registry = registry();
        let id = registry.new_request(1, Arc::new(serde_json::Value::Null));
        let fetch_id = registry.register_fetch_cancel(id, Box::new(|| {})).unwrap();
        assert!(registry.remove_fetch_cancel(id, &fetch_id).is_some());
        assert!(registry.remove_fetch_cancel(id, &fetch_id).is_none());
    }
}
