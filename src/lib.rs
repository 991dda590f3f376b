//! edgecore: the host-side bridge layer for a sandboxed edge-compute
//! runtime.
//!
//! # Overview
//!
//! A script handler runs inside an embedded, single-threaded script engine
//! with no ambient authority: every effect it can have on the world — a
//! socket, a SQL query, a WebSocket frame, a log line — crosses into this
//! crate through a narrow, string/base64-only ABI keyed by a per-request
//! identifier. This crate owns that boundary: the per-request resource
//! registry, the bridges (TCP, SQL, WebSocket, compression), cron matching
//! for scheduled triggers, and the capability contracts (KV, durable KV,
//! object storage, queues, source loading) the embedding host implements.
//!
//! The script engine itself is deliberately out of scope here: [`engine`]
//! defines the contract ([`engine::ScriptHost`]) this crate needs from one,
//! not an implementation.
//!
//! # Core Guarantees
//!
//! - **Bounded state**: every resource a request acquires is owned by its
//!   [`state::RequestState`] and released in a fixed teardown order;
//!   nothing outlives its request.
//! - **Never a synchronous throw for an async-shaped call**: SQL and stream
//!   operations that are conceptually asynchronous always surface failure
//!   as a rejection ([`engine::Pending`]), never a panic or an early return.
//! - **Single-threaded engine discipline**: bridges touch the script engine
//!   only from the one thread that owns it; background work (decompression
//!   workers, TCP read loops) communicates back through plain shared state,
//!   never by calling into script directly.
//! - **Defense at the TCP boundary**: outbound connections are checked
//!   against an SSRF filter before a socket is ever opened.
//!
//! # Module Structure
//!
//! - [`error`]: crate-wide error taxonomy
//! - [`ids`]: request ids, opaque cursors, and deterministic/random id helpers
//! - [`constants`]: wire-visible limits and timeouts shared across bridges
//! - [`config`]: host-wide [`config::RuntimeConfig`]
//! - [`cron`]: five-field cron expression matching and validation
//! - [`crypto`]: algorithm-name normalization and RFC 3394 key wrap/unwrap
//! - [`keys`]: key registry entries
//! - [`log`]: per-request console log buffer
//! - [`compression`]: bulk and streaming gzip/deflate/raw-deflate/brotli
//! - [`net`]: the TCP bridge and its SSRF filter
//! - [`sql`]: the per-tenant SQL bridge
//! - [`websocket`]: the WebSocket frame-pump bridge
//! - [`engine`]: the script-host contract, engine pool, and pending-result type
//! - [`bindings`]: capability contracts implemented by the embedding host
//! - [`state`]: the per-request resource registry tying everything together
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod bindings;
pub mod compression;
pub mod config;
pub mod constants;
pub mod cron;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod ids;
pub mod keys;
pub mod log;
pub mod net;
pub mod sql;
pub mod state;
pub mod websocket;

pub use error::{Error, Result};
