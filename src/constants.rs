//! Wire-visible constants shared across bridges.
//!
//! These are the numbers a script author (or a compatibility test) can
//! observe from the outside: timing windows, size caps, and the valid
//! ranges for the few values a host is allowed to configure.

use std::time::Duration;

/// Default interval between WebSocket keepalive pings.
pub const WS_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout for a single WebSocket send (ping or script-issued message).
pub const WS_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a bridge drains already-queued microtasks after dispatching an
/// event, before yielding back to its own read/tick loop.
pub const MICROTASK_DRAIN_WINDOW: Duration = Duration::from_millis(50);

/// Default timeout for [`crate::net::TcpSocket::wait_for_data`].
pub const TCP_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum size of a single decoded WebSocket message.
pub const MAX_WS_MESSAGE_BYTES: usize = 1024 * 1024;

/// Maximum size, in bytes, of output from a bulk [`crate::compression::decompress`] call.
pub const MAX_DECOMPRESSED_BYTES: usize = 128 * 1024 * 1024;

/// Maximum number of [`crate::log::LogEntry`] values retained per request.
pub const MAX_LOG_ENTRIES: usize = crate::log::MAX_LOG_ENTRIES;

/// Maximum length, in characters, of a single log message before truncation.
pub const MAX_LOG_MESSAGE_CHARS: usize = crate::log::MAX_LOG_MESSAGE_CHARS;

/// Valid range for a host's configured `max_tcp_sockets`.
pub const TCP_SOCKET_LIMIT_RANGE: std::ops::RangeInclusive<usize> = 1..=100;

/// Valid range, in bytes, for a host's configured `max_tcp_buffer_size`.
pub const TCP_BUFFER_SIZE_RANGE: std::ops::RangeInclusive<usize> = 1024..=(100 * 1024 * 1024);
