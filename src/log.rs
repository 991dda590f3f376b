//! Per-request console log buffer.
//!
//! This is script-visible state (`console.log/info/warn/error/debug`
//! dispatch here), distinct from the host-process `tracing` spans emitted by
//! [`crate::state`] and the bridges for operator-facing observability.

use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of log entries retained per request. Further appends are
/// silently dropped.
pub const MAX_LOG_ENTRIES: usize = 1_000;

/// Maximum length, in characters, of a single log message before truncation.
pub const MAX_LOG_MESSAGE_CHARS: usize = 4_096;

const TRUNCATION_SUFFIX: &str = "...(truncated)";

/// Severity of a console call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// `console.log`
    Log,
    /// `console.info`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
    /// `console.debug`
    Debug,
}

impl LogLevel {
    /// Returns the console method name this level corresponds to.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Debug => "debug",
        }
    }
}

/// One console call recorded for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity of the call.
    pub level: LogLevel,
    /// The formatted message, truncated to [`MAX_LOG_MESSAGE_CHARS`].
    pub message: String,
    /// Milliseconds since the Unix epoch when the call was recorded.
    pub time: u128,
}

/// Bounded, append-only log buffer for one request.
#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
}

impl LogBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a log entry, truncating the message if needed and dropping
    /// the append entirely once [`MAX_LOG_ENTRIES`] has been reached.
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        if self.entries.len() >= MAX_LOG_ENTRIES {
            return;
        }
        let message = truncate_message(message.into());
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.entries.push(LogEntry {
            level,
            message,
            time,
        });
    }

    /// Returns all recorded entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn truncate_message(message: String) -> String {
    if message.chars().count() <= MAX_LOG_MESSAGE_CHARS {
        return message;
    }
    let keep = MAX_LOG_MESSAGE_CHARS.saturating_sub(TRUNCATION_SUFFIX.len());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_past_cap_are_dropped() {
        let mut buf = LogBuffer::new();
        for i in 0..MAX_LOG_ENTRIES + 10 {
            buf.push(LogLevel::Log, format!("entry {i}"));
        }
        assert_eq!(buf.len(), MAX_LOG_ENTRIES);
    }

    #[test]
    fn long_message_is_truncated_with_suffix() {
        let mut buf = LogBuffer::new();
        let long = "x".repeat(MAX_LOG_MESSAGE_CHARS + 500);
        buf.push(LogLevel::Error, long);
        let entry = &buf.entries()[0];
        assert_eq!(entry.message.chars().count(), MAX_LOG_MESSAGE_CHARS);
        assert!(entry.message.ends_with("...(truncated)"));
    }

    #[test]
    fn short_message_is_untouched() {
        let mut buf = LogBuffer::new();
        buf.push(LogLevel::Info, "hello");
        assert_eq!(buf.entries()[0].message, "hello");
    }
}
