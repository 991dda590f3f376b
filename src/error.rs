//! Crate-wide error taxonomy.
//!
//! Every fallible operation in `edgecore` returns [`Result<T>`]. The variants
//! mirror the taxonomy in the error handling design: each one carries enough
//! context to reproduce the message a script-visible caller would see,
//! without leaking internals the host wants to keep private.

use std::fmt;

/// The crate's result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A single error kind with optional free-form context: construct with the
/// kind, attach context by pairing with an [`ErrorContext`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad input caught at the call site: invalid database id, invalid cron
    /// field, invalid base64, unsupported algorithm/format, invalid address.
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description of which rule failed.
        message: String,
    },

    /// A request attempted something the host policy forbids: SSRF-blocked
    /// destination, forbidden SQL statement/pragma, socket cap exceeded,
    /// extractability or key-usage denied.
    #[error("policy error: {message}")]
    Policy {
        /// Human-readable description of the denied action.
        message: String,
    },

    /// A lookup for a stream/socket/key/request-state id found nothing.
    #[error("not found: {what}")]
    NotFound {
        /// What kind of resource was missing, e.g. "stream", "socket".
        what: String,
    },

    /// An underlying operation failed at runtime: decompression, SQL
    /// execution, TCP I/O, or WebSocket transport.
    #[error("runtime error: {message}")]
    Runtime {
        /// The underlying engine's own error message.
        message: String,
    },

    /// A configured capacity was exceeded: decompressed size, TCP buffer.
    #[error("capacity exceeded: {message}")]
    Capacity {
        /// Which limit was hit and by how much, if known.
        message: String,
    },
}

impl Error {
    /// Builds a [`Error::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Builds a [`Error::Policy`].
    #[must_use]
    pub fn policy(message: impl Into<String>) -> Self {
        Self::Policy {
            message: message.into(),
        }
    }

    /// Builds a [`Error::NotFound`].
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Builds a [`Error::Runtime`].
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Builds a [`Error::Capacity`].
    #[must_use]
    pub fn capacity(message: impl Into<String>) -> Self {
        Self::Capacity {
            message: message.into(),
        }
    }

    /// Returns the message a script-visible caller should see, with no
    /// variant-name prefix (the caller already knows which capability it
    /// called; it just wants the reason).
    #[must_use]
    pub fn script_message(&self) -> String {
        match self {
            Self::Validation { message }
            | Self::Policy { message }
            | Self::Runtime { message }
            | Self::Capacity { message } => message.clone(),
            Self::NotFound { what } => format!("unknown {what}"),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::runtime(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::runtime(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::validation(format!("invalid base64: {err}"))
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.error)
    }
}

/// Pairs an [`Error`] with the name of the host callable that produced it,
/// for structured-logging call sites that want to record both.
#[derive(Debug)]
pub struct ErrorContext {
    /// The host callable or bridge that raised the error.
    pub operation: &'static str,
    /// The underlying error.
    pub error: Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_script_message_includes_kind() {
        let err = Error::not_found("socket");
        assert_eq!(err.script_message(), "unknown socket");
    }

    #[test]
    fn policy_message_round_trips() {
        let err = Error::policy("destination resolves to a private address");
        assert!(err.script_message().contains("private"));
    }
}
