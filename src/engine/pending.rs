//! The "conceptually asynchronous, never synchronously throws" convention.
//!
//! Any capability method that is conceptually asynchronous (prepared-
//! statement methods, stream operation promises, a WebSocket send during
//! teardown) must surface failure as what the script engine sees as a
//! promise rejection, never as a Rust-level `Err` escaping the call
//! boundary directly. [`Pending<T>`] is that boundary: build one with
//! [`Pending::from_result`], and the engine glue that turns it into a
//! script-visible value always produces a thenable, resolved or rejected,
//! never a synchronous exception.

use crate::error::Result;

/// A value that will be delivered to script as a resolved or rejected
/// promise. Never constructed in a way that can panic or propagate `?`
/// across the script boundary.
#[derive(Debug, Clone)]
pub enum Pending<T> {
    /// Resolves with `value`.
    Fulfilled(T),
    /// Rejects with `reason`, the underlying error's script-visible message.
    Rejected(String),
}

impl<T> Pending<T> {
    /// Converts a [`Result`] into a [`Pending`], mapping `Err` to
    /// `Rejected` rather than letting it escape as a Rust error.
    #[must_use]
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Fulfilled(value),
            Err(err) => Self::Rejected(err.script_message()),
        }
    }

    /// Builds an already-rejected `Pending`, for operations that are
    /// unconditionally unsupported (e.g. `Database::dump`).
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// True if this will reject when delivered to script.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the fulfilled value, panicking if this is a rejection. Tests
    /// and trusted internal call sites only — script-facing glue must use
    /// the enum directly, never unwrap.
    #[must_use]
    pub fn unwrap_fulfilled(self) -> T {
        match self {
            Self::Fulfilled(value) => value,
            Self::Rejected(reason) => panic!("pending rejected: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn ok_becomes_fulfilled() {
        let pending: Pending<i32> = Pending::from_result(Ok(42));
        assert!(!pending.is_rejected());
        assert_eq!(pending.unwrap_fulfilled(), 42);
    }

    #[test]
    fn err_becomes_rejected_not_a_panic() {
        let pending: Pending<i32> = Pending::from_result(Err(Error::runtime("boom")));
        assert!(pending.is_rejected());
        match pending {
            Pending::Rejected(reason) => assert_eq!(reason, "boom"),
            Pending::Fulfilled(_) => panic!("expected rejection"),
        }
    }
}
