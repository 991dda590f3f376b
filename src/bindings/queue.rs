//! The queue binding: fire-and-forget message delivery to a backing broker.

use crate::error::Result;

/// A producer-only message queue.
pub trait Queue: Send + Sync {
    /// Sends one message body.
    ///
    /// # Errors
    /// Returns a runtime error if the backing broker rejects the send.
    fn send(&self, body: &[u8]) -> Result<()>;

    /// Sends several message bodies as one batch.
    ///
    /// # Errors
    /// Returns a runtime error if the backing broker rejects the batch.
    fn send_batch(&self, bodies: &[Vec<u8>]) -> Result<()>;
}
